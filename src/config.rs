use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for SiteSnap.
///
/// Every field has a default, so a missing file or a partial file is valid.
/// Configuration files are loaded from the current directory or a given path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Repository coordinates and API endpoints
    #[serde(default)]
    pub github: GitHubConfig,

    /// Artifact locations
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub access token; `GITHUB_TOKEN` takes precedence when set
    pub token: Option<String>,

    /// Repository owner
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name
    #[serde(default = "default_repo")]
    pub repo: String,

    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// GraphQL endpoint
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the artifacts are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_stats_file")]
    pub stats_file: String,

    #[serde(default = "default_discussions_file")]
    pub discussions_file: String,

    #[serde(default = "default_projects_file")]
    pub projects_file: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: default_owner(),
            repo: default_repo(),
            api_url: default_api_url(),
            graphql_url: default_graphql_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            stats_file: default_stats_file(),
            discussions_file: default_discussions_file(),
            projects_file: default_projects_file(),
        }
    }
}

fn default_owner() -> String {
    "cywf".to_string()
}

fn default_repo() -> String {
    "the-terraformer".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_user_agent() -> String {
    "the-terraformer-site".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public").join("data")
}

fn default_stats_file() -> String {
    "stats.json".to_string()
}

fn default_discussions_file() -> String {
    "discussions.json".to_string()
}

fn default_projects_file() -> String {
    "projects.json".to_string()
}

impl OutputConfig {
    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(&self.stats_file)
    }

    pub fn discussions_path(&self) -> PathBuf {
        self.dir.join(&self.discussions_file)
    }

    pub fn projects_path(&self) -> PathBuf {
        self.dir.join(&self.projects_file)
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./sitesnap.toml
    /// 3. ./sitesnap.json
    /// 4. ./sitesnap.yaml
    /// 5. ./sitesnap.yml
    ///
    /// Returns default configuration if no file is found. An explicitly
    /// specified path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["sitesnap.toml", "sitesnap.json", "sitesnap.yaml", "sitesnap.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                log::debug!("Using config file: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Applies command-line and environment overrides on top of the file values.
    ///
    /// A blank token (e.g. `GITHUB_TOKEN=""` in CI) does not override.
    pub fn with_overrides(mut self, token: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(dir) = output_dir {
            self.output.dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.owner, "cywf");
        assert_eq!(config.github.repo, "the-terraformer");
        assert_eq!(config.github.graphql_url, "https://api.github.com/graphql");
        assert_eq!(config.github.user_agent, "the-terraformer-site");
        assert_eq!(config.output.stats_path(), Path::new("public/data/stats.json"));
        assert_eq!(config.output.projects_path(), Path::new("public/data/projects.json"));
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[github]
owner = "acme"
repo = "widgets"
api-url = "https://ghe.example.com/api/v3"

[output]
dir = "site/data"
stats-file = "repo.json"
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.github.repo, "widgets");
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.graphql_url, "https://api.github.com/graphql");
        assert_eq!(config.output.stats_path(), Path::new("site/data/repo.json"));
        assert_eq!(config.output.discussions_file, "discussions.json");
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "github:\n  owner: octo\n  user-agent: octo-site\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.github.owner, "octo");
        assert_eq!(config.github.user_agent, "octo-site");
        assert_eq!(config.github.repo, "the-terraformer");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("does-not-exist.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_then_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitesnap.json");

        let mut config = Config::default();
        config.github.owner = "saved-owner".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.github.owner, "saved-owner");
        assert_eq!(loaded.output.dir, config.output.dir);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = Config::default();
        config.github.token = Some("from-file".to_string());

        let config = config.with_overrides(Some("from-env".to_string()), Some("out".into()));
        assert_eq!(config.github.token.as_deref(), Some("from-env"));
        assert_eq!(config.output.dir, PathBuf::from("out"));

        let config = config.with_overrides(Some(String::new()), None);
        assert_eq!(config.github.token.as_deref(), Some("from-env"));
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn test_load_config_from_multiple_candidates() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("sitesnap.yml"),
            "github:\n  owner: from-yml\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("sitesnap.json"),
            r#"{"github": {"owner": "from-json"}}"#,
        )
        .unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let json_over_yaml = Config::load(None);
        std::fs::write("sitesnap.toml", "[github]\nowner = \"from-toml\"\n").unwrap();
        let toml_over_json = Config::load(None);

        std::env::set_current_dir(original_dir).unwrap();

        assert_eq!(json_over_yaml.unwrap().github.owner, "from-json");
        let config = toml_over_json.unwrap();
        assert_eq!(config.github.owner, "from-toml");
        assert_eq!(config.github.repo, "the-terraformer");
    }
}
