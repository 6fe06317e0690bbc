use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::github::GitHubClient;

use super::SnapshotJob;

/// Aggregate repository statistics as consumed by the site's charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    /// Bytes of code per language, largest first as reported by GitHub.
    pub languages: IndexMap<String, u64>,
    pub commit_activity: Vec<CommitWeek>,
}

/// Commits in one week; `week` is the Unix timestamp of its first day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitWeek {
    pub week: i64,
    pub total: u64,
}

impl RepoStats {
    /// Placeholder written when the statistics cannot be fetched, so the
    /// language chart still has something to draw.
    pub fn fallback() -> Self {
        Self {
            stars: 0,
            forks: 0,
            watchers: 0,
            languages: IndexMap::from([
                ("TypeScript".to_string(), 50),
                ("JavaScript".to_string(), 30),
                ("HTML".to_string(), 20),
            ]),
            commit_activity: Vec::new(),
        }
    }

    /// Build stats from the raw repository, languages and commit-activity
    /// bodies. Missing or malformed numbers become 0; a body of the wrong
    /// shape becomes an empty collection.
    pub fn from_responses(repo: &Value, languages: &Value, activity: &Value) -> Self {
        let count = |key: &str| repo.get(key).and_then(Value::as_u64).unwrap_or(0);

        let languages = languages
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(name, bytes)| (name.clone(), bytes.as_u64().unwrap_or(0)))
                    .collect()
            })
            .unwrap_or_default();

        // GitHub answers 202 with `{}` while it computes the statistics.
        let commit_activity = activity
            .as_array()
            .map(|weeks| {
                weeks
                    .iter()
                    .filter_map(|entry| {
                        let week = entry.get("week")?.as_i64()?;
                        let total = entry.get("total").and_then(Value::as_u64).unwrap_or(0);
                        Some(CommitWeek { week, total })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            stars: count("stargazers_count"),
            forks: count("forks_count"),
            watchers: count("watchers_count"),
            languages,
            commit_activity,
        }
    }
}

/// Snapshots repository metadata, language breakdown and 52 weeks of commit
/// activity.
pub struct RepoStatsJob {
    client: Arc<GitHubClient>,
    path: PathBuf,
}

impl RepoStatsJob {
    pub fn new(client: Arc<GitHubClient>, path: PathBuf) -> Self {
        Self { client, path }
    }
}

impl SnapshotJob for RepoStatsJob {
    type Artifact = RepoStats;

    const NAME: &'static str = "repository statistics";

    fn artifact_path(&self) -> &Path {
        &self.path
    }

    /// The three calls run concurrently; the first failure aborts the job and
    /// whatever the other calls returned is dropped.
    async fn fetch(&self) -> Result<RepoStats> {
        let client = &self.client;
        let repo_url = client.repo_url("")?;
        let languages_url = client.repo_url("languages")?;
        let activity_url = client.repo_url("stats/commit_activity")?;

        let (repo, languages, activity) = futures::try_join!(
            client.fetch(repo_url, None),
            client.fetch(languages_url, None),
            client.fetch(activity_url, None),
        )?;

        let stats = RepoStats::from_responses(&repo, &languages, &activity);
        debug!(
            "{} languages, {} weeks of commit activity",
            stats.languages.len(),
            stats.commit_activity.len()
        );
        Ok(stats)
    }

    fn fallback() -> RepoStats {
        RepoStats::fallback()
    }

    fn summarize(stats: &RepoStats) -> String {
        format!("{} stars, {} forks", stats.stars, stats.forks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitHubConfig;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> Arc<GitHubClient> {
        let config = GitHubConfig {
            api_url: server.url(),
            graphql_url: format!("{}/graphql", server.url()),
            owner: "octo".to_string(),
            repo: "site".to_string(),
            ..GitHubConfig::default()
        };
        Arc::new(GitHubClient::new(&config, None).unwrap())
    }

    #[test]
    fn test_from_responses_normalizes() {
        let stats = RepoStats::from_responses(
            &json!({"stargazers_count": 42, "forks_count": 7, "watchers_count": 42}),
            &json!({"Rust": 9000, "Shell": 120}),
            &json!([
                {"week": 1700000000, "total": 5, "days": [0, 1, 1, 1, 1, 1, 0]},
                {"week": 1700604800, "total": 0, "days": [0, 0, 0, 0, 0, 0, 0]}
            ]),
        );

        assert_eq!(stats.stars, 42);
        assert_eq!(stats.forks, 7);
        assert_eq!(stats.watchers, 42);
        assert_eq!(stats.languages.keys().collect::<Vec<_>>(), vec!["Rust", "Shell"]);
        assert_eq!(
            stats.commit_activity,
            vec![
                CommitWeek { week: 1700000000, total: 5 },
                CommitWeek { week: 1700604800, total: 0 },
            ]
        );
    }

    #[test]
    fn test_missing_and_malformed_fields_default() {
        let stats = RepoStats::from_responses(
            &json!({"stargazers_count": "many", "forks_count": -3}),
            &json!(null),
            &json!({}),
        );

        assert_eq!(stats.stars, 0);
        assert_eq!(stats.forks, 0);
        assert_eq!(stats.watchers, 0);
        assert!(stats.languages.is_empty());
        assert!(stats.commit_activity.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(RepoStats::fallback()).unwrap();

        assert_eq!(
            value,
            json!({
                "stars": 0,
                "forks": 0,
                "watchers": 0,
                "languages": {"TypeScript": 50, "JavaScript": 30, "HTML": 20},
                "commitActivity": []
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_combines_three_calls() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octo/site")
            .with_status(200)
            .with_body(r#"{"stargazers_count": 10, "forks_count": 2, "watchers_count": 10}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/site/languages")
            .with_status(200)
            .with_body(r#"{"TypeScript": 300, "Astro": 100}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/site/stats/commit_activity")
            .with_status(200)
            .with_body(r#"[{"week": 1, "total": 4, "days": []}]"#)
            .create_async()
            .await;

        let job = RepoStatsJob::new(client_for(&server), PathBuf::from("unused.json"));
        let stats = job.fetch().await.unwrap();

        assert_eq!(stats.stars, 10);
        assert_eq!(stats.languages.get("Astro"), Some(&100));
        assert_eq!(stats.commit_activity, vec![CommitWeek { week: 1, total: 4 }]);
        assert_eq!(RepoStatsJob::summarize(&stats), "10 stars, 2 forks");
    }

    #[tokio::test]
    async fn test_any_failing_call_fails_the_job() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/octo/site")
            .with_status(200)
            .with_body(r#"{"stargazers_count": 10}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/site/languages")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/site/stats/commit_activity")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let job = RepoStatsJob::new(client_for(&server), PathBuf::from("unused.json"));

        assert!(job.fetch().await.is_err());
    }
}
