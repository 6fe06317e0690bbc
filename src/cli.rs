use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::Token;
use crate::config::Config;
use crate::error::SnapshotError;
use crate::github::GitHubClient;
use crate::output::{self, Reporter};
use crate::snapshot::{
    run_job, write_fallback, DiscussionsJob, JobOutcome, ProjectBoardJob, RepoStatsJob,
};

#[derive(Parser)]
#[command(name = "sitesnap")]
#[command(author, version, about = "Snapshot GitHub data into JSON for a static site", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// GitHub token; requests are unauthenticated without one
    #[arg(short, long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Configuration file (defaults to ./sitesnap.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Do not draw progress spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Clone, PartialEq, Eq, Debug)]
enum Commands {
    /// Repository statistics
    Stats,
    /// Recent discussions
    Discussions,
    /// Project board items, or open issues when there is no board
    Projects,
    /// Every snapshot, concurrently
    All,
    /// Write the effective configuration to a file
    Init {
        #[arg(default_value = "sitesnap.toml")]
        path: PathBuf,
    },
}

/// Snapshots selected by a command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Selection {
    Stats,
    Discussions,
    Projects,
    All,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?
            .with_overrides(self.token.clone(), self.output_dir.clone());

        let selection = match self.command.clone().unwrap_or(Commands::All) {
            Commands::Stats => Selection::Stats,
            Commands::Discussions => Selection::Discussions,
            Commands::Projects => Selection::Projects,
            Commands::All => Selection::All,
            Commands::Init { path } => return write_config(config, &path),
        };

        let reporter = if self.no_progress {
            Reporter::hidden()
        } else {
            Reporter::new()
        };

        let token = Token::from_optional(config.github.token.as_deref());
        if token.is_none() {
            info!("No GitHub token configured, sending unauthenticated requests");
        }

        let client = match GitHubClient::new(&config.github, token) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("Failed to set up GitHub client: {e}");
                return write_fallbacks(selection, &config, &e, &reporter);
            }
        };
        info!(
            "Snapshotting {}/{} into {}",
            client.owner(),
            client.repo(),
            config.output.dir.display()
        );

        let stats = RepoStatsJob::new(client.clone(), config.output.stats_path());
        let discussions = DiscussionsJob::new(client.clone(), config.output.discussions_path());
        let projects = ProjectBoardJob::new(client, config.output.projects_path());

        match selection {
            Selection::Stats => {
                run_job(&stats, &reporter).await?;
            }
            Selection::Discussions => {
                run_job(&discussions, &reporter).await?;
            }
            Selection::Projects => {
                run_job(&projects, &reporter).await?;
            }
            Selection::All => {
                let (stats_result, discussions_result, projects_result) = tokio::join!(
                    run_job(&stats, &reporter),
                    run_job(&discussions, &reporter),
                    run_job(&projects, &reporter),
                );
                summarize_all(stats_result, discussions_result, projects_result)?;
            }
        }

        Ok(())
    }
}

fn write_config(mut config: Config, path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
    }
    // Never persist a token that came from the environment.
    config.github.token = None;
    config.save(path)?;
    info!("Configuration written to: {}", path.display());
    Ok(())
}

/// Write the fallback artifact of every selected job without any request.
fn write_fallbacks(
    selection: Selection,
    config: &Config,
    reason: &SnapshotError,
    reporter: &Reporter,
) -> Result<()> {
    let paths = &config.output;
    let stats = || write_fallback::<RepoStatsJob>(&paths.stats_path(), reason, reporter);
    let discussions =
        || write_fallback::<DiscussionsJob>(&paths.discussions_path(), reason, reporter);
    let projects = || write_fallback::<ProjectBoardJob>(&paths.projects_path(), reason, reporter);

    match selection {
        Selection::Stats => {
            stats()?;
        }
        Selection::Discussions => {
            discussions()?;
        }
        Selection::Projects => {
            projects()?;
        }
        Selection::All => summarize_all(stats(), discussions(), projects())?,
    }

    Ok(())
}

fn summarize_all(
    stats: crate::error::Result<JobOutcome>,
    discussions: crate::error::Result<JobOutcome>,
    projects: crate::error::Result<JobOutcome>,
) -> Result<()> {
    output::print_summary(&[
        ("stats", stats.is_ok()),
        ("discussions", discussions.is_ok()),
        ("projects", projects.is_ok()),
    ]);

    stats.context("Failed to write stats snapshot")?;
    discussions.context("Failed to write discussions snapshot")?;
    projects.context("Failed to write projects snapshot")?;
    Ok(())
}
