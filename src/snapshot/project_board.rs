use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapshotError};
use crate::github::types::{IssueNode, ProjectItemNode, ProjectsData};
use crate::github::GitHubClient;

use super::SnapshotJob;

const BOARD_ITEM_LIMIT: usize = 50;
const ISSUES_ENDPOINT: &str = "issues?state=open&per_page=50";

/// Column of a board item.
///
/// Project boards may define arbitrary status names; those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BoardStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Other(String),
}

impl BoardStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
            Self::Other(name) => name,
        }
    }

    /// Status implied by issue labels.
    ///
    /// Matching is a case-sensitive substring search. Progress labels are
    /// checked before done labels, so an issue carrying both is in progress.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let any = |needles: &[&str]| {
            labels
                .iter()
                .any(|label| needles.iter().any(|n| label.as_ref().contains(n)))
        };

        if any(&["in progress", "doing"]) {
            Self::InProgress
        } else if any(&["done", "completed"]) {
            Self::Done
        } else {
            Self::Todo
        }
    }
}

impl From<String> for BoardStatus {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Todo" => Self::Todo,
            "In Progress" => Self::InProgress,
            "Done" => Self::Done,
            _ => Self::Other(name),
        }
    }
}

impl From<BoardStatus> for String {
    fn from(status: BoardStatus) -> Self {
        match status {
            BoardStatus::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardItem {
    pub title: String,
    pub status: BoardStatus,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
}

impl BoardItem {
    /// Maps a project item, or `None` when it has no issue content (drafts,
    /// deleted issues, pull requests).
    fn from_project_item(item: ProjectItemNode) -> Option<Self> {
        let content = item.content?;
        let title = content.title?;
        let url = content.url?;

        let status = item
            .field_values
            .into_iter()
            .flat_map(|values| values.into_nodes())
            .find(|value| {
                value
                    .field
                    .as_ref()
                    .and_then(|field| field.name.as_deref())
                    == Some("Status")
            })
            .and_then(|value| value.name)
            .map(BoardStatus::from)
            .unwrap_or_default();

        Some(Self {
            title,
            status,
            labels: content
                .labels
                .into_iter()
                .flat_map(|conn| conn.into_nodes())
                .filter_map(|label| label.name)
                .collect(),
            assignees: content
                .assignees
                .into_iter()
                .flat_map(|conn| conn.into_nodes())
                .filter_map(|user| user.login)
                .collect(),
            url,
            number: content.number,
        })
    }
}

impl From<IssueNode> for BoardItem {
    fn from(issue: IssueNode) -> Self {
        let labels: Vec<String> = issue.labels.into_iter().filter_map(|l| l.name).collect();

        Self {
            title: issue.title,
            status: BoardStatus::from_labels(&labels),
            labels,
            assignees: issue
                .assignees
                .unwrap_or_default()
                .into_iter()
                .filter_map(|a| a.login)
                .collect(),
            url: issue.html_url,
            number: Some(issue.number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectBoard {
    pub items: Vec<BoardItem>,
}

/// Result of querying the project board, before any fallback.
#[derive(Debug)]
pub enum BoardAttempt {
    /// The board answered with at least one usable item.
    Items(Vec<BoardItem>),
    /// The query succeeded but there is no project or it has no items.
    Empty,
    /// The query itself failed.
    Failed(SnapshotError),
}

const BOARD_QUERY: &str = r#"query ProjectBoard($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    projectsV2(first: 1) {
      nodes {
        items(first: $first) {
          nodes {
            content {
              ... on Issue {
                title
                url
                number
                labels(first: 10) { nodes { name } }
                assignees(first: 5) { nodes { login } }
              }
            }
            fieldValues(first: 10) {
              nodes {
                ... on ProjectV2ItemFieldSingleSelectValue {
                  name
                  field {
                    ... on ProjectV2SingleSelectField { name }
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Snapshots the first project board, falling back to open issues.
pub struct ProjectBoardJob {
    client: Arc<GitHubClient>,
    path: PathBuf,
}

impl ProjectBoardJob {
    pub fn new(client: Arc<GitHubClient>, path: PathBuf) -> Self {
        Self { client, path }
    }

    /// Query the first project board's items.
    pub async fn attempt_board(&self) -> BoardAttempt {
        let body = self
            .client
            .repository_query("ProjectBoard", BOARD_QUERY, BOARD_ITEM_LIMIT);
        let data: ProjectsData = match self.client.graphql(&body).await {
            Ok(data) => data,
            Err(e) => return BoardAttempt::Failed(e),
        };

        let items: Vec<BoardItem> = data
            .repository
            .and_then(|repo| repo.projects_v2)
            .and_then(|projects| projects.into_nodes().next())
            .and_then(|project| project.items)
            .into_iter()
            .flat_map(|items| items.into_nodes())
            .filter_map(BoardItem::from_project_item)
            .collect();

        if items.is_empty() {
            BoardAttempt::Empty
        } else {
            BoardAttempt::Items(items)
        }
    }

    /// Build a board from open issues, inferring each status from labels.
    pub async fn fetch_issues_board(&self) -> Result<ProjectBoard> {
        info!("Fetching open issues (fallback mode)");
        let issues: Vec<IssueNode> = self.client.get_repo(ISSUES_ENDPOINT).await?;

        Ok(ProjectBoard {
            items: issues.into_iter().map(BoardItem::from).collect(),
        })
    }
}

impl SnapshotJob for ProjectBoardJob {
    type Artifact = ProjectBoard;

    const NAME: &'static str = "project board";

    fn artifact_path(&self) -> &Path {
        &self.path
    }

    async fn fetch(&self) -> Result<ProjectBoard> {
        match self.attempt_board().await {
            BoardAttempt::Items(items) => return Ok(ProjectBoard { items }),
            BoardAttempt::Empty => info!("Project board has no items, using open issues"),
            BoardAttempt::Failed(e) => warn!("Project board query failed, using open issues: {e}"),
        }

        self.fetch_issues_board().await
    }

    fn fallback() -> ProjectBoard {
        ProjectBoard::default()
    }

    fn summarize(board: &ProjectBoard) -> String {
        format!("{} items", board.items.len())
    }
}
