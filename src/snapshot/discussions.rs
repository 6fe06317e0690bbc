use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapshotError};
use crate::github::types::{DiscussionNode, DiscussionsData};
use crate::github::GitHubClient;

use super::SnapshotJob;

/// Number of discussions requested and kept.
const DISCUSSION_LIMIT: usize = 25;

/// Characters of body text kept per discussion.
const BODY_PREVIEW_CHARS: usize = 200;

const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionRecord {
    pub title: String,
    pub url: String,
    pub body: String,
    pub category: String,
    pub author: String,
    pub comments: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<DiscussionNode> for DiscussionRecord {
    fn from(node: DiscussionNode) -> Self {
        Self {
            title: node.title,
            url: node.url,
            body: node
                .body_text
                .map(|text| truncate_chars(&text, BODY_PREVIEW_CHARS))
                .unwrap_or_default(),
            category: node.category.and_then(|c| c.name).unwrap_or_default(),
            author: node
                .author
                .and_then(|a| a.login)
                .filter(|login| !login.is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            comments: node.comments.and_then(|c| c.total_count).unwrap_or(0),
            created_at: node
                .created_at
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|ts| ts.with_timezone(&Utc)),
        }
    }
}

/// First `max` characters of `text`, never splitting a character.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

const DISCUSSIONS_QUERY: &str = r#"query RecentDiscussions($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    discussions(first: $first, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes {
        title
        url
        bodyText
        category { name }
        author { login }
        comments { totalCount }
        createdAt
      }
    }
  }
}"#;

/// Snapshots the most recent discussion threads.
///
/// Null nodes (threads the token may not read) are skipped, so fewer than
/// the returned node count can be written.
pub struct DiscussionsJob {
    client: Arc<GitHubClient>,
    path: PathBuf,
}

impl DiscussionsJob {
    pub fn new(client: Arc<GitHubClient>, path: PathBuf) -> Self {
        Self { client, path }
    }
}

impl SnapshotJob for DiscussionsJob {
    type Artifact = Vec<DiscussionRecord>;

    const NAME: &'static str = "discussions";

    fn artifact_path(&self) -> &Path {
        &self.path
    }

    async fn fetch(&self) -> Result<Vec<DiscussionRecord>> {
        let body = self
            .client
            .repository_query("RecentDiscussions", DISCUSSIONS_QUERY, DISCUSSION_LIMIT);
        let data: DiscussionsData = self.client.graphql(&body).await?;

        let connection = data
            .repository
            .and_then(|repo| repo.discussions)
            .filter(|conn| conn.nodes.is_some())
            .ok_or_else(|| {
                SnapshotError::Decode(
                    "missing data.repository.discussions.nodes".to_string(),
                )
            })?;

        let skipped = connection.nodes.iter().flatten().filter(|n| n.is_none()).count();
        if skipped > 0 {
            debug!("Skipped {skipped} null discussion nodes");
        }

        Ok(connection
            .into_nodes()
            .take(DISCUSSION_LIMIT)
            .map(DiscussionRecord::from)
            .collect())
    }

    /// Failures leave an empty list; the site renders "no discussions".
    fn fallback() -> Vec<DiscussionRecord> {
        Vec::new()
    }

    fn summarize(records: &Vec<DiscussionRecord>) -> String {
        format!("{} discussions", records.len())
    }
}
