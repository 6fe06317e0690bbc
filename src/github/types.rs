//! Wire shapes of the GitHub responses the snapshot jobs consume.
//!
//! Nearly everything is optional: GitHub nulls out nodes the token cannot see,
//! and a missing member must degrade a job rather than abort decoding.

use serde::{Deserialize, Serialize};

/// A GraphQL `{ nodes: [...] }` connection. Null entries are kept so callers
/// decide whether to skip them.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub nodes: Option<Vec<Option<T>>>,
}

impl<T> Connection<T> {
    /// Non-null nodes, in response order.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten().flatten()
    }
}

/// Variables shared by the repository-scoped GraphQL queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryVariables {
    pub owner: String,
    pub name: String,
    pub first: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: Option<u64>,
}

// Discussions

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionsData {
    pub repository: Option<DiscussionsRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionsRepository {
    pub discussions: Option<Connection<DiscussionNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionNode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub body_text: Option<String>,
    pub category: Option<Named>,
    pub author: Option<Actor>,
    pub comments: Option<TotalCount>,
    pub created_at: Option<String>,
}

// Projects (v2)

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsData {
    pub repository: Option<ProjectsRepository>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsRepository {
    #[serde(rename = "projectsV2")]
    pub projects_v2: Option<Connection<ProjectNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectNode {
    pub items: Option<Connection<ProjectItemNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItemNode {
    pub content: Option<ItemContent>,
    pub field_values: Option<Connection<FieldValueNode>>,
}

/// Issue content of a board item. Draft issues and pull requests match no
/// inline fragment and arrive as an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemContent {
    pub title: Option<String>,
    pub url: Option<String>,
    pub number: Option<u64>,
    pub labels: Option<Connection<Named>>,
    pub assignees: Option<Connection<Actor>>,
}

/// A single-select field value; other value kinds arrive as `{}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldValueNode {
    pub name: Option<String>,
    pub field: Option<Named>,
}

// REST issues

#[derive(Debug, Clone, Deserialize)]
pub struct IssueNode {
    pub title: String,
    pub html_url: String,
    pub number: u64,
    #[serde(default)]
    pub labels: Vec<Named>,
    #[serde(default)]
    pub assignees: Option<Vec<Actor>>,
}
