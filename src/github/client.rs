use graphql_client::{QueryBody, Response as GraphQLResponse};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::types::RepositoryVariables;
use crate::auth::Token;
use crate::config::GitHubConfig;
use crate::error::{Result, SnapshotError};

/// GitHub API client shared by every snapshot job.
///
/// Requests carry a bearer token only when one is configured; without one they
/// are still sent and are subject to the lower unauthenticated rate limit.
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    graphql_url: Url,
    owner: String,
    repo: String,
    token: Option<Token>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| SnapshotError::Config(format!("Failed to create HTTP client: {e}")))?;

        // A trailing slash keeps `join` from dropping the last path segment
        // of enterprise-style bases such as `/api/v3`.
        let api_url = Url::parse(&format!("{}/", config.api_url.trim_end_matches('/')))
            .map_err(|e| SnapshotError::Config(format!("Invalid API URL: {e}")))?;

        let graphql_url = Url::parse(&config.graphql_url)
            .map_err(|e| SnapshotError::Config(format!("Invalid GraphQL URL: {e}")))?;

        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(SnapshotError::Config(
                "Repository owner and name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client,
            api_url,
            graphql_url,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// URL of a REST endpoint below `repos/{owner}/{repo}`.
    ///
    /// `suffix` may carry a query string, e.g. `issues?state=open`.
    pub fn repo_url(&self, suffix: &str) -> Result<Url> {
        let path = if suffix.is_empty() {
            format!("repos/{}/{}", self.owner, self.repo)
        } else {
            format!("repos/{}/{}/{}", self.owner, self.repo, suffix)
        };

        self.api_url
            .join(&path)
            .map_err(|e| SnapshotError::Config(format!("Invalid repository URL: {e}")))
    }

    /// Request body for a query taking `$owner`, `$name` and `$first`.
    ///
    /// The coordinates travel as variables, so they are never spliced into
    /// the document.
    pub fn repository_query(
        &self,
        operation_name: &'static str,
        query: &'static str,
        first: usize,
    ) -> QueryBody<RepositoryVariables> {
        QueryBody {
            variables: RepositoryVariables {
                owner: self.owner.clone(),
                name: self.repo.clone(),
                first: first as i64,
            },
            query,
            operation_name,
        }
    }

    /// Attaches the bearer token when one is configured.
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Issue a request and decode its JSON body.
    ///
    /// Sends a `POST` with `body` as JSON when a body is given, otherwise a
    /// `GET`. Non-2xx responses fail with [`SnapshotError::Transport`] and are
    /// not retried.
    pub async fn fetch(&self, url: Url, body: Option<&Value>) -> Result<Value> {
        let request = match body {
            Some(body) => {
                debug!("POST {url}");
                self.client.post(url).json(body)
            }
            None => {
                debug!("GET {url}");
                self.client.get(url)
            }
        };

        let response = self.auth_request(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SnapshotError::Decode(format!("Response is not valid JSON: {e}")))
    }

    /// GET a REST endpoint below the repository and decode it into `T`.
    pub async fn get_repo<T>(&self, suffix: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.fetch(self.repo_url(suffix)?, None).await?;
        serde_json::from_value(value)
            .map_err(|e| SnapshotError::Decode(format!("Unexpected `{suffix}` response: {e}")))
    }

    /// Run a GraphQL request and return its `data` member.
    ///
    /// GraphQL-level errors are logged; they only fail the call when the
    /// response carries no data at all.
    pub async fn graphql<V, T>(&self, body: &QueryBody<V>) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| {
            SnapshotError::Decode(format!("Failed to encode {} request: {e}", body.operation_name))
        })?;
        let value = self.fetch(self.graphql_url.clone(), Some(&body)).await?;

        let response: GraphQLResponse<T> = serde_json::from_value(value)
            .map_err(|e| SnapshotError::Decode(format!("Unexpected GraphQL response: {e}")))?;

        let messages = response
            .errors
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", ");

        match response.data {
            Some(data) => {
                if !messages.is_empty() {
                    warn!("GraphQL query returned partial data: {messages}");
                }
                Ok(data)
            }
            None if messages.is_empty() => Err(SnapshotError::Decode(
                "GraphQL response contained no data".to_string(),
            )),
            None => Err(SnapshotError::GraphQl(messages)),
        }
    }
}
