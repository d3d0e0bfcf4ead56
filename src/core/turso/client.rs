//! HTTP client for the Turso `/v2/pipeline` endpoint.
//! Docs: https://docs.turso.tech/sdk/http/reference

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::TursoError;
use super::value::{Arg, QueryResult, WireCell, unwrap_cell};
use crate::core::credentials::{CredentialStore, Credentials};

/// HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PIPELINE_PATH: &str = "/v2/pipeline";

/// SQL text plus positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Arg>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(sql: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Outcome of one step in a pipeline batch.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Ok(Option<QueryResult>),
    Error(String),
}

// ── Wire request/response ──

#[derive(Serialize)]
struct PipelineRequest<'a> {
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: WireStatement<'a> },
    Close,
}

#[derive(Serialize)]
struct WireStatement<'a> {
    sql: &'a str,
    args: &'a [Arg],
}

#[derive(Deserialize)]
struct PipelineResponse {
    results: Option<Vec<StreamResult>>,
}

#[derive(Deserialize)]
struct StreamResult {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    response: Option<StreamResponse>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    result: Option<ExecuteResult>,
}

#[derive(Deserialize)]
struct StreamError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ExecuteResult {
    #[serde(default)]
    cols: Vec<WireColumn>,
    #[serde(default)]
    rows: Vec<Vec<WireCell>>,
    #[serde(default)]
    affected_row_count: u64,
}

#[derive(Deserialize)]
struct WireColumn {
    #[serde(default)]
    name: Option<String>,
}

impl From<ExecuteResult> for QueryResult {
    fn from(raw: ExecuteResult) -> Self {
        QueryResult {
            columns: raw
                .cols
                .into_iter()
                .map(|c| c.name.unwrap_or_default())
                .collect(),
            rows: raw
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(unwrap_cell).collect())
                .collect(),
            affected_row_count: raw.affected_row_count,
        }
    }
}

impl From<StreamResult> for StepResult {
    fn from(raw: StreamResult) -> Self {
        if raw.kind == "error" {
            let message = raw
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return StepResult::Error(message);
        }
        StepResult::Ok(raw.response.and_then(|r| r.result).map(QueryResult::from))
    }
}

/// Executes SQL against the configured database. The seam the query
/// catalogue is written against.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str, args: Vec<Arg>) -> Result<QueryResult, TursoError>;
}

pub struct TursoClient {
    http_client: Client,
    credentials: Arc<CredentialStore>,
}

impl TursoClient {
    pub fn new(credentials: Arc<CredentialStore>) -> Result<Self, TursoError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Override wins; otherwise the store is consulted on every call.
    fn resolve(&self, credentials: Option<&Credentials>) -> Result<Credentials, TursoError> {
        let resolved = match credentials {
            Some(creds) => Some(creds.clone()),
            None => self.credentials.get(),
        };
        resolved
            .filter(|c| !c.url.trim().is_empty() && !c.token.trim().is_empty())
            .ok_or(TursoError::Configuration)
    }

    /// Sends `statements` as one batch, always terminated by a `close` step.
    /// Returns one [`StepResult`] per statement, in order.
    pub async fn pipeline(
        &self,
        statements: &[Statement],
        credentials: Option<&Credentials>,
    ) -> Result<Vec<StepResult>, TursoError> {
        let creds = self.resolve(credentials)?;

        let mut requests: Vec<StreamRequest> = statements
            .iter()
            .map(|s| StreamRequest::Execute {
                stmt: WireStatement {
                    sql: &s.sql,
                    args: &s.args,
                },
            })
            .collect();
        requests.push(StreamRequest::Close);

        let endpoint = format!("{}{}", creds.url, PIPELINE_PATH);
        debug!(
            "[Turso] POST {} ({} statement(s))",
            endpoint,
            statements.len()
        );

        let res = self
            .http_client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", creds.token))
            .json(&PipelineRequest { requests })
            .send()
            .await
            .inspect_err(|e| warn!("[Turso] request to {} failed: {}", endpoint, e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("[Turso] {} returned {}", endpoint, status);
            return Err(TursoError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let text = res.text().await?;
        let parsed: PipelineResponse = serde_json::from_str(&text)
            .map_err(|e| TursoError::Protocol(format!("invalid JSON body: {}", e)))?;
        let results = parsed
            .results
            .ok_or_else(|| TursoError::Protocol("missing `results` array".to_string()))?;

        if results.len() < statements.len() {
            return Err(TursoError::Protocol(format!(
                "expected {} results, got {}",
                statements.len(),
                results.len()
            )));
        }

        Ok(results
            .into_iter()
            .take(statements.len())
            .map(StepResult::from)
            .collect())
    }

    /// Executes a single statement and returns its result set.
    pub async fn execute(
        &self,
        sql: &str,
        args: Vec<Arg>,
        credentials: Option<&Credentials>,
    ) -> Result<QueryResult, TursoError> {
        let statement = Statement::with_args(sql, args);
        let mut results = self
            .pipeline(std::slice::from_ref(&statement), credentials)
            .await?;
        match results.pop() {
            Some(StepResult::Ok(Some(result))) => Ok(result),
            Some(StepResult::Ok(None)) | None => Err(TursoError::Protocol(
                "missing `results[0].response.result`".to_string(),
            )),
            Some(StepResult::Error(message)) => Err(TursoError::Statement { index: 1, message }),
        }
    }
}

#[async_trait]
impl SqlExecutor for TursoClient {
    async fn execute(&self, sql: &str, args: Vec<Arg>) -> Result<QueryResult, TursoError> {
        TursoClient::execute(self, sql, args, None).await
    }
}
