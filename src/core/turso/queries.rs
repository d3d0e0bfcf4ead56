//! Typed query catalogue over any [`SqlExecutor`].

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::client::SqlExecutor;
use super::error::TursoError;
use super::value::{Arg, Row, to_rows};

pub const DEFAULT_RUN_LIMIT: u32 = 50;
pub const TOKEN_USAGE_LIMIT: u32 = 90;
pub const DEFAULT_RUN_MODEL: &str = "gpt-4o";

const TASK_SELECT: &str = "SELECT t.*, a.name AS agent_name, a.emoji, g.title AS goal_title
     FROM tasks t
     LEFT JOIN agents a ON a.id = t.assigned_agent_id
     LEFT JOIN goals g ON g.id = t.goal_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
    Retry,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Retry => "retry",
        }
    }

    pub fn from_status(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Some(RunStatus::Success),
            "failed" => Some(RunStatus::Failed),
            "retry" => Some(RunStatus::Retry),
            _ => None,
        }
    }
}

/// A completed run to be appended to `agent_runs`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgentRun {
    pub agent_id: String,
    pub task_id: String,
    pub tokens_used: i64,
    pub cost_usd: f64,
    pub status: RunStatus,
    pub summary: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub agent_id: Option<String>,
    pub pending_only: bool,
}

impl TaskFilter {
    pub fn pending(agent_id: Option<&str>) -> Self {
        Self {
            agent_id: agent_id.map(str::to_string),
            pending_only: true,
        }
    }

    fn to_sql(&self) -> (String, Vec<Arg>) {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        if self.pending_only {
            clauses.push("t.status = 'pending'");
        }
        if let Some(agent) = &self.agent_id {
            clauses.push("t.assigned_agent_id = ?");
            args.push(Arg::from(agent));
        }

        let mut sql = TASK_SELECT.to_string();
        if !clauses.is_empty() {
            sql.push_str("\n     WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        // Pending work is served oldest first; the board shows recent changes first.
        if self.pending_only {
            sql.push_str("\n     ORDER BY t.priority ASC, t.created_at ASC");
        } else {
            sql.push_str("\n     ORDER BY t.priority ASC, t.updated_at DESC");
        }
        (sql, args)
    }
}

pub struct MissionStore<E: SqlExecutor> {
    executor: Arc<E>,
}

impl<E: SqlExecutor> Clone for MissionStore<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E: SqlExecutor> MissionStore<E> {
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    async fn rows(&self, sql: &str, args: Vec<Arg>) -> Result<Vec<Row>, TursoError> {
        let result = self.executor.execute(sql, args).await?;
        debug!("Query returned {} row(s)", result.rows.len());
        Ok(to_rows(&result))
    }

    pub async fn fetch_agents(&self) -> Result<Vec<Row>, TursoError> {
        self.rows("SELECT * FROM agents ORDER BY created_at DESC", Vec::new())
            .await
    }

    pub async fn fetch_goals(&self) -> Result<Vec<Row>, TursoError> {
        self.rows("SELECT * FROM goals ORDER BY created_at DESC", Vec::new())
            .await
    }

    pub async fn fetch_tasks(&self, filter: &TaskFilter) -> Result<Vec<Row>, TursoError> {
        let (sql, args) = filter.to_sql();
        self.rows(&sql, args).await
    }

    /// Tasks still waiting to be picked up, optionally for one agent.
    pub async fn fetch_pending_tasks(&self, agent_id: Option<&str>) -> Result<Vec<Row>, TursoError> {
        self.fetch_tasks(&TaskFilter::pending(agent_id)).await
    }

    pub async fn fetch_all_tasks(&self) -> Result<Vec<Row>, TursoError> {
        self.fetch_tasks(&TaskFilter::default()).await
    }

    pub async fn fetch_agent_runs(&self, limit: u32) -> Result<Vec<Row>, TursoError> {
        self.rows(
            "SELECT ar.*, a.name AS agent_name, t.title AS task_title
             FROM agent_runs ar
             LEFT JOIN agents a ON a.id = ar.agent_id
             LEFT JOIN tasks t ON t.id = ar.task_id
             ORDER BY ar.started_at DESC LIMIT ?",
            vec![Arg::from(limit)],
        )
        .await
    }

    pub async fn fetch_memory_summaries(&self, agent_id: Option<&str>) -> Result<Vec<Row>, TursoError> {
        match agent_id {
            Some(agent) => {
                self.rows(
                    "SELECT * FROM memory_summaries WHERE agent_id = ? ORDER BY created_at DESC",
                    vec![Arg::from(agent)],
                )
                .await
            }
            None => {
                self.rows(
                    "SELECT * FROM memory_summaries ORDER BY created_at DESC",
                    Vec::new(),
                )
                .await
            }
        }
    }

    pub async fn fetch_token_usage(&self) -> Result<Vec<Row>, TursoError> {
        self.rows(
            "SELECT tu.*, a.name AS agent_name
             FROM token_usage tu
             LEFT JOIN agents a ON a.id = tu.agent_id
             ORDER BY tu.date DESC LIMIT ?",
            vec![Arg::from(TOKEN_USAGE_LIMIT)],
        )
        .await
    }

    /// Sets status and error message and stamps `updated_at`. Returns the
    /// number of rows touched.
    pub async fn update_task_status(
        &self,
        task_id: &str,
        status: &str,
        error_message: Option<&str>,
    ) -> Result<u64, TursoError> {
        let result = self
            .executor
            .execute(
                "UPDATE tasks SET status = ?, error_message = ?, updated_at = datetime('now') WHERE id = ?",
                vec![Arg::from(status), Arg::from(error_message), Arg::from(task_id)],
            )
            .await?;
        debug!(
            "Task {} -> {} ({} row(s))",
            task_id, status, result.affected_row_count
        );
        Ok(result.affected_row_count)
    }

    pub async fn log_agent_run(&self, run: &NewAgentRun) -> Result<(), TursoError> {
        let model = run.model.as_deref().unwrap_or(DEFAULT_RUN_MODEL);
        self.executor
            .execute(
                "INSERT INTO agent_runs
                   (agent_id, task_id, tokens_used, cost_usd, status, summary, model, started_at, finished_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'), datetime('now'))",
                vec![
                    Arg::from(&run.agent_id),
                    Arg::from(&run.task_id),
                    Arg::from(run.tokens_used),
                    Arg::from(run.cost_usd),
                    Arg::from(run.status.as_str()),
                    Arg::from(&run.summary),
                    Arg::from(model),
                ],
            )
            .await?;
        debug!("Logged {} run for agent {}", run.status.as_str(), run.agent_id);
        Ok(())
    }

    /// Round trip with no table access; used to validate credentials.
    pub async fn ping(&self) -> Result<(), TursoError> {
        self.executor.execute("SELECT 1", Vec::new()).await?;
        Ok(())
    }

    pub async fn count_agents(&self) -> Result<i64, TursoError> {
        let rows = self
            .rows("SELECT COUNT(*) AS n FROM agents", Vec::new())
            .await?;
        Ok(rows.first().and_then(|r| r.get_i64("n")).unwrap_or(0))
    }
}
