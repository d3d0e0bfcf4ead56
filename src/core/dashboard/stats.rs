use serde::Serialize;

use super::agents_data::{Agent, AgentStatus, AgentTask, TASK_COLUMNS, TaskColumn, TaskStatus};
use crate::core::turso::{Row, Value};

/// Header counters for the overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub total_agents: usize,
    pub active: usize,
    /// Tasks not yet done, across the team.
    pub queued: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TeamStats {
    pub fn from_agents(agents: &[Agent]) -> Self {
        let tasks = || agents.iter().flat_map(|a| a.tasks.iter());
        Self {
            total_agents: agents.len(),
            active: agents
                .iter()
                .filter(|a| a.status == AgentStatus::Working)
                .count(),
            queued: tasks().filter(|t| !t.status.is_done()).count(),
            in_progress: tasks()
                .filter(|t| t.status.column() == TaskStatus::InProgress)
                .count(),
            completed: tasks().filter(|t| t.status.is_done()).count(),
        }
    }
}

/// Per-column task counts for one agent, in board order.
pub fn column_counts(agent: &Agent) -> Vec<(&'static TaskColumn, usize)> {
    TASK_COLUMNS
        .iter()
        .map(|col| {
            let count = agent
                .tasks
                .iter()
                .filter(|t| t.status.column() == col.id)
                .count();
            (col, count)
        })
        .collect()
}

/// Tasks shown under `column`; `None` means every column.
pub fn tasks_in_column(agent: &Agent, column: Option<TaskStatus>) -> Vec<&AgentTask> {
    agent
        .tasks
        .iter()
        .filter(|t| column.is_none_or(|c| t.status.column() == c))
        .collect()
}

/// Open work for one agent, most urgent first.
pub fn attention_tasks(agent: &Agent) -> Vec<&AgentTask> {
    let mut tasks: Vec<&AgentTask> = agent.tasks.iter().filter(|t| !t.status.is_done()).collect();
    tasks.sort_by_key(|t| t.priority);
    tasks
}

/// Team-wide board: every task grouped by column.
pub fn board(agents: &[Agent]) -> Vec<(&'static TaskColumn, Vec<&AgentTask>)> {
    TASK_COLUMNS
        .iter()
        .map(|col| {
            let tasks = agents
                .iter()
                .flat_map(|a| a.tasks.iter())
                .filter(|t| t.status.column() == col.id)
                .collect();
            (col, tasks)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub tokens: i64,
    pub cost_usd: f64,
    pub runs: i64,
}

/// Sums `token_usage` rows.
pub fn usage_totals(rows: &[Row]) -> UsageTotals {
    rows.iter().fold(UsageTotals::default(), |acc, row| UsageTotals {
        tokens: acc.tokens + row.get_i64("tokens_used").unwrap_or(0),
        cost_usd: acc.cost_usd + row.get("cost_usd").and_then(Value::as_f64).unwrap_or(0.0),
        runs: acc.runs + row.get_i64("run_count").unwrap_or(0),
    })
}
