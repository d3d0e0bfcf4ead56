//! Database rows to dashboard entities. Lenient: malformed or missing
//! columns fall back to defaults instead of failing the whole snapshot.

use crate::core::turso::{Row, Value};

use super::agents_data::{Agent, AgentStatus, AgentTask, AgentType, TaskStatus};

pub const DEFAULT_EMOJI: &str = "🤖";
pub const DEFAULT_PRIORITY: u8 = 2;

/// Parses a JSON array of strings stored in a text column. Anything else
/// yields an empty list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Text(raw)) => serde_json::from_str(raw).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Missing, zero or non-numeric priorities become the default; others are
/// clamped into 1..=3.
fn priority(value: Option<&Value>) -> u8 {
    match value.and_then(Value::as_i64) {
        None | Some(0) => DEFAULT_PRIORITY,
        Some(n) => n.clamp(1, 3) as u8,
    }
}

pub fn map_task(row: &Row) -> AgentTask {
    AgentTask {
        id: row.text("id"),
        agent_id: row.text("assigned_agent_id"),
        title: row.text("title"),
        description: row.text("description"),
        status: TaskStatus::from_status(&row.text("status")).unwrap_or(TaskStatus::Inbox),
        priority: priority(row.get("priority")),
        tags: string_list(row.get("tags")),
        days_ago: row.get_i64("days_ago").unwrap_or(0),
    }
}

/// Builds an agent from its row, attaching every task assigned to it.
pub fn map_agent(row: &Row, task_rows: &[Row]) -> Agent {
    let id = row.text("id");
    let tasks = task_rows
        .iter()
        .filter(|t| t.get_str("assigned_agent_id") == Some(id.as_str()))
        .map(map_task)
        .collect();

    let emoji = match row.get("emoji") {
        None | Some(Value::Null) => DEFAULT_EMOJI.to_string(),
        Some(v) => v.to_string(),
    };

    Agent {
        name: row.text("name"),
        role: row.text("role"),
        agent_type: AgentType::from_code(&row.text("type")).unwrap_or(AgentType::Specialist),
        status: AgentStatus::from_status(&row.text("status")).unwrap_or(AgentStatus::Idle),
        emoji,
        about: row.text("about"),
        skills: string_list(row.get("skills")),
        status_reason: row.text("status_reason"),
        since_ago: row.text("since_ago"),
        tasks,
        id,
    }
}

pub fn map_agents(agent_rows: &[Row], task_rows: &[Row]) -> Vec<Agent> {
    agent_rows
        .iter()
        .map(|row| map_agent(row, task_rows))
        .collect()
}
