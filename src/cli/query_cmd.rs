use anyhow::Result;
use console::style;

use super::output::{print_json, print_rows, print_table};
use super::{Session, TaskQueryArgs};
use crate::core::dashboard::mapping::map_agents;
use crate::core::dashboard::stats::{self, usage_totals};
use crate::core::turso::TaskFilter;

pub(crate) async fn agents(session: &Session) -> Result<()> {
    let (agent_rows, task_rows) = tokio::try_join!(
        session.store.fetch_agents(),
        session.store.fetch_all_tasks()
    )?;
    let agents = map_agents(&agent_rows, &task_rows);

    if session.json {
        return print_json(&agents);
    }

    let rows = agents
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                format!("{} {}", a.emoji, a.name),
                a.role.clone(),
                a.agent_type.as_str().to_string(),
                a.status.as_str().to_string(),
                stats::attention_tasks(a).len().to_string(),
                a.tasks.len().to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "Agent", "Role", "Type", "Status", "Open", "Tasks"],
        rows,
    );
    Ok(())
}

pub(crate) async fn goals(session: &Session) -> Result<()> {
    let rows = session.store.fetch_goals().await?;
    if session.json {
        return print_json(&rows);
    }
    print_rows(
        &rows,
        &[
            ("id", "ID"),
            ("title", "Title"),
            ("status", "Status"),
            ("created_at", "Created"),
        ],
    );
    Ok(())
}

pub(crate) async fn tasks(session: &Session, args: &TaskQueryArgs) -> Result<()> {
    let filter = TaskFilter {
        agent_id: args.agent.clone(),
        pending_only: args.pending,
    };
    let rows = session.store.fetch_tasks(&filter).await?;
    if session.json {
        return print_json(&rows);
    }
    print_rows(
        &rows,
        &[
            ("id", "ID"),
            ("priority", "P"),
            ("status", "Status"),
            ("agent_name", "Agent"),
            ("title", "Title"),
            ("goal_title", "Goal"),
            ("updated_at", "Updated"),
        ],
    );
    Ok(())
}

pub(crate) async fn runs(session: &Session, limit: u32) -> Result<()> {
    let rows = session.store.fetch_agent_runs(limit).await?;
    if session.json {
        return print_json(&rows);
    }
    print_rows(
        &rows,
        &[
            ("started_at", "Started"),
            ("agent_name", "Agent"),
            ("task_title", "Task"),
            ("status", "Status"),
            ("tokens_used", "Tokens"),
            ("cost_usd", "Cost $"),
            ("model", "Model"),
        ],
    );
    Ok(())
}

pub(crate) async fn memory(session: &Session, agent: Option<&str>) -> Result<()> {
    let rows = session.store.fetch_memory_summaries(agent).await?;
    if session.json {
        return print_json(&rows);
    }
    print_rows(
        &rows,
        &[
            ("created_at", "Created"),
            ("agent_id", "Agent"),
            ("summary", "Summary"),
        ],
    );
    Ok(())
}

pub(crate) async fn usage(session: &Session) -> Result<()> {
    let rows = session.store.fetch_token_usage().await?;
    if session.json {
        return print_json(&rows);
    }
    print_rows(
        &rows,
        &[
            ("date", "Date"),
            ("agent_name", "Agent"),
            ("tokens_used", "Tokens"),
            ("cost_usd", "Cost $"),
            ("run_count", "Runs"),
        ],
    );
    if !rows.is_empty() {
        let totals = usage_totals(&rows);
        println!(
            "  {} {} tokens  ${:.2}  {} run(s)",
            style("Total:").bold(),
            totals.tokens,
            totals.cost_usd,
            totals.runs
        );
    }
    Ok(())
}
