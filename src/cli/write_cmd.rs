use anyhow::{Result, bail};
use serde_json::json;

use super::output::print_json;
use super::{Session, TaskStatusArgs};
use crate::core::terminal::print_success;
use crate::core::turso::{DEFAULT_RUN_MODEL, NewAgentRun};

pub(crate) async fn task_status(session: &Session, args: &TaskStatusArgs) -> Result<()> {
    let touched = session
        .store
        .update_task_status(&args.task_id, args.status.as_str(), args.error.as_deref())
        .await?;
    if touched == 0 {
        bail!("No task with id '{}'", args.task_id);
    }

    if session.json {
        return print_json(&json!({
            "task_id": args.task_id,
            "status": args.status,
            "error_message": args.error,
            "updated": touched,
        }));
    }
    print_success(&format!(
        "Task {} is now {}",
        args.task_id,
        args.status.as_str()
    ));
    Ok(())
}

pub(crate) async fn run_log(session: &Session, run: &NewAgentRun) -> Result<()> {
    session.store.log_agent_run(run).await?;

    if session.json {
        return print_json(&json!({
            "agent_id": run.agent_id,
            "task_id": run.task_id,
            "status": run.status,
            "tokens_used": run.tokens_used,
            "cost_usd": run.cost_usd,
            "model": run.model.as_deref().unwrap_or(DEFAULT_RUN_MODEL),
        }));
    }
    print_success(&format!(
        "Logged {} run for {} ({} tokens, ${:.4})",
        run.status.as_str(),
        run.agent_id,
        run.tokens_used,
        run.cost_usd
    ));
    Ok(())
}
