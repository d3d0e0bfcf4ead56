use anyhow::{Context, Result};
use console::style;

use super::Session;
use super::output::print_json;
use crate::core::terminal::{print_step, print_success};
use crate::core::turso::{SCHEMA_SQL, executable_statements, run_schema};

/// First line of a statement, shortened for progress output.
pub(crate) fn headline(sql: &str) -> String {
    let first = sql.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > 60 {
        let cut: String = first.chars().take(59).collect();
        format!("{}…", cut)
    } else {
        first.to_string()
    }
}

pub(crate) async fn apply(session: &Session) -> Result<()> {
    if !session.json {
        print_step("Applying schema & triggers...");
    }
    let json = session.json;
    let mut on_progress = |step: usize, total: usize, sql: &str| {
        if !json {
            println!(
                "  {} {}",
                style(format!("[{}/{}]", step, total)).dim(),
                headline(sql)
            );
        }
    };
    let report = run_schema(&session.client, None, Some(&mut on_progress))
        .await
        .context("schema apply failed")?;

    if json {
        return print_json(&serde_json::json!({
            "applied": report.applied,
            "already_present": report.tolerated,
            "total": report.total(),
        }));
    }
    print_success(&format!(
        "Schema ready: {} statement(s) applied, {} already present.",
        report.applied, report.tolerated
    ));
    Ok(())
}

pub(crate) fn print() {
    for statement in executable_statements(SCHEMA_SQL) {
        println!("{};\n", statement);
    }
}
