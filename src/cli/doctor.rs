use anyhow::{Result, bail};
use serde::Serialize;

use super::Session;
use super::credentials_cmd::source_label;
use super::output::print_json;
use crate::core::credentials::CREDENTIALS_FILE;
use crate::core::terminal::{print_error, print_info, print_step, print_success, print_warn};
use crate::platform::{NativePlatform, Platform};

#[derive(Debug, Serialize)]
struct DoctorReport {
    data_dir: String,
    credentials_file: bool,
    source: &'static str,
    url: Option<String>,
    reachable: Option<bool>,
    agents: Option<i64>,
    error: Option<String>,
}

/// Checks where credentials come from, whether the database answers and
/// whether the schema has been applied. Fails if any check fails.
pub(crate) async fn run_doctor(session: &Session) -> Result<()> {
    let data_dir = NativePlatform::data_dir();
    let mut report = DoctorReport {
        data_dir: data_dir.display().to_string(),
        credentials_file: data_dir.join(CREDENTIALS_FILE).exists(),
        source: source_label(session.credentials.source()),
        url: session.credentials.get().map(|c| c.url),
        reachable: None,
        agents: None,
        error: None,
    };

    if report.url.is_some() {
        match session.store.ping().await {
            Ok(()) => {
                report.reachable = Some(true);
                match session.store.count_agents().await {
                    Ok(n) => report.agents = Some(n),
                    Err(e) => report.error = Some(format!("schema check failed: {}", e)),
                }
            }
            Err(e) => {
                report.reachable = Some(false);
                report.error = Some(e.to_string());
            }
        }
    }

    if session.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if report.url.is_none() {
        bail!("Turso not configured. Run `mission-control setup` to enter your URL and token.");
    }
    if let Some(error) = report.error {
        bail!(error);
    }
    Ok(())
}

fn print_report(report: &DoctorReport) {
    print_step("Checking mission-control...");
    println!();
    print_info(&format!("Data directory: {}", report.data_dir));
    if report.credentials_file {
        print_success(&format!("Credentials file present ({})", CREDENTIALS_FILE));
    } else {
        print_warn("No saved credentials file");
    }

    match &report.url {
        Some(url) => print_success(&format!("Database URL: {} ({})", url, report.source)),
        None => {
            print_error("No database URL or token configured");
            return;
        }
    }

    match report.reachable {
        Some(true) => print_success("Database reachable"),
        Some(false) => print_error("Database unreachable"),
        None => {}
    }
    match report.agents {
        Some(0) => print_warn("Schema applied but no agents seeded. Run `mission-control schema apply`."),
        Some(n) => print_success(&format!("Schema applied, {} agent(s)", n)),
        None => {}
    }
    if let Some(error) = &report.error {
        print_error(error);
    }
}
