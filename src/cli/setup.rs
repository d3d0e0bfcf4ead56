use anyhow::{Result, bail};
use console::style;
use tracing::debug;

use super::schema_cmd::headline;
use super::{Session, SetupArgs};
use crate::core::credentials::{Credentials, normalize_url, validate_url};
use crate::core::terminal::{self, print_error, print_success};
use crate::core::turso::run_schema;

const STEP_LABELS: [&str; 3] = ["Test connection", "Apply schema & triggers", "Seed agents"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepState {
    Pending,
    Running,
    Done,
    Error,
}

impl StepState {
    fn icon(&self) -> console::StyledObject<&'static str> {
        match self {
            StepState::Pending => style("○").dim(),
            StepState::Running => style("⟳").yellow(),
            StepState::Done => style("✓").green(),
            StepState::Error => style("✗").red(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SetupStep {
    pub label: &'static str,
    pub state: StepState,
    pub detail: Option<String>,
}

/// Progress of the three setup steps, printed as each one changes state.
pub(crate) struct SetupProgress {
    steps: Vec<SetupStep>,
    quiet: bool,
}

impl SetupProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            steps: STEP_LABELS
                .into_iter()
                .map(|label| SetupStep {
                    label,
                    state: StepState::Pending,
                    detail: None,
                })
                .collect(),
            quiet,
        }
    }

    pub fn steps(&self) -> &[SetupStep] {
        &self.steps
    }

    pub fn set(&mut self, index: usize, state: StepState, detail: Option<String>) {
        let Some(step) = self.steps.get_mut(index) else {
            return;
        };
        step.state = state;
        step.detail = detail;
        if !self.quiet {
            let detail = step
                .detail
                .as_deref()
                .map(|d| format!(" {}", style(d).dim()))
                .unwrap_or_default();
            println!("  {} {}{}", step.state.icon(), step.label, detail);
        }
    }

    fn print_plan(&self) {
        if self.quiet {
            return;
        }
        for step in &self.steps {
            println!("  {} {}", step.state.icon(), style(step.label).dim());
        }
        println!();
    }
}

fn prompt_credentials(args: SetupArgs) -> Result<Credentials> {
    let url = match args.url {
        Some(url) => url,
        None => inquire::Text::new("Database URL:")
            .with_placeholder("libsql://your-db-xxxxx.turso.io")
            .with_help_message("From `turso db show <name> --url`")
            .prompt()?,
    };
    let token = match args.token {
        Some(token) => token,
        None => inquire::Password::new("Auth token:")
            .without_confirmation()
            .with_help_message("From `turso db tokens create <name>`")
            .prompt()?,
    };

    let creds = Credentials {
        url: normalize_url(&url),
        token: token.trim().to_string(),
    };
    if creds.url.is_empty() || creds.token.is_empty() {
        bail!("Please enter both the database URL and auth token.");
    }
    validate_url(&creds.url).map_err(anyhow::Error::msg)?;
    Ok(creds)
}

/// Validates the candidate credentials against the database, applies the
/// schema and checks the seed. Credentials are saved only if all three
/// steps succeed.
pub(crate) async fn run_setup(session: &Session, args: SetupArgs) -> Result<()> {
    let quiet = session.json;
    if !quiet {
        terminal::print_banner();
        println!("  {}\n", style("Database Setup: Turso").bold());
    }

    let creds = prompt_credentials(args)?;
    let mut progress = SetupProgress::new(quiet);
    progress.print_plan();

    progress.set(0, StepState::Running, None);
    if let Err(e) = session.client.execute("SELECT 1", Vec::new(), Some(&creds)).await {
        progress.set(0, StepState::Error, Some(e.to_string()));
        bail!("Connection failed: {}", e);
    }
    progress.set(0, StepState::Done, Some("Connection OK".to_string()));

    progress.set(1, StepState::Running, None);
    let mut on_progress = |step: usize, total: usize, sql: &str| {
        debug!("[{}/{}] {}", step, total, headline(sql));
    };
    let schema = run_schema(&session.client, Some(&creds), Some(&mut on_progress)).await;
    let report = match schema {
        Ok(report) => report,
        Err(e) => {
            progress.set(1, StepState::Error, Some(e.to_string()));
            bail!("Schema failed: {}", e);
        }
    };
    progress.set(
        1,
        StepState::Done,
        Some(format!(
            "{} statement(s), {} already present",
            report.total(),
            report.tolerated
        )),
    );

    progress.set(2, StepState::Running, None);
    let count = match session
        .client
        .execute("SELECT COUNT(*) AS cnt FROM agents", Vec::new(), Some(&creds))
        .await
    {
        Ok(result) => result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        Err(e) => {
            progress.set(2, StepState::Error, Some(e.to_string()));
            bail!("Agent check failed: {}", e);
        }
    };
    progress.set(2, StepState::Done, Some(format!("{} agents ready", count)));

    let saved = match session.credentials.save(&creds.url, &creds.token) {
        Ok(saved) => saved,
        Err(e) => {
            print_error("Database is ready but the credentials could not be saved.");
            return Err(e.into());
        }
    };

    if quiet {
        return super::output::print_json(&serde_json::json!({
            "url": saved.url,
            "agents": count,
            "statements": report.total(),
            "already_present": report.tolerated,
        }));
    }
    println!();
    print_success(&format!("Connected to {}", saved.url));
    println!(
        "  Run {} to open the live board.\n",
        style("mission-control dashboard").cyan()
    );
    Ok(())
}
