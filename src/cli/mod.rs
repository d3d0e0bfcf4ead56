mod credentials_cmd;
mod doctor;
mod output;
mod query_cmd;
mod schema_cmd;
mod setup;
mod write_cmd;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use console::style;
use tokio::sync::broadcast;

use crate::core::credentials::CredentialStore;
use crate::core::dashboard::{DashboardPoller, POLL_INTERVAL, TaskStatus};
use crate::core::terminal::{self, GuideSection, print_error};
use crate::core::turso::{DEFAULT_RUN_LIMIT, MissionStore, NewAgentRun, RunStatus, TursoClient};
use crate::interfaces::dashboard::DashboardApp;
use crate::logging;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Setup")
        .command("setup", "Connect a Turso database and apply the schema")
        .command("credentials", "Show or clear the saved URL and token")
        .command("schema", "Apply or print the bundled schema")
        .print();

    GuideSection::new("Read")
        .command("agents", "List agents with their tasks")
        .command("goals", "List goals")
        .command("tasks", "List tasks (--agent <id>, --pending)")
        .command("runs", "Recent agent runs (--limit <n>)")
        .command("memory", "Memory summaries (--agent <id>)")
        .command("usage", "Daily token usage")
        .print();

    GuideSection::new("Write")
        .command("task status", "Set a task's status (<id> <status> [--error <msg>])")
        .command("run log", "Record a finished agent run")
        .print();

    GuideSection::new("Monitor")
        .command("dashboard", "Start the terminal dashboard (--interval <secs>)")
        .command("doctor", "Check configuration and connectivity")
        .print();

    GuideSection::new("Global options")
        .text("--json          Print query results as JSON")
        .text("--verbose, -v   Debug logging (or set MISSION_CONTROL_LOG)")
        .print();

    println!(
        "\n {} {} <command> [subcommand]\n",
        style("Usage:").bold(),
        style("mission-control").green()
    );
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GlobalFlags {
    pub verbose: bool,
    pub json: bool,
}

/// Pulls the global switches out of `args` wherever they appear.
pub(crate) fn parse_global_flags(args: &[String]) -> (GlobalFlags, Vec<String>) {
    let mut flags = GlobalFlags::default();
    let mut rest = Vec::with_capacity(args.len());
    for arg in args {
        match arg.as_str() {
            "--verbose" | "-v" => flags.verbose = true,
            "--json" => flags.json = true,
            _ => rest.push(arg.clone()),
        }
    }
    (flags, rest)
}

/// Value following `name` (or `short`), if present.
fn flag_value(args: &[String], start: usize, name: &str, short: Option<&str>) -> Option<String> {
    let mut i = start;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == name || short == Some(arg) {
            return args.get(i + 1).cloned();
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], start: usize, name: &str) -> bool {
    args.iter().skip(start).any(|a| a == name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SetupArgs {
    pub url: Option<String>,
    pub token: Option<String>,
}

pub(crate) fn parse_setup_flags(args: &[String], start: usize) -> SetupArgs {
    let mut url = None;
    let mut token = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                if i + 1 < args.len() {
                    url = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--token" => {
                if i + 1 < args.len() {
                    token = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    SetupArgs { url, token }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TaskQueryArgs {
    pub agent: Option<String>,
    pub pending: bool,
}

pub(crate) fn parse_task_flags(args: &[String], start: usize) -> TaskQueryArgs {
    TaskQueryArgs {
        agent: flag_value(args, start, "--agent", Some("-a")),
        pending: has_flag(args, start, "--pending"),
    }
}

pub(crate) fn parse_limit_flag(args: &[String], start: usize) -> u32 {
    flag_value(args, start, "--limit", Some("-n"))
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_RUN_LIMIT)
}

pub(crate) fn parse_interval_flag(args: &[String], start: usize) -> Duration {
    flag_value(args, start, "--interval", None)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(POLL_INTERVAL)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskStatusArgs {
    pub task_id: String,
    pub status: TaskStatus,
    pub error: Option<String>,
}

/// `task status <id> <status> [--error <msg>]`, positionals starting at `start`.
pub(crate) fn parse_task_status_args(args: &[String], start: usize) -> Result<TaskStatusArgs> {
    let mut positionals = Vec::new();
    let mut error = None;
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--error" | "-e" => {
                if i + 1 < args.len() {
                    error = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            other => {
                positionals.push(other.to_string());
                i += 1;
            }
        }
    }

    let [task_id, raw_status] = positionals.as_slice() else {
        bail!("Usage: mission-control task status <task_id> <status> [--error <message>]");
    };
    let Some(status) = TaskStatus::from_status(raw_status) else {
        bail!(
            "Unknown task status '{}'. Expected one of: inbox, assigned, in-progress, review, done, waiting, pending, failed",
            raw_status
        );
    };
    Ok(TaskStatusArgs {
        task_id: task_id.clone(),
        status,
        error,
    })
}

pub(crate) fn parse_run_log_flags(args: &[String], start: usize) -> Result<NewAgentRun> {
    let required = |name: &str| -> Result<String> {
        flag_value(args, start, name, None)
            .with_context(|| format!("{} is required for `run log`", name))
    };

    let tokens_raw = required("--tokens")?;
    let tokens_used: i64 = tokens_raw
        .parse()
        .with_context(|| format!("--tokens must be an integer, got '{}'", tokens_raw))?;
    let cost_raw = required("--cost")?;
    let cost_usd: f64 = cost_raw
        .parse()
        .with_context(|| format!("--cost must be a number, got '{}'", cost_raw))?;
    let status_raw = required("--status")?;
    let Some(status) = RunStatus::from_status(&status_raw) else {
        bail!(
            "Unknown run status '{}'. Expected success, failed or retry",
            status_raw
        );
    };

    Ok(NewAgentRun {
        agent_id: required("--agent")?,
        task_id: required("--task")?,
        tokens_used,
        cost_usd,
        status,
        summary: required("--summary")?,
        model: flag_value(args, start, "--model", None),
    })
}

/// Shared handles for commands that talk to the database.
pub(crate) struct Session {
    pub credentials: Arc<CredentialStore>,
    pub client: Arc<TursoClient>,
    pub store: MissionStore<TursoClient>,
    pub json: bool,
}

impl Session {
    pub fn open(json: bool) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::open_default());
        let client = Arc::new(
            TursoClient::new(Arc::clone(&credentials)).context("failed to build HTTP client")?,
        );
        let store = MissionStore::new(Arc::clone(&client));
        Ok(Self {
            credentials,
            client,
            store,
            json,
        })
    }
}

fn sub_command(args: &[String]) -> &str {
    args.get(2).map(String::as_str).unwrap_or("")
}

async fn run_dashboard(session: Session, interval: Duration, log_rx: broadcast::Receiver<String>) -> Result<()> {
    let poller = DashboardPoller::new(session.store, Arc::clone(&session.credentials));
    let handle = poller.spawn(interval);
    let mut app = DashboardApp::new(handle, Some(log_rx));
    app.run_tui().await
}

pub async fn run_main() -> Result<()> {
    let raw: Vec<String> = std::env::args().collect();
    let (flags, args) = parse_global_flags(&raw);
    let level = logging::resolve_level(flags.verbose);

    if args.len() < 2 {
        logging::init(level, None);
        print_help();
        return Ok(());
    }

    let cmd = args[1].as_str();
    if cmd == "dashboard" {
        let (tx, rx) = broadcast::channel(256);
        logging::init(level, Some(tx));
        let session = Session::open(flags.json)?;
        return run_dashboard(session, parse_interval_flag(&args, 2), rx).await;
    }
    logging::init(level, None);

    match cmd {
        "setup" => {
            let session = Session::open(flags.json)?;
            setup::run_setup(&session, parse_setup_flags(&args, 2)).await?;
        }
        "credentials" | "creds" => {
            let session = Session::open(flags.json)?;
            match sub_command(&args) {
                "show" | "" => credentials_cmd::show(&session)?,
                "clear" => credentials_cmd::clear(&session)?,
                other => {
                    print_error(&format!("Unknown credentials command: {}", other));
                    GuideSection::new("mission-control credentials")
                        .command("show", "Print the effective URL and masked token")
                        .command("clear", "Forget the saved URL and token")
                        .print();
                    println!();
                }
            }
        }
        "schema" => match sub_command(&args) {
            "apply" => {
                let session = Session::open(flags.json)?;
                schema_cmd::apply(&session).await?;
            }
            "print" => schema_cmd::print(),
            _ => {
                GuideSection::new("mission-control schema")
                    .command("apply", "Run the bundled schema against the database")
                    .command("print", "Print the statements that `apply` sends")
                    .print();
                println!();
            }
        },
        "agents" => query_cmd::agents(&Session::open(flags.json)?).await?,
        "goals" => query_cmd::goals(&Session::open(flags.json)?).await?,
        "tasks" => {
            let parsed = parse_task_flags(&args, 2);
            query_cmd::tasks(&Session::open(flags.json)?, &parsed).await?;
        }
        "runs" => {
            let limit = parse_limit_flag(&args, 2);
            query_cmd::runs(&Session::open(flags.json)?, limit).await?;
        }
        "memory" => {
            let agent = flag_value(&args, 2, "--agent", Some("-a"));
            query_cmd::memory(&Session::open(flags.json)?, agent.as_deref()).await?;
        }
        "usage" => query_cmd::usage(&Session::open(flags.json)?).await?,
        "task" => match sub_command(&args) {
            "status" => {
                let parsed = parse_task_status_args(&args, 3)?;
                write_cmd::task_status(&Session::open(flags.json)?, &parsed).await?;
            }
            _ => {
                GuideSection::new("mission-control task")
                    .command("status", "<task_id> <status> [--error <message>]")
                    .blank()
                    .hint("mission-control task status t-042 done", "")
                    .hint(
                        "mission-control task status t-042 failed --error \"timeout\"",
                        "",
                    )
                    .print();
                println!();
            }
        },
        "run" => match sub_command(&args) {
            "log" => {
                let run = parse_run_log_flags(&args, 3)?;
                write_cmd::run_log(&Session::open(flags.json)?, &run).await?;
            }
            _ => {
                GuideSection::new("mission-control run")
                    .command("log", "Record a finished agent run")
                    .blank()
                    .text("--agent <id>  --task <id>  --tokens <n>  --cost <usd>")
                    .text("--status success|failed|retry  --summary <text>  [--model <name>]")
                    .print();
                println!();
            }
        },
        "doctor" => doctor::run_doctor(&Session::open(flags.json)?).await?,
        "help" | "--help" | "-h" => print_help(),
        _ => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn global_flags_are_stripped_anywhere() {
        let (flags, rest) = parse_global_flags(&argv(&[
            "mission-control",
            "--json",
            "tasks",
            "-v",
            "--pending",
        ]));
        assert!(flags.json);
        assert!(flags.verbose);
        assert_eq!(rest, argv(&["mission-control", "tasks", "--pending"]));
    }

    #[test]
    fn parse_setup_flags_reads_url_and_token() {
        let args = argv(&[
            "mission-control",
            "setup",
            "--url",
            "libsql://db.turso.io",
            "--token",
            "abc",
        ]);
        let parsed = parse_setup_flags(&args, 2);
        assert_eq!(parsed.url.as_deref(), Some("libsql://db.turso.io"));
        assert_eq!(parsed.token.as_deref(), Some("abc"));

        let bare = parse_setup_flags(&argv(&["mission-control", "setup", "--url"]), 2);
        assert_eq!(bare, SetupArgs::default());
    }

    #[test]
    fn parse_task_flags_reads_agent_and_pending() {
        let args = argv(&["mission-control", "tasks", "--agent", "jarvis", "--pending"]);
        let parsed = parse_task_flags(&args, 2);
        assert_eq!(parsed.agent.as_deref(), Some("jarvis"));
        assert!(parsed.pending);
        assert_eq!(parse_task_flags(&args[..2], 2), TaskQueryArgs::default());
    }

    #[test]
    fn parse_limit_flag_falls_back_on_bad_input() {
        assert_eq!(parse_limit_flag(&argv(&["x", "runs", "--limit", "5"]), 2), 5);
        assert_eq!(
            parse_limit_flag(&argv(&["x", "runs", "--limit", "lots"]), 2),
            DEFAULT_RUN_LIMIT
        );
        assert_eq!(
            parse_limit_flag(&argv(&["x", "runs", "-n", "0"]), 2),
            DEFAULT_RUN_LIMIT
        );
    }

    #[test]
    fn parse_interval_flag_defaults_to_poll_interval() {
        assert_eq!(
            parse_interval_flag(&argv(&["x", "dashboard", "--interval", "3"]), 2),
            Duration::from_secs(3)
        );
        assert_eq!(parse_interval_flag(&argv(&["x", "dashboard"]), 2), POLL_INTERVAL);
    }

    #[test]
    fn parse_task_status_args_validates_status() {
        let args = argv(&[
            "x", "task", "status", "t-1", "in_progress", "--error", "stuck",
        ]);
        let parsed = parse_task_status_args(&args, 3).unwrap();
        assert_eq!(parsed.task_id, "t-1");
        assert_eq!(parsed.status, TaskStatus::InProgress);
        assert_eq!(parsed.error.as_deref(), Some("stuck"));

        assert!(parse_task_status_args(&argv(&["x", "task", "status", "t-1", "later"]), 3).is_err());
        assert!(parse_task_status_args(&argv(&["x", "task", "status", "t-1"]), 3).is_err());
    }

    #[test]
    fn parse_run_log_flags_requires_every_field_but_model() {
        let args = argv(&[
            "x", "run", "log", "--agent", "jarvis", "--task", "t-1", "--tokens", "1200", "--cost",
            "0.42", "--status", "success", "--summary", "shipped",
        ]);
        let run = parse_run_log_flags(&args, 3).unwrap();
        assert_eq!(run.agent_id, "jarvis");
        assert_eq!(run.task_id, "t-1");
        assert_eq!(run.tokens_used, 1200);
        assert!((run.cost_usd - 0.42).abs() < f64::EPSILON);
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.model, None);

        let missing = parse_run_log_flags(&args[..13], 3).unwrap_err();
        assert!(missing.to_string().contains("--summary"));

        let mut bad = args.clone();
        bad[8] = "many".to_string();
        assert!(parse_run_log_flags(&bad, 3).is_err());
    }
}
