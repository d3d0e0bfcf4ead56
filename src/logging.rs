use tokio::sync::broadcast;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Overrides the log level (`error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_ENV: &str = "MISSION_CONTROL_LOG";

/// Copies formatted log lines onto a broadcast channel for the dashboard's
/// activity panel.
#[derive(Clone)]
pub(crate) struct PanelMakeWriter {
    pub sender: broadcast::Sender<String>,
    pub suppress_stderr: bool,
}

impl<'a> MakeWriter<'a> for PanelMakeWriter {
    type Writer = PanelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        PanelWriter {
            sender: self.sender.clone(),
            suppress_stderr: self.suppress_stderr,
        }
    }
}

pub(crate) struct PanelWriter {
    sender: broadcast::Sender<String>,
    suppress_stderr: bool,
}

impl std::io::Write for PanelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf).trim_end().to_string();
        let _ = self.sender.send(msg); // Ignored if no receivers
        if !self.suppress_stderr {
            std::io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.suppress_stderr {
            std::io::stderr().flush()?;
        }
        Ok(())
    }
}

pub(crate) fn parse_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// `MISSION_CONTROL_LOG` wins; `--verbose` means debug; otherwise warnings only
/// so command output stays clean.
pub(crate) fn resolve_level(verbose: bool) -> Level {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(if verbose { Level::DEBUG } else { Level::WARN })
}

/// Installs the global subscriber. With a panel sender, lines go to the
/// channel only and the terminal is left to the dashboard.
pub(crate) fn init(level: Level, panel: Option<broadcast::Sender<String>>) {
    match panel {
        Some(sender) => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_ansi(false)
                .with_target(false)
                .with_writer(PanelMakeWriter {
                    sender,
                    suppress_stderr: true,
                })
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}
