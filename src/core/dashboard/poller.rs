//! Periodic snapshot of the live database, published on a watch channel.
//!
//! Without credentials the snapshot is the built-in team and no request is
//! made. With credentials every tick fetches agents, tasks, runs, memory and
//! usage concurrently and replaces the snapshot only if all five succeed;
//! otherwise the previous data stays and the error is recorded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::agents_data::{Agent, static_agents};
use super::mapping::map_agents;
use crate::core::credentials::CredentialStore;
use crate::core::turso::{DEFAULT_RUN_LIMIT, MissionStore, Row, SqlExecutor};

pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize)]
pub struct LiveAgentData {
    pub agents: Vec<Agent>,
    pub runs: Vec<Row>,
    pub memory: Vec<Row>,
    pub token_usage: Vec<Row>,
    /// Credentials were present at the last refresh.
    pub is_live: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

impl LiveAgentData {
    pub fn fallback(is_live: bool) -> Self {
        Self {
            agents: static_agents(),
            runs: Vec::new(),
            memory: Vec::new(),
            token_usage: Vec::new(),
            is_live,
            is_loading: is_live,
            error: None,
            last_updated: None,
        }
    }
}

pub struct DashboardPoller<E: SqlExecutor> {
    store: MissionStore<E>,
    credentials: Arc<CredentialStore>,
    state: watch::Sender<LiveAgentData>,
}

impl<E: SqlExecutor + 'static> DashboardPoller<E> {
    pub fn new(store: MissionStore<E>, credentials: Arc<CredentialStore>) -> Self {
        let (state, _) = watch::channel(LiveAgentData::fallback(credentials.is_configured()));
        Self {
            store,
            credentials,
            state,
        }
    }

    pub fn snapshot(&self) -> LiveAgentData {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveAgentData> {
        self.state.subscribe()
    }

    pub async fn refetch(&self) {
        if !self.credentials.is_configured() {
            self.state.send_modify(|s| {
                s.is_live = false;
                s.is_loading = false;
            });
            return;
        }

        self.state.send_modify(|s| {
            s.is_live = true;
            s.is_loading = true;
        });

        let fetched = tokio::try_join!(
            self.store.fetch_agents(),
            self.store.fetch_all_tasks(),
            self.store.fetch_agent_runs(DEFAULT_RUN_LIMIT),
            self.store.fetch_memory_summaries(None),
            self.store.fetch_token_usage(),
        );

        match fetched {
            Ok((agent_rows, task_rows, runs, memory, token_usage)) => {
                let agents = map_agents(&agent_rows, &task_rows);
                debug!(
                    "Snapshot refreshed: {} agents, {} tasks, {} runs",
                    agents.len(),
                    task_rows.len(),
                    runs.len()
                );
                self.state.send_modify(|s| {
                    s.agents = agents;
                    s.runs = runs;
                    s.memory = memory;
                    s.token_usage = token_usage;
                    s.error = None;
                    s.is_loading = false;
                    s.last_updated = Some(Local::now());
                });
            }
            Err(e) => {
                warn!("Dashboard refresh failed: {}", e);
                self.state.send_modify(|s| {
                    s.error = Some(e.to_string());
                    s.is_loading = false;
                });
            }
        }
    }

    /// Refreshes immediately, then every `interval` and whenever the handle
    /// asks for it.
    pub fn spawn(self, interval: Duration) -> PollerHandle {
        let receiver = self.state.subscribe();
        let trigger = Arc::new(Notify::new());
        let notified = Arc::clone(&trigger);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = notified.notified() => {}
                }
                self.refetch().await;
            }
        });

        PollerHandle {
            receiver,
            trigger,
            task,
        }
    }
}

/// Owns the polling task; dropping it stops polling and discards any
/// refresh still in flight.
pub struct PollerHandle {
    receiver: watch::Receiver<LiveAgentData>,
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn snapshot(&self) -> LiveAgentData {
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveAgentData> {
        self.receiver.clone()
    }

    /// Out-of-band refresh; coalesces with one already running.
    pub fn refetch(&self) {
        self.trigger.notify_one();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
