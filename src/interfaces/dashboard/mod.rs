mod events;
mod ui;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::{broadcast, watch};

use crate::core::dashboard::{LiveAgentData, PollerHandle, TASK_COLUMNS, TaskStatus};

/// How often the "last refreshed" stamp moves while auto-refresh is on.
pub const REFRESH_STAMP_INTERVAL: Duration = Duration::from_secs(30);

const ACTIVITY_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Board,
    Agents,
    Runs,
    Memory,
    Usage,
    Activity,
}

const TABS: [(Tab, &str); 7] = [
    (Tab::Overview, "Dashboard"),
    (Tab::Board, "Project Board"),
    (Tab::Agents, "Agents"),
    (Tab::Runs, "Runs"),
    (Tab::Memory, "Memory"),
    (Tab::Usage, "Token Usage"),
    (Tab::Activity, "Activity"),
];

impl Tab {
    fn index(&self) -> usize {
        TABS.iter().position(|(t, _)| t == self).unwrap_or(0)
    }

    fn offset(&self, delta: isize) -> Tab {
        let len = TABS.len() as isize;
        let next = (self.index() as isize + delta).rem_euclid(len) as usize;
        TABS[next].0
    }
}

pub struct DashboardApp {
    poller: PollerHandle,
    updates: watch::Receiver<LiveAgentData>,
    snapshot: LiveAgentData,
    log_rx: Option<broadcast::Receiver<String>>,
    activity: VecDeque<String>,

    tab: Tab,
    selected_agent: usize,
    /// `None` shows every column.
    task_filter: Option<TaskStatus>,
    scroll: u16,

    auto_refresh: bool,
    last_refreshed: DateTime<Local>,
    last_stamp: Instant,
    should_quit: bool,
}

impl DashboardApp {
    pub fn new(poller: PollerHandle, log_rx: Option<broadcast::Receiver<String>>) -> Self {
        let updates = poller.subscribe();
        let snapshot = poller.snapshot();
        Self {
            poller,
            updates,
            snapshot,
            log_rx,
            activity: VecDeque::with_capacity(ACTIVITY_CAPACITY),
            tab: Tab::Overview,
            selected_agent: 0,
            task_filter: None,
            scroll: 0,
            auto_refresh: false,
            last_refreshed: Local::now(),
            last_stamp: Instant::now(),
            should_quit: false,
        }
    }

    fn push_activity(&mut self, line: String) {
        if line.is_empty() {
            return;
        }
        if self.activity.len() == ACTIVITY_CAPACITY {
            self.activity.pop_front();
        }
        self.activity.push_back(line);
    }

    /// Drains pending log lines and picks up a new snapshot if one was published.
    fn sync(&mut self) {
        let mut lines = Vec::new();
        if let Some(rx) = self.log_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(line) => lines.push(line),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        lines.push(format!("... {} log line(s) dropped", skipped));
                    }
                    Err(_) => break,
                }
            }
        }
        for line in lines {
            self.push_activity(line);
        }

        if self.updates.has_changed().unwrap_or(false) {
            self.snapshot = self.updates.borrow_and_update().clone();
            let count = self.snapshot.agents.len();
            if self.selected_agent >= count {
                self.selected_agent = count.saturating_sub(1);
            }
        }
    }

    /// Moves the stamp forward when auto-refresh is on and the interval has passed.
    fn tick_stamp(&mut self, now: Instant) {
        if self.auto_refresh && now.duration_since(self.last_stamp) >= REFRESH_STAMP_INTERVAL {
            self.last_refreshed = Local::now();
            self.last_stamp = now;
        }
    }

    fn toggle_auto_refresh(&mut self, now: Instant) {
        self.auto_refresh = !self.auto_refresh;
        if self.auto_refresh {
            self.last_stamp = now;
        }
    }

    fn refresh_now(&mut self, now: Instant) {
        self.last_refreshed = Local::now();
        self.last_stamp = now;
        self.poller.refetch();
    }

    fn cycle_filter(&mut self) {
        self.task_filter = match self.task_filter {
            None => Some(TASK_COLUMNS[0].id),
            Some(current) => TASK_COLUMNS
                .iter()
                .position(|c| c.id == current)
                .and_then(|i| TASK_COLUMNS.get(i + 1))
                .map(|c| c.id),
        };
    }

    fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.scroll = 0;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.tab == Tab::Agents {
            let count = self.snapshot.agents.len();
            if count > 0 {
                let next = (self.selected_agent as isize + delta).clamp(0, count as isize - 1);
                self.selected_agent = next as usize;
            }
        } else if delta < 0 {
            self.scroll = self.scroll.saturating_sub(delta.unsigned_abs() as u16);
        } else {
            self.scroll = self.scroll.saturating_add(delta as u16);
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.select_tab(self.tab.offset(1)),
            KeyCode::BackTab | KeyCode::Left => self.select_tab(self.tab.offset(-1)),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.select_tab(TABS[idx].0);
            }
            KeyCode::Char('r') => self.refresh_now(now),
            KeyCode::Char('a') => self.toggle_auto_refresh(now),
            KeyCode::Char('f') if self.tab == Tab::Agents => self.cycle_filter(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            _ => {}
        }
    }
}
