pub mod agents_data;
pub mod mapping;
pub mod poller;
pub mod stats;

pub use agents_data::{
    Agent, AgentStatus, AgentTask, AgentType, TASK_COLUMNS, TaskColumn, TaskStatus, static_agents,
};
pub use poller::{DashboardPoller, LiveAgentData, POLL_INTERVAL, PollerHandle};
pub use stats::{TeamStats, UsageTotals};
