pub mod credentials;
pub mod dashboard;
pub mod terminal;
pub mod turso;
