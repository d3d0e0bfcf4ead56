use thiserror::Error;

#[derive(Debug, Error)]
pub enum TursoError {
    /// No URL/token could be resolved; raised before any network I/O.
    #[error("Turso not configured. Run `mission-control setup` to enter your URL and token.")]
    Configuration,

    /// The endpoint answered with a non-2xx status.
    #[error("Turso HTTP error {status}: {body}")]
    Transport { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, timeout, refused).
    #[error("Turso request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not have the expected result envelope.
    #[error("Unexpected Turso response shape: {0}")]
    Protocol(String),

    /// A step of a batched request failed. `index` is 1-based.
    #[error("Statement {index} failed: {message}")]
    Statement { index: usize, message: String },
}

impl TursoError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, TursoError::Configuration)
    }
}
