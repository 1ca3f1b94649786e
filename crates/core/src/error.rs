#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The provider credential is missing. Fatal for the request, not the process.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required input is missing or empty.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The provider or the network between us failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The polling budget ran out before the job reached a terminal state.
    #[error("Timed out after {attempts} status queries")]
    Timeout { attempts: u32 },

    /// A provider payload did not contain the fields we need.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The operation was cancelled before it finished.
    #[error("Cancelled: {0}")]
    Cancelled(String),
}
