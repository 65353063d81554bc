//! Errors for query execution.

/// Errors raised while running an execution plan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the executor failed: {0}")]
    Executor(Box<dyn std::error::Error + Send + Sync>),
}
