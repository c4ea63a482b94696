//! Top-level request errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::ExecutionError;
use crate::generator::GenerationError;
use crate::store::StoreError;

/// Result type for pipeline requests
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that end a request.
///
/// Malformed generator output never appears here: it is recovered with a
/// default query before execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Session could not be opened or the schema could not be read
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Config(e) => e.code(),
            PipelineError::Generation(e) => e.code(),
            PipelineError::Store(e) => e.code(),
            PipelineError::Execution(e) => e.code(),
        }
    }
}
