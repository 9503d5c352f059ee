use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanopyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input matrix must be column-major")]
    RowMajorInput,

    #[error("Quantile table error: {0}")]
    QuantileError(String),

    #[error("Label error: {0}")]
    LabelError(String),

    #[error("Insufficient data: need at least {min} sampled rows, got {actual}")]
    InsufficientData { min: usize, actual: usize },

    #[error("Workspace buffer too small: need {needed} bytes, got {got}")]
    WorkspaceTooSmall { needed: usize, got: usize },

    #[error("Workspace has not been assigned")]
    WorkspaceUnassigned,
}

pub type Result<T> = std::result::Result<T, CanopyError>;
