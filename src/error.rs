use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("insufficient data: needed at least {needed} points, found {found}")]
    InsufficientData { needed: usize, found: usize },

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("linker error: {0}")]
    Linker(String),
}
