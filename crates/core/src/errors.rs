use thiserror::Error;

/// Failure classes shared by the dispatch boundary and the operator surfaces.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Integration(_) => "integration",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}
