use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Startup configuration is missing or malformed.
    #[error("invalid configuration for '{key}': {reason}")]
    ConfigurationInvalid { key: String, reason: String },

    /// Wallet amounts must be finite.
    #[error("invalid wallet amount: {0}")]
    InvalidAmount(f64),

    #[error("config file error: {0}")]
    ConfigFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Graph(#[from] agora_graph::GraphError),

    #[error(transparent)]
    Content(#[from] agora_content::ContentError),

    #[error(transparent)]
    Guard(#[from] agora_guard::GuardError),
}

impl CoreError {
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The guard rejection behind this error, if it is one.
    pub fn as_guard(&self) -> Option<&agora_guard::GuardError> {
        match self {
            Self::Guard(err) => Some(err),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
