use thiserror::Error;

/// Failure reported by the engine or the backend client.
///
/// `Validation` errors are raised before any request leaves the process
/// (empty selection, blank description). `Transport` covers everything the
/// backend or the network reports, already reduced to a display string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Transport(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::Transport(m) => m,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Transport("request timed out".to_string());
        }
        Self::Transport(e.to_string())
    }
}
