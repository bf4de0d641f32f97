use thiserror::Error;

/// Failure reported by the management backend for a single host or call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MgmtError {
    #[error("host {host} is not reachable: {reason}")]
    HostUnreachable { host: String, reason: String },

    #[error("{what} not found on {host}")]
    NotFound { host: String, what: String },

    /// The backend refused the operation (busy device, bad state, ...).
    #[error("{0}")]
    Rejected(String),

    #[error("management transport error: {0}")]
    Transport(String),

    #[error("invalid management response: {0}")]
    Decode(String),
}

impl MgmtError {
    pub fn unreachable(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostUnreachable {
            host: host.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(host: impl Into<String>, what: impl Into<String>) -> Self {
        Self::NotFound {
            host: host.into(),
            what: what.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MgmtError::NotFound { .. })
    }
}

impl From<reqwest::Error> for MgmtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MgmtError::Decode(err.to_string())
        } else {
            MgmtError::Transport(err.to_string())
        }
    }
}
