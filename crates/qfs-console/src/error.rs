use thiserror::Error;

use qfs_common::auth::Role;
use qfs_mgmt::MgmtError;

use crate::actions::SharedFsAction;
use crate::alert::{Alert, PARTIAL_FAILURE_SUMMARY};

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Some hosts answered, some did not. `message` lists the failed hosts.
    #[error("{message}")]
    PartialFailure { message: String },

    #[error("management query failed: {0}")]
    QueryFailed(#[source] MgmtError),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{who} role may not {what}", who = .role.label(), what = .action.label())]
    Forbidden { role: Role, action: SharedFsAction },

    #[error("cannot {what} on {host} in its current state", what = .action.label())]
    ActionUnavailable { action: SharedFsAction, host: String },

    #[error("{summary} on {host}: {cause}", summary = .action.failure_summary())]
    ActionFailed {
        action: SharedFsAction,
        host: String,
        cause: String,
    },
}

impl ConsoleError {
    /// The banner a page shows for this failure.
    pub fn to_alert(&self) -> Alert {
        match self {
            ConsoleError::PartialFailure { message } => {
                let detail = message
                    .strip_prefix(PARTIAL_FAILURE_SUMMARY)
                    .map(|rest| rest.trim_start_matches('\n'))
                    .unwrap_or(message.as_str());
                Alert::warning(PARTIAL_FAILURE_SUMMARY, detail)
            }
            ConsoleError::QueryFailed(e) => {
                Alert::error("Unable to populate shared file system details.", e.to_string())
            }
            ConsoleError::MalformedInput(msg) => Alert::error("Invalid request", msg.clone()),
            ConsoleError::Forbidden { .. } => Alert::error("Not authorized", self.to_string()),
            ConsoleError::ActionUnavailable { action, .. } => {
                Alert::error(action.failure_summary(), self.to_string())
            }
            ConsoleError::ActionFailed { action, host, cause } => Alert::error(
                action.failure_summary(),
                format!("{host}: {cause}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_alert_splits_summary() {
        let err = ConsoleError::PartialFailure {
            message: format!("{PARTIAL_FAILURE_SUMMARY}\ncl1: down"),
        };
        let alert = err.to_alert();
        assert_eq!(alert.summary, PARTIAL_FAILURE_SUMMARY);
        assert_eq!(alert.detail, "cl1: down");
    }

    #[test]
    fn test_action_failed_message() {
        let err = ConsoleError::ActionFailed {
            action: SharedFsAction::Unmount,
            host: "cl1".into(),
            cause: "device busy".into(),
        };
        assert_eq!(err.to_string(), "Failed to unmount file system on cl1: device busy");
    }

    #[test]
    fn test_unavailable_action_alert() {
        let err = ConsoleError::ActionUnavailable {
            action: SharedFsAction::Unmount,
            host: "srv1".into(),
        };
        let alert = err.to_alert();
        assert_eq!(alert.summary, "Failed to unmount file system");
        assert_eq!(alert.detail, "cannot unmount file system on srv1 in its current state");
    }
}
