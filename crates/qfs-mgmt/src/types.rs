use async_trait::async_trait;

use qfs_common::{FileSystemInfo, HostFailure, Member};

use crate::error::MgmtError;

/// Result of a call that fans out to several hosts.
///
/// `Partial` carries whatever the reachable hosts returned together with
/// one entry per host that failed, so callers can render both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<T> {
    Complete(T),
    Partial { data: T, failures: Vec<HostFailure> },
    Failed(MgmtError),
}

impl<T> QueryOutcome<T> {
    /// Build an outcome from collected data and per-host failures.
    pub fn from_parts(data: T, failures: Vec<HostFailure>) -> Self {
        if failures.is_empty() {
            QueryOutcome::Complete(data)
        } else {
            QueryOutcome::Partial { data, failures }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, QueryOutcome::Complete(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryOutcome::Complete(data) | QueryOutcome::Partial { data, .. } => Some(data),
            QueryOutcome::Failed(_) => None,
        }
    }

    pub fn failures(&self) -> &[HostFailure] {
        match self {
            QueryOutcome::Partial { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Management backend for shared QFS file systems.
///
/// Implementations talk to the per-host management daemons; the console
/// only consumes this contract.
#[async_trait]
pub trait SharedFsManager: Send + Sync {
    /// Members of `fs_name` as seen from its metadata server `coordinator`,
    /// with the mount state reported by each member host.
    async fn shared_members(&self, coordinator: &str, fs_name: &str) -> QueryOutcome<Vec<Member>>;

    async fn file_systems(&self, host: &str) -> Result<Vec<FileSystemInfo>, MgmtError>;

    async fn mount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError>;

    async fn unmount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError>;

    /// The name the host reports for itself (`uname -n`).
    async fn server_hostname(&self, host: &str) -> Result<String, MgmtError>;

    /// Drop `host` from the shared hosts table of `fs_name` and delete the
    /// file system configuration on it. Removing the metadata server deletes
    /// the file system on every member.
    async fn remove_member(&self, coordinator: &str, fs_name: &str, host: &str) -> QueryOutcome<()>;
}
