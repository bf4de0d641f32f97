use serde::{Deserialize, Serialize};

use qfs_common::auth::Role;
use qfs_common::{Member, MemberRole, MountState};
use qfs_mgmt::{QueryOutcome, SharedFsManager};

use crate::alert::{multi_host_message, Alert, PARTIAL_FAILURE_SUMMARY};
use crate::error::ConsoleError;
use crate::shared::{fetch_members, SharedFsStatus};

/// Row actions offered on the shared file system details page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedFsAction {
    Mount,
    Unmount,
    /// Delete button; removing the metadata server deletes the file system.
    Remove,
}

impl SharedFsAction {
    pub const ALL: [SharedFsAction; 3] = [
        SharedFsAction::Mount,
        SharedFsAction::Unmount,
        SharedFsAction::Remove,
    ];

    /// Option value used by the action drop-down. Remove has its own button.
    pub fn token(self) -> Option<&'static str> {
        match self {
            SharedFsAction::Mount => Some("2"),
            SharedFsAction::Unmount => Some("3"),
            SharedFsAction::Remove => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SharedFsAction::Mount => "mount file system",
            SharedFsAction::Unmount => "unmount file system",
            SharedFsAction::Remove => "remove host from shared file system",
        }
    }

    pub fn failure_summary(self) -> &'static str {
        match self {
            SharedFsAction::Mount => "Failed to mount file system",
            SharedFsAction::Unmount => "Failed to unmount file system",
            SharedFsAction::Remove => "Failed to remove host from shared file system",
        }
    }

    pub fn required_role(self) -> Role {
        Role::Operator
    }

    /// Whether the action applies to `member` given the file system's state.
    ///
    /// Clients can only mount once the metadata server has the file system
    /// mounted, and the metadata server can only unmount or be removed after
    /// every client has unmounted.
    pub fn is_enabled(self, member: &Member, status: &SharedFsStatus, role: Role) -> bool {
        if !role.allows(self.required_role()) {
            return false;
        }
        let mds = member.role.is_metadata_server();
        match self {
            SharedFsAction::Mount => {
                !member.mounted
                    && member.role != MemberRole::NotShared
                    && (mds || status.metadata_server_mounted)
            }
            SharedFsAction::Unmount => member.mounted && (!mds || status.all_clients_unmounted),
            SharedFsAction::Remove => !member.mounted && (!mds || status.all_clients_unmounted),
        }
    }
}

/// Per-row action enablement, parallel to the member table rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowActions {
    pub host_name: String,
    pub mount: bool,
    pub unmount: bool,
    pub remove: bool,
}

impl RowActions {
    pub fn for_member(member: &Member, status: &SharedFsStatus, role: Role) -> Self {
        Self {
            host_name: member.host_name.clone(),
            mount: SharedFsAction::Mount.is_enabled(member, status, role),
            unmount: SharedFsAction::Unmount.is_enabled(member, status, role),
            remove: SharedFsAction::Remove.is_enabled(member, status, role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub alert: Alert,
    /// The details page no longer exists for the coordinator: the file
    /// system was deleted, or the coordinator removed itself.
    pub fs_removed: bool,
}

/// Run `action` against `fs_name` on `member`, a host of the shared hosts
/// table reported by `coordinator`.
///
/// The member list is queried again so the target and its enablement are
/// checked against current state. A mount the backend accepts but that
/// leaves the file system unmounted is reported as a failure.
pub async fn perform_action(
    manager: &dyn SharedFsManager,
    role: Role,
    coordinator: &str,
    fs_name: &str,
    member: &str,
    action: SharedFsAction,
) -> Result<ActionReport, ConsoleError> {
    if !role.allows(action.required_role()) {
        return Err(ConsoleError::Forbidden { role, action });
    }
    if member.trim().is_empty() {
        return Err(ConsoleError::MalformedInput("no member host selected".into()));
    }

    let snapshot = fetch_members(manager, coordinator, fs_name).await?;
    let Some(target) = snapshot.members.iter().find(|m| m.host_name == member) else {
        return Err(ConsoleError::MalformedInput(format!(
            "{member} is not a member of shared file system {fs_name}"
        )));
    };
    let status = SharedFsStatus::derive(&snapshot.members);
    if !action.is_enabled(target, &status, role) {
        return Err(ConsoleError::ActionUnavailable {
            action,
            host: member.to_string(),
        });
    }

    let failed = |cause: String| ConsoleError::ActionFailed {
        action,
        host: member.to_string(),
        cause,
    };

    tracing::info!(host = member, fs = fs_name, ?action, "starting shared file system action");

    let report = match action {
        SharedFsAction::Mount => {
            manager
                .mount(member, fs_name)
                .await
                .map_err(|e| failed(e.to_string()))?;

            let state = manager
                .file_systems(member)
                .await
                .map_err(|e| failed(e.to_string()))?
                .into_iter()
                .find(|fs| fs.name == fs_name)
                .map(|fs| fs.state);
            if state != Some(MountState::Mounted) {
                return Err(failed("file system is still unmounted".into()));
            }
            ActionReport {
                alert: Alert::info("Success", format!("File system {fs_name} mounted on {member}")),
                fs_removed: false,
            }
        }
        SharedFsAction::Unmount => {
            manager
                .unmount(member, fs_name)
                .await
                .map_err(|e| failed(e.to_string()))?;
            ActionReport {
                alert: Alert::info(
                    "Success",
                    format!("File system {fs_name} unmounted on {member}"),
                ),
                fs_removed: false,
            }
        }
        SharedFsAction::Remove => {
            match manager.remove_member(coordinator, fs_name, member).await {
                QueryOutcome::Complete(()) => {}
                QueryOutcome::Partial { failures, .. } => {
                    tracing::warn!(
                        host = member,
                        fs = fs_name,
                        failed = failures.len(),
                        "member removal partially failed"
                    );
                    return Err(ConsoleError::PartialFailure {
                        message: multi_host_message(PARTIAL_FAILURE_SUMMARY, &failures),
                    });
                }
                // Already gone from the table counts as removed.
                QueryOutcome::Failed(e) if e.is_not_found() => {
                    tracing::info!(host = member, fs = fs_name, error=%e, "member already removed");
                }
                QueryOutcome::Failed(e) => return Err(failed(e.to_string())),
            }

            let deleted = target.role.is_metadata_server();
            let fs_removed = deleted || removes_coordinator(manager, coordinator, target).await;
            let detail = if deleted {
                format!("Shared file system {fs_name} deleted")
            } else {
                format!("Host {member} removed from shared file system {fs_name}")
            };
            ActionReport {
                alert: Alert::info("Success", detail),
                fs_removed,
            }
        }
    };

    tracing::info!(host = member, fs = fs_name, ?action, "shared file system action done");
    Ok(report)
}

/// Whether `target` is the coordinator itself acting as a potential
/// metadata server.
async fn removes_coordinator(
    manager: &dyn SharedFsManager,
    coordinator: &str,
    target: &Member,
) -> bool {
    if target.role != MemberRole::PotentialMetadataServer {
        return false;
    }
    let hostname = match manager.server_hostname(coordinator).await {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!(coordinator, error=%e, "server hostname unavailable");
            coordinator.to_string()
        }
    };
    short_name(&hostname).eq_ignore_ascii_case(short_name(&target.host_name))
}

fn short_name(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}
