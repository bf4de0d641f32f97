//! Shared file system details: member status aggregation and page assembly.

use serde::Serialize;

use qfs_common::auth::Role;
use qfs_common::{HostFailure, Member};
use qfs_mgmt::{QueryOutcome, SharedFsManager};

use crate::actions::RowActions;
use crate::alert::{multi_host_message, Alert, PARTIAL_FAILURE_SUMMARY};
use crate::error::ConsoleError;
use crate::table::{Row, TableModel, TiledRecord};

pub const CLIENTS_UNMOUNTED: &str = "allClientUnMounted";
pub const CLIENTS_NOT_UNMOUNTED: &str = "notAllClientUnMounted";

/// Aggregate mount flags over a member list.
///
/// Every role other than metadata server counts as a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedFsStatus {
    pub all_mounted: bool,
    pub all_clients_unmounted: bool,
    pub all_clients_mounted: bool,
    pub metadata_server_mounted: bool,
    /// Host name of the metadata server the flags were taken from.
    pub metadata_server: Option<String>,
}

impl SharedFsStatus {
    pub fn derive(members: &[Member]) -> Self {
        let mut status = SharedFsStatus {
            all_mounted: true,
            all_clients_unmounted: true,
            all_clients_mounted: true,
            metadata_server_mounted: false,
            metadata_server: None,
        };

        for m in members {
            if !m.mounted {
                status.all_mounted = false;
            }
            if m.role.is_metadata_server() {
                // Last one wins when the backend reports several.
                if let Some(prev) = &status.metadata_server {
                    tracing::warn!(
                        previous=%prev,
                        host=%m.host_name,
                        "more than one metadata server reported"
                    );
                }
                status.metadata_server = Some(m.host_name.clone());
                status.metadata_server_mounted = m.mounted;
            } else if m.mounted {
                status.all_clients_unmounted = false;
            } else {
                status.all_clients_mounted = false;
            }
        }

        status
    }
}

/// Members obtained from one query, possibly incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub members: Vec<Member>,
    pub failures: Vec<HostFailure>,
    /// Set when some hosts could not be queried.
    pub partial_error: Option<String>,
}

/// Query the members of `fs_name` through its coordinator.
///
/// A partial answer is returned as `Ok` with `partial_error` set; only a
/// query that produced no data at all is an error.
pub async fn fetch_members(
    manager: &dyn SharedFsManager,
    coordinator: &str,
    fs_name: &str,
) -> Result<MemberSnapshot, ConsoleError> {
    if coordinator.trim().is_empty() {
        return Err(ConsoleError::MalformedInput("coordinator host name is empty".into()));
    }
    if fs_name.trim().is_empty() {
        return Err(ConsoleError::MalformedInput("file system name is empty".into()));
    }

    match manager.shared_members(coordinator, fs_name).await {
        QueryOutcome::Complete(members) => Ok(MemberSnapshot {
            members,
            failures: Vec::new(),
            partial_error: None,
        }),
        QueryOutcome::Partial { data, failures } => {
            tracing::warn!(
                coordinator,
                fs = fs_name,
                failed = failures.len(),
                "shared members partially available"
            );
            let message = multi_host_message(PARTIAL_FAILURE_SUMMARY, &failures);
            Ok(MemberSnapshot {
                members: data,
                failures,
                partial_error: Some(message),
            })
        }
        QueryOutcome::Failed(e) => {
            tracing::error!(coordinator, fs = fs_name, error=%e, "shared members query failed");
            Err(ConsoleError::QueryFailed(e))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedMemberField {
    HostName,
    Role,
    MountState,
    Mounted,
    MetadataServer,
}

impl TiledRecord for Member {
    type Field = SharedMemberField;

    fn project(&self, row: &mut Row<SharedMemberField>) {
        row.set(SharedMemberField::HostName, self.host_name.as_str());
        row.set(SharedMemberField::Role, self.role.label());
        row.set(SharedMemberField::MountState, self.mount_label());
        row.set(SharedMemberField::Mounted, self.mounted);
        row.set(SharedMemberField::MetadataServer, self.role.is_metadata_server());
    }
}

/// State the browser-side scripts need to enable and disable actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientState {
    pub host_name: String,
    pub fs_name: String,
    pub all_mounted: bool,
    pub all_client_mount: &'static str,
    pub mds_mounted: bool,
}

impl ClientState {
    fn new(host_name: &str, fs_name: &str, status: &SharedFsStatus) -> Self {
        Self {
            host_name: host_name.to_string(),
            fs_name: fs_name.to_string(),
            all_mounted: status.all_mounted,
            all_client_mount: if status.all_clients_unmounted {
                CLIENTS_UNMOUNTED
            } else {
                CLIENTS_NOT_UNMOUNTED
            },
            mds_mounted: status.metadata_server_mounted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedFsPage {
    pub title: String,
    pub coordinator: String,
    pub fs_name: String,
    pub table: TableModel<SharedMemberField>,
    pub status: SharedFsStatus,
    pub client_state: ClientState,
    pub row_actions: Vec<RowActions>,
    pub alerts: Vec<Alert>,
}

/// Build the shared file system details page.
///
/// Never fails: query errors become alerts next to whatever rows exist.
pub async fn build_shared_fs_page(
    manager: &dyn SharedFsManager,
    role: Role,
    coordinator: &str,
    fs_name: &str,
) -> SharedFsPage {
    let mut table = TableModel::new(format!("{fs_name} Shared File System Details"));
    let mut alerts = Vec::new();

    let members = match fetch_members(manager, coordinator, fs_name).await {
        Ok(snapshot) => {
            if let Some(message) = snapshot.partial_error {
                alerts.push(ConsoleError::PartialFailure { message }.to_alert());
            }
            snapshot.members
        }
        Err(e) => {
            alerts.push(e.to_alert());
            Vec::new()
        }
    };

    table.populate_rows(&members);
    let status = SharedFsStatus::derive(&members);
    let row_actions = members
        .iter()
        .map(|m| RowActions::for_member(m, &status, role))
        .collect();

    SharedFsPage {
        title: table.title.clone(),
        coordinator: coordinator.to_string(),
        fs_name: fs_name.to_string(),
        client_state: ClientState::new(coordinator, fs_name, &status),
        table,
        status,
        row_actions,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use qfs_common::MemberRole;
    use qfs_mgmt::MemoryManager;

    fn make_member(host: &str, role: MemberRole, mounted: bool) -> Member {
        Member::new(host, role, mounted)
    }

    #[test]
    fn test_all_mounted_when_nothing_unmounted() {
        let members = vec![
            make_member("srv1", MemberRole::MetadataServer, true),
            make_member("cl1", MemberRole::Client, true),
            make_member("cl2", MemberRole::PotentialMetadataServer, true),
        ];
        let status = SharedFsStatus::derive(&members);
        assert!(status.all_mounted);
        assert!(status.all_clients_mounted);
        assert!(!status.all_clients_unmounted);
    }

    #[test]
    fn test_unmounted_client_clears_all_clients_mounted() {
        let members = vec![
            make_member("srv1", MemberRole::MetadataServer, true),
            make_member("cl1", MemberRole::Client, false),
        ];
        let status = SharedFsStatus::derive(&members);
        assert!(!status.all_clients_mounted);
        assert!(!status.all_mounted);
    }

    #[test]
    fn test_metadata_server_does_not_count_as_client() {
        let members = vec![
            make_member("srv1", MemberRole::MetadataServer, true),
            make_member("cl1", MemberRole::Client, false),
            make_member("cl2", MemberRole::Client, false),
        ];
        let status = SharedFsStatus::derive(&members);
        assert!(status.all_clients_unmounted);
        assert!(status.metadata_server_mounted);
        assert_eq!(status.metadata_server.as_deref(), Some("srv1"));
    }

    #[test]
    fn test_no_metadata_server() {
        let members = vec![make_member("cl1", MemberRole::Client, true)];
        let status = SharedFsStatus::derive(&members);
        assert!(!status.metadata_server_mounted);
        assert!(status.metadata_server.is_none());
    }

    #[test]
    fn test_last_metadata_server_wins() {
        let members = vec![
            make_member("srv1", MemberRole::MetadataServer, true),
            make_member("srv2", MemberRole::MetadataServer, false),
        ];
        let status = SharedFsStatus::derive(&members);
        assert!(!status.metadata_server_mounted);
        assert_eq!(status.metadata_server.as_deref(), Some("srv2"));

        let status = SharedFsStatus::derive(&[members[1].clone(), members[0].clone()]);
        assert!(status.metadata_server_mounted);
    }

    async fn srv1_fs1() -> MemoryManager {
        let mgr = MemoryManager::new();
        mgr.add_shared_fs(
            "fs1",
            "/qfs/fs1",
            &[
                ("srv1", MemberRole::MetadataServer, true),
                ("cl1", MemberRole::Client, true),
                ("cl2", MemberRole::Client, false),
            ],
        )
        .await;
        mgr
    }

    #[tokio::test]
    async fn test_end_to_end_srv1_fs1() {
        let mgr = srv1_fs1().await;
        let snapshot = fetch_members(&mgr, "srv1", "fs1").await.unwrap();
        assert!(snapshot.partial_error.is_none());

        let page = build_shared_fs_page(&mgr, Role::Admin, "srv1", "fs1").await;
        assert_eq!(page.table.len(), 3);
        assert!(!page.status.all_mounted);
        assert!(!page.status.all_clients_mounted);
        assert!(page.status.metadata_server_mounted);
        assert!(page.alerts.is_empty());
        assert_eq!(page.client_state.all_client_mount, CLIENTS_NOT_UNMOUNTED);

        let row = &page.table.rows()[2];
        assert_eq!(row.text(SharedMemberField::HostName), Some("cl2"));
        assert_eq!(row.text(SharedMemberField::Role), Some("Client"));
        assert_eq!(row.text(SharedMemberField::MountState), Some("unmounted"));
        assert_eq!(row.flag(SharedMemberField::Mounted), Some(false));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_reachable_rows() {
        let mgr = MemoryManager::new();
        mgr.add_shared_fs(
            "fs1",
            "/qfs/fs1",
            &[
                ("srv1", MemberRole::MetadataServer, true),
                ("cl1", MemberRole::Client, true),
                ("cl2", MemberRole::Client, true),
                ("cl3", MemberRole::Client, true),
                ("cl4", MemberRole::Client, true),
            ],
        )
        .await;
        mgr.set_reachable("cl2", false).await;
        mgr.set_reachable("cl4", false).await;

        let snapshot = fetch_members(&mgr, "srv1", "fs1").await.unwrap();
        assert_eq!(snapshot.members.len(), 3);
        let message = snapshot.partial_error.unwrap();
        assert!(message.contains("cl2: "));
        assert!(message.contains("cl4: "));

        let page = build_shared_fs_page(&mgr, Role::Viewer, "srv1", "fs1").await;
        assert_eq!(page.table.len(), 3);
        assert_eq!(page.alerts.len(), 1);
        assert_eq!(page.alerts[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_query_failed_renders_empty_table() {
        let mgr = srv1_fs1().await;
        mgr.set_reachable("srv1", false).await;

        assert!(matches!(
            fetch_members(&mgr, "srv1", "fs1").await,
            Err(ConsoleError::QueryFailed(_))
        ));

        let page = build_shared_fs_page(&mgr, Role::Admin, "srv1", "fs1").await;
        assert!(page.table.is_empty());
        assert!(page.row_actions.is_empty());
        assert_eq!(page.alerts[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_empty_names_are_malformed() {
        let mgr = srv1_fs1().await;
        assert!(matches!(
            fetch_members(&mgr, "", "fs1").await,
            Err(ConsoleError::MalformedInput(_))
        ));
        assert!(matches!(
            fetch_members(&mgr, "srv1", "  ").await,
            Err(ConsoleError::MalformedInput(_))
        ));
    }
}
