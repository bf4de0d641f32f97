use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;

use qfs_common::{FileSystemInfo, HostFailure, Member, MemberRole, MountState};

use crate::error::MgmtError;
use crate::types::{QueryOutcome, SharedFsManager};

/// In-process management backend.
///
/// Holds a small model of hosts and their file systems. Used by tests and
/// by the console's demo mode when no management daemon is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryManager {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    hosts: BTreeMap<String, HostState>,
}

#[derive(Debug)]
struct HostState {
    reachable: bool,
    hostname: String,
    file_systems: BTreeMap<String, HostFs>,
}

impl HostState {
    fn new(name: &str) -> Self {
        // Management hosts are usually addressed by FQDN; uname reports the short name.
        let hostname = name.split('.').next().unwrap_or(name).to_string();
        Self {
            reachable: true,
            hostname,
            file_systems: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct HostFs {
    info: FileSystemInfo,
    role: MemberRole,
    /// Shared hosts table; only populated on (potential) metadata servers.
    shared_hosts: Vec<String>,
    /// Mount calls succeed but leave the file system unmounted.
    sticky_unmounted: bool,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_host(&self, host: &str) {
        let mut inner = self.inner.write().await;
        inner
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| HostState::new(host));
    }

    pub async fn set_reachable(&self, host: &str, reachable: bool) {
        let mut inner = self.inner.write().await;
        inner
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| HostState::new(host))
            .reachable = reachable;
    }

    pub async fn add_file_system(&self, host: &str, info: FileSystemInfo, role: MemberRole) {
        let mut inner = self.inner.write().await;
        let state = inner
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| HostState::new(host));
        state.file_systems.insert(
            info.name.clone(),
            HostFs {
                info,
                role,
                shared_hosts: Vec::new(),
                sticky_unmounted: false,
            },
        );
    }

    /// Drop `fs_name` from a host without touching any shared hosts table.
    pub async fn remove_file_system(&self, host: &str, fs_name: &str) {
        let mut inner = self.inner.write().await;
        if let Some(state) = inner.hosts.get_mut(host) {
            state.file_systems.remove(fs_name);
        }
    }

    pub async fn set_mount_sticky(&self, host: &str, fs_name: &str) {
        let mut inner = self.inner.write().await;
        if let Some(fs) = inner
            .hosts
            .get_mut(host)
            .and_then(|h| h.file_systems.get_mut(fs_name))
        {
            fs.sticky_unmounted = true;
        }
    }

    /// Create a shared file system across `members`.
    ///
    /// The shared hosts table is stored on every metadata server and
    /// potential metadata server listed (the first host when none is), in
    /// the order given.
    pub async fn add_shared_fs(
        &self,
        fs_name: &str,
        mount_point: &str,
        members: &[(&str, MemberRole, bool)],
    ) {
        for (host, role, mounted) in members {
            self.add_file_system(
                host,
                FileSystemInfo {
                    name: fs_name.to_string(),
                    mount_point: mount_point.to_string(),
                    shared: true,
                    state: MountState::from_mounted(*mounted),
                },
                *role,
            )
            .await;
        }

        let table: Vec<String> = members.iter().map(|(h, _, _)| h.to_string()).collect();
        let mut owners: Vec<&str> = members
            .iter()
            .filter(|(_, role, _)| {
                matches!(role, MemberRole::MetadataServer | MemberRole::PotentialMetadataServer)
            })
            .map(|(h, _, _)| *h)
            .collect();
        if owners.is_empty() {
            owners.extend(members.first().map(|(h, _, _)| *h));
        }

        let mut inner = self.inner.write().await;
        for owner in owners {
            if let Some(fs) = inner
                .hosts
                .get_mut(owner)
                .and_then(|h| h.file_systems.get_mut(fs_name))
            {
                fs.shared_hosts = table.clone();
            }
        }
    }

    fn reachable_host<'a>(inner: &'a Inner, host: &str) -> Result<&'a HostState, MgmtError> {
        match inner.hosts.get(host) {
            Some(state) if state.reachable => Ok(state),
            Some(_) => Err(MgmtError::unreachable(host, "connection timed out")),
            None => Err(MgmtError::unreachable(host, "unknown host")),
        }
    }

    async fn set_state(
        &self,
        host: &str,
        fs_name: &str,
        target: MountState,
    ) -> Result<(), MgmtError> {
        let mut inner = self.inner.write().await;
        let state = inner
            .hosts
            .get_mut(host)
            .filter(|s| s.reachable)
            .ok_or_else(|| MgmtError::unreachable(host, "connection timed out"))?;
        let fs = state
            .file_systems
            .get_mut(fs_name)
            .ok_or_else(|| MgmtError::not_found(host, format!("file system {fs_name}")))?;

        if target == MountState::Mounted {
            if fs.info.mount_point.is_empty() {
                return Err(MgmtError::Rejected(format!(
                    "no mount point configured for {fs_name} on {host}"
                )));
            }
            if fs.sticky_unmounted {
                return Ok(());
            }
        }
        fs.info.state = target;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SharedFsManager for MemoryManager {
    async fn shared_members(&self, coordinator: &str, fs_name: &str) -> QueryOutcome<Vec<Member>> {
        let inner = self.inner.read().await;

        let coord = match Self::reachable_host(&inner, coordinator) {
            Ok(c) => c,
            Err(e) => return QueryOutcome::Failed(e),
        };
        let Some(table) = coord.file_systems.get(fs_name).map(|fs| &fs.shared_hosts) else {
            return QueryOutcome::Failed(MgmtError::not_found(
                coordinator,
                format!("shared hosts table for {fs_name}"),
            ));
        };

        let mut members = Vec::with_capacity(table.len());
        let mut failures = Vec::new();

        for host in table {
            let state = match Self::reachable_host(&inner, host) {
                Ok(s) => s,
                Err(e) => {
                    failures.push(HostFailure::new(host.as_str(), e.to_string()));
                    continue;
                }
            };
            match state.file_systems.get(fs_name) {
                Some(fs) => members.push(Member::new(
                    host.as_str(),
                    fs.role,
                    fs.info.state == MountState::Mounted,
                )),
                None => {
                    // Still listed so the host can be removed from the table.
                    members.push(Member::new(host.as_str(), MemberRole::NotShared, false));
                    let e = MgmtError::not_found(host.as_str(), format!("file system {fs_name}"));
                    failures.push(HostFailure::new(host.as_str(), e.to_string()));
                }
            }
        }

        QueryOutcome::from_parts(members, failures)
    }

    async fn file_systems(&self, host: &str) -> Result<Vec<FileSystemInfo>, MgmtError> {
        let inner = self.inner.read().await;
        let state = Self::reachable_host(&inner, host)?;
        Ok(state.file_systems.values().map(|fs| fs.info.clone()).collect())
    }

    async fn mount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError> {
        self.set_state(host, fs_name, MountState::Mounted).await
    }

    async fn unmount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError> {
        self.set_state(host, fs_name, MountState::Unmounted).await
    }

    async fn server_hostname(&self, host: &str) -> Result<String, MgmtError> {
        let inner = self.inner.read().await;
        Ok(Self::reachable_host(&inner, host)?.hostname.clone())
    }

    async fn remove_member(
        &self,
        coordinator: &str,
        fs_name: &str,
        host: &str,
    ) -> QueryOutcome<()> {
        let mut inner = self.inner.write().await;

        let table = match Self::reachable_host(&inner, coordinator) {
            Ok(c) => c.file_systems.get(fs_name).map(|fs| fs.shared_hosts.clone()),
            Err(e) => return QueryOutcome::Failed(e),
        };
        let Some(table) = table else {
            return QueryOutcome::Failed(MgmtError::not_found(
                coordinator,
                format!("shared hosts table for {fs_name}"),
            ));
        };
        if !table.iter().any(|h| h == host) {
            return QueryOutcome::Failed(MgmtError::not_found(
                coordinator,
                format!("member {host} of {fs_name}"),
            ));
        }

        let whole_fs = inner
            .hosts
            .get(host)
            .and_then(|s| s.file_systems.get(fs_name))
            .is_some_and(|fs| fs.role.is_metadata_server());
        let targets = if whole_fs { table } else { vec![host.to_string()] };

        let mut failures = Vec::new();
        for target in &targets {
            match inner.hosts.get_mut(target) {
                Some(state) if state.reachable => {
                    state.file_systems.remove(fs_name);
                }
                Some(_) => {
                    let e = MgmtError::unreachable(target.as_str(), "connection timed out");
                    failures.push(HostFailure::new(target.as_str(), e.to_string()));
                }
                None => {
                    let e = MgmtError::unreachable(target.as_str(), "unknown host");
                    failures.push(HostFailure::new(target.as_str(), e.to_string()));
                }
            }
        }

        if !whole_fs {
            for state in inner.hosts.values_mut() {
                if let Some(fs) = state.file_systems.get_mut(fs_name) {
                    fs.shared_hosts.retain(|h| h != host);
                }
            }
        }

        tracing::info!(coordinator, fs = fs_name, host, whole_fs, "removed shared member");
        QueryOutcome::from_parts((), failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn five_host_fs() -> MemoryManager {
        let mgr = MemoryManager::new();
        mgr.add_shared_fs(
            "fs1",
            "/qfs/fs1",
            &[
                ("srv1", MemberRole::MetadataServer, true),
                ("srv2", MemberRole::PotentialMetadataServer, true),
                ("cl1", MemberRole::Client, true),
                ("cl2", MemberRole::Client, false),
                ("cl3", MemberRole::Client, true),
            ],
        )
        .await;
        mgr
    }

    #[tokio::test]
    async fn test_complete_members_in_table_order() {
        let mgr = five_host_fs().await;
        let outcome = mgr.shared_members("srv1", "fs1").await;
        assert!(outcome.is_complete());
        let hosts: Vec<_> = outcome
            .data()
            .unwrap()
            .iter()
            .map(|m| m.host_name.as_str())
            .collect();
        assert_eq!(hosts, ["srv1", "srv2", "cl1", "cl2", "cl3"]);
    }

    #[tokio::test]
    async fn test_unreachable_members_are_partial() {
        let mgr = five_host_fs().await;
        mgr.set_reachable("cl1", false).await;
        mgr.set_reachable("cl3", false).await;

        let outcome = mgr.shared_members("srv1", "fs1").await;
        assert_eq!(outcome.data().map(Vec::len), Some(3));
        let failed: Vec<_> = outcome.failures().iter().map(|f| f.host.as_str()).collect();
        assert_eq!(failed, ["cl1", "cl3"]);
    }

    #[tokio::test]
    async fn test_unreachable_coordinator_fails() {
        let mgr = five_host_fs().await;
        mgr.set_reachable("srv1", false).await;
        assert!(matches!(
            mgr.shared_members("srv1", "fs1").await,
            QueryOutcome::Failed(MgmtError::HostUnreachable { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_fs_on_member_kept_as_not_shared() {
        let mgr = five_host_fs().await;
        mgr.remove_file_system("cl2", "fs1").await;

        let outcome = mgr.shared_members("srv1", "fs1").await;
        let members = outcome.data().unwrap();
        assert_eq!(members.len(), 5);
        assert_eq!(members[3].role, MemberRole::NotShared);
        assert_eq!(outcome.failures()[0].host, "cl2");
    }

    #[tokio::test]
    async fn test_mount_and_unmount() {
        let mgr = five_host_fs().await;
        mgr.mount("cl2", "fs1").await.unwrap();
        mgr.unmount("srv1", "fs1").await.unwrap();

        let members = mgr.shared_members("srv1", "fs1").await;
        let members = members.data().unwrap();
        assert!(!members[0].mounted);
        assert!(members[3].mounted);
    }

    #[tokio::test]
    async fn test_mount_without_mount_point_rejected() {
        let mgr = MemoryManager::new();
        mgr.add_file_system(
            "srv1",
            FileSystemInfo {
                name: "scratch".into(),
                mount_point: String::new(),
                shared: false,
                state: MountState::Unmounted,
            },
            MemberRole::NotShared,
        )
        .await;
        assert!(matches!(
            mgr.mount("srv1", "scratch").await,
            Err(MgmtError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_client_drops_table_entry() {
        let mgr = five_host_fs().await;
        assert!(mgr.remove_member("srv1", "fs1", "cl2").await.is_complete());

        let outcome = mgr.shared_members("srv1", "fs1").await;
        let hosts: Vec<_> = outcome
            .data()
            .unwrap()
            .iter()
            .map(|m| m.host_name.as_str())
            .collect();
        assert_eq!(hosts, ["srv1", "srv2", "cl1", "cl3"]);
        assert!(mgr.file_systems("cl2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unreachable_member_is_partial() {
        let mgr = five_host_fs().await;
        mgr.set_reachable("cl1", false).await;

        let outcome = mgr.remove_member("srv1", "fs1", "cl1").await;
        assert_eq!(outcome.failures()[0].host, "cl1");
        let members = mgr.shared_members("srv1", "fs1").await;
        assert_eq!(members.data().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_remove_metadata_server_deletes_everywhere() {
        let mgr = five_host_fs().await;
        assert!(mgr.remove_member("srv1", "fs1", "srv1").await.is_complete());
        for host in ["srv1", "srv2", "cl1", "cl2", "cl3"] {
            assert!(mgr.file_systems(host).await.unwrap().is_empty(), "{host}");
        }
        assert!(matches!(
            mgr.shared_members("srv1", "fs1").await,
            QueryOutcome::Failed(MgmtError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_non_member_not_found() {
        let mgr = five_host_fs().await;
        mgr.add_host("rogue").await;
        match mgr.remove_member("srv1", "fs1", "rogue").await {
            QueryOutcome::Failed(e) => assert!(e.is_not_found()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_hostname_is_short_name() {
        let mgr = MemoryManager::new();
        mgr.add_host("srv1.example.com").await;
        assert_eq!(mgr.server_hostname("srv1.example.com").await.unwrap(), "srv1");
        assert!(mgr.server_hostname("nope").await.is_err());
    }
}
