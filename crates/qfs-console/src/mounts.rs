use std::cmp::Ordering;

use serde::Serialize;

use qfs_common::{FileSystemInfo, MountState};
use qfs_mgmt::SharedFsManager;

use crate::alert::Alert;
use crate::link::decode_fs_info;
use crate::table::{Row, TableModel, TiledRecord};

/// A file system paired with the directory it mounts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub fs_name: String,
    pub mount_point: String,
}

impl MountPoint {
    pub fn new(fs_name: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            fs_name: fs_name.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// Order mount points by path length only. Equal lengths compare equal
/// even when the paths differ.
///
/// Length is counted in UTF-16 code units, as the management daemons and
/// existing console clients count it.
pub fn compare_mount_points(a: &str, b: &str) -> Ordering {
    a.encode_utf16().count().cmp(&b.encode_utf16().count())
}

/// Find the file system whose mount point is the longest prefix of `path`.
///
/// File systems without a mount point are skipped. Among mount points of
/// equal length the one listed last wins.
pub fn resolve_browse_path(file_systems: &[FileSystemInfo], path: &str) -> Option<MountPoint> {
    let mut mounts: Vec<MountPoint> = file_systems
        .iter()
        .filter(|fs| !fs.mount_point.is_empty())
        .map(|fs| MountPoint::new(fs.name.as_str(), fs.mount_point.as_str()))
        .collect();

    mounts.sort_by(|a, b| compare_mount_points(&a.mount_point, &b.mount_point));

    mounts
        .into_iter()
        .rev()
        .find(|mp| path.starts_with(&mp.mount_point))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSystemField {
    Name,
    MountPoint,
    Shared,
    MountState,
    Mounted,
}

impl TiledRecord for FileSystemInfo {
    type Field = FileSystemField;

    fn project(&self, row: &mut Row<FileSystemField>) {
        row.set(FileSystemField::Name, self.name.as_str());
        row.set(FileSystemField::MountPoint, self.mount_point.as_str());
        row.set(FileSystemField::Shared, self.shared);
        row.set(FileSystemField::MountState, self.state.label());
        row.set(FileSystemField::Mounted, self.state == MountState::Mounted);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSystemSummary {
    pub host: String,
    pub table: TableModel<FileSystemField>,
    pub alerts: Vec<Alert>,
}

/// File system summary table for one host, sorted by name.
pub async fn build_file_system_summary(
    manager: &dyn SharedFsManager,
    host: &str,
) -> FileSystemSummary {
    let mut table = TableModel::new(format!("File Systems on {host}"));
    let mut alerts = Vec::new();

    match manager.file_systems(host).await {
        Ok(mut file_systems) => {
            file_systems.sort_by(|a, b| a.name.cmp(&b.name));
            table.populate_rows(&file_systems);
        }
        Err(e) => {
            tracing::error!(host, error=%e, "failed to list file systems");
            alerts.push(Alert::error("Failed to populate file system summary", e.to_string()));
        }
    }

    FileSystemSummary {
        host: host.to_string(),
        table,
        alerts,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    pub host: String,
    pub path: String,
    pub file_system: Option<MountPoint>,
    pub mounted: bool,
    pub alerts: Vec<Alert>,
}

/// Work out which file system `path` belongs to on `host`.
///
/// When no mounted file system owns the path, the `fs_info` link token
/// (if well formed) names the file system the user came from.
pub async fn browse(
    manager: &dyn SharedFsManager,
    host: &str,
    path: &str,
    fs_info: Option<&str>,
) -> BrowsePage {
    let mut page = BrowsePage {
        host: host.to_string(),
        path: path.to_string(),
        file_system: None,
        mounted: false,
        alerts: Vec::new(),
    };

    let file_systems = match manager.file_systems(host).await {
        Ok(fs) => fs,
        Err(e) => {
            tracing::error!(host, error=%e, "failed to list file systems");
            page.alerts.push(Alert::error("Failed to browse file system", e.to_string()));
            return page;
        }
    };

    page.file_system = resolve_browse_path(&file_systems, path)
        .or_else(|| fs_info.and_then(decode_fs_info).map(|(name, mp)| MountPoint::new(name, mp)));

    if let Some(mp) = &page.file_system {
        page.mounted = file_systems
            .iter()
            .any(|fs| fs.name == mp.fs_name && fs.state == MountState::Mounted);
        if !page.mounted {
            page.alerts.push(Alert::info(
                "File system not mounted",
                format!("File system {} is not mounted", mp.fs_name),
            ));
        }
    }

    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfs_common::MemberRole;
    use qfs_mgmt::MemoryManager;

    fn make_fs(name: &str, mount_point: &str, mounted: bool) -> FileSystemInfo {
        FileSystemInfo {
            name: name.to_string(),
            mount_point: mount_point.to_string(),
            shared: false,
            state: MountState::from_mounted(mounted),
        }
    }

    #[test]
    fn test_shorter_mount_point_sorts_first() {
        assert_eq!(compare_mount_points("/export/fs1", "/export/fs10"), Ordering::Less);
        assert_eq!(compare_mount_points("/export/fs1", "/export/fs10") as i32, -1);
        assert_eq!(compare_mount_points("/zzz", "/aaaaa"), Ordering::Less);
    }

    #[test]
    fn test_equal_length_is_tie() {
        assert_eq!(compare_mount_points("/a/b/c", "/abcde"), Ordering::Equal);
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // One supplementary-plane character is two UTF-16 units.
        assert_eq!(compare_mount_points("/\u{1F4C1}", "/ab"), Ordering::Equal);
        assert_eq!(compare_mount_points("/\u{e9}", "/ab"), Ordering::Less);
    }

    #[test]
    fn test_resolve_longest_prefix() {
        let fs = vec![
            make_fs("root", "/sam", true),
            make_fs("nested", "/sam/fs1", true),
            make_fs("other", "/other", true),
        ];
        let mp = resolve_browse_path(&fs, "/sam/fs1/dir/file").unwrap();
        assert_eq!(mp.fs_name, "nested");
        assert_eq!(resolve_browse_path(&fs, "/sam/x").unwrap().fs_name, "root");
        assert!(resolve_browse_path(&fs, "/tmp").is_none());
    }

    #[test]
    fn test_resolve_skips_empty_mount_points() {
        let fs = vec![make_fs("broken", "", true), make_fs("good", "/qfs", true)];
        assert_eq!(resolve_browse_path(&fs, "/qfs/a").unwrap().fs_name, "good");
    }

    #[tokio::test]
    async fn test_summary_sorted_by_name() {
        let mgr = MemoryManager::new();
        mgr.add_file_system("srv1", make_fs("zfs", "/z", true), MemberRole::NotShared).await;
        mgr.add_file_system("srv1", make_fs("afs", "/a", false), MemberRole::NotShared).await;

        let summary = build_file_system_summary(&mgr, "srv1").await;
        assert!(summary.alerts.is_empty());
        assert_eq!(summary.table.rows()[0].text(FileSystemField::Name), Some("afs"));
        assert_eq!(summary.table.rows()[0].flag(FileSystemField::Mounted), Some(false));
    }

    #[tokio::test]
    async fn test_summary_error_becomes_alert() {
        let mgr = MemoryManager::new();
        let summary = build_file_system_summary(&mgr, "ghost").await;
        assert!(summary.table.is_empty());
        assert_eq!(summary.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_browse_falls_back_to_fs_info() {
        let mgr = MemoryManager::new();
        mgr.add_file_system("srv1", make_fs("qfs1", "/qfs1", false), MemberRole::NotShared).await;

        let page = browse(&mgr, "srv1", "/qfs1/data", None).await;
        assert_eq!(page.file_system.as_ref().map(|m| m.fs_name.as_str()), Some("qfs1"));
        assert!(!page.mounted);
        assert_eq!(page.alerts.len(), 1);

        let page = browse(&mgr, "srv1", "/elsewhere", Some("qfs2###/qfs2")).await;
        assert_eq!(page.file_system, Some(MountPoint::new("qfs2", "/qfs2")));

        let page = browse(&mgr, "srv1", "/elsewhere", Some("garbage")).await;
        assert!(page.file_system.is_none());
        assert!(page.alerts.is_empty());
    }
}
