//! Presentation-side logic for the QFS administration console.
//!
//! Everything here is request-scoped: a page is rebuilt from a fresh
//! management query each time it is displayed and nothing is cached.

pub mod actions;
pub mod alert;
pub mod error;
pub mod link;
pub mod mounts;
pub mod shared;
pub mod table;

pub use actions::{perform_action, ActionReport, RowActions, SharedFsAction};
pub use alert::{Alert, Severity};
pub use error::ConsoleError;
pub use mounts::{
    compare_mount_points, resolve_browse_path, BrowsePage, FileSystemSummary, MountPoint,
};
pub use shared::{
    build_shared_fs_page, fetch_members, MemberSnapshot, SharedFsPage, SharedFsStatus,
};
pub use table::{FieldValue, Row, TableModel, TiledRecord};
