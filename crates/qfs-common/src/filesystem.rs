use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MountState {
    Mounted,
    Unmounted,
}

impl MountState {
    pub fn from_mounted(mounted: bool) -> Self {
        if mounted {
            MountState::Mounted
        } else {
            MountState::Unmounted
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MountState::Mounted => "mounted",
            MountState::Unmounted => "unmounted",
        }
    }
}

/// A file system as reported by a single host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSystemInfo {
    pub name: String,

    /// Empty when the host has no mount point configured for it.
    #[serde(default)]
    pub mount_point: String,

    #[serde(default)]
    pub shared: bool,

    pub state: MountState,
}
