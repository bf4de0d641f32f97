pub mod filesystem;
pub mod member;

pub use filesystem::{FileSystemInfo, MountState};
pub use member::{HostFailure, Member, MemberRole};

pub mod auth;
pub mod telemetry;
