use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "qfsadm")]
#[command(about = "QFS shared file system administration", long_about = None)]
pub struct Args {
    /// Console URL
    #[arg(
        long,
        env = "QFS_CONSOLE_URL",
        default_value = "http://127.0.0.1:18090"
    )]
    pub console_url: String,

    /// Console API token (Authorization: Bearer)
    #[arg(long, env = "QFS_CONSOLE_TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shared file system membership and actions
    Shared {
        #[command(subcommand)]
        subcommand: SharedCommand,
    },
    /// File systems on a host
    Fs {
        #[command(subcommand)]
        subcommand: FsCommand,
    },
    /// Resolve which file system a path belongs to
    Browse {
        /// Host to query
        #[arg(long)]
        host: String,
        /// Absolute path on that host
        path: String,
        /// File system the path was reached from
        #[arg(long)]
        fs: Option<String>,
        /// Mount point of --fs
        #[arg(long, requires = "fs")]
        mount_point: Option<String>,
    },
    /// Show current auth identity
    Whoami,
}

#[derive(Debug, Subcommand)]
pub enum SharedCommand {
    /// Show members and mount status of a shared file system
    Status {
        /// Host used to query membership
        #[arg(long)]
        host: String,
        /// Shared file system name
        fs: String,
    },
    /// Mount the file system on a member host
    Mount {
        #[arg(long)]
        host: String,
        fs: String,
        /// Member host to mount on
        #[arg(long)]
        member: String,
    },
    /// Unmount the file system on a member host
    Unmount {
        #[arg(long)]
        host: String,
        fs: String,
        /// Member host to unmount on
        #[arg(long)]
        member: String,
    },
    /// Remove a member host; removing the metadata server deletes the file system
    Remove {
        #[arg(long)]
        host: String,
        fs: String,
        /// Member host to remove
        #[arg(long)]
        member: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum FsCommand {
    /// List file systems configured on a host
    List {
        #[arg(long)]
        host: String,
    },
}
