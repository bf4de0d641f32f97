use serde::Serialize;

use qfs_common::HostFailure;

pub const PARTIAL_FAILURE_SUMMARY: &str = "Shared file system operation partially failed";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Banner shown above a page's table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Alert {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Alert {
    pub fn info(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Summary line followed by one `host: reason` line per failed host.
pub fn multi_host_message(summary: &str, failures: &[HostFailure]) -> String {
    let mut msg = summary.to_string();
    for f in failures {
        msg.push('\n');
        msg.push_str(&f.host);
        msg.push_str(": ");
        msg.push_str(&f.message);
    }
    msg
}
