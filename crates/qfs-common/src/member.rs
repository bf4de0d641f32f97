use serde::{Deserialize, Serialize};

/// Role a host plays in a shared file system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    MetadataServer,
    PotentialMetadataServer,
    Client,
    /// Host is listed in the shared hosts table but does not report the
    /// file system as shared (e.g. it was never created there).
    NotShared,
}

impl MemberRole {
    pub fn is_metadata_server(self) -> bool {
        matches!(self, MemberRole::MetadataServer)
    }

    pub fn label(self) -> &'static str {
        match self {
            MemberRole::MetadataServer => "Metadata Server",
            MemberRole::PotentialMetadataServer => "Potential Metadata Server",
            MemberRole::Client => "Client",
            MemberRole::NotShared => "Not Shared",
        }
    }
}

/// One participant host of a shared file system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub host_name: String,
    pub role: MemberRole,
    pub mounted: bool,
}

impl Member {
    pub fn new(host_name: impl Into<String>, role: MemberRole, mounted: bool) -> Self {
        Self {
            host_name: host_name.into(),
            role,
            mounted,
        }
    }

    pub fn mount_label(&self) -> &'static str {
        if self.mounted {
            "mounted"
        } else {
            "unmounted"
        }
    }
}

/// A host that could not answer its part of a multi-host query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostFailure {
    pub host: String,
    pub message: String,
}

impl HostFailure {
    pub fn new(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let raw = serde_json::to_string(&MemberRole::PotentialMetadataServer).unwrap();
        assert_eq!(raw, "\"potential_metadata_server\"");
    }

    #[test]
    fn test_member_from_daemon_json() {
        let raw = r#"{"host_name":"cl1","role":"client","mounted":false,"ip":"10.0.0.7"}"#;
        let m: Member = serde_json::from_str(raw).unwrap();
        assert_eq!(m, Member::new("cl1", MemberRole::Client, false));
        assert_eq!(m.mount_label(), "unmounted");
    }
}
