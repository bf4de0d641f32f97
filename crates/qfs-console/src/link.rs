//! Decoding of values that arrive encoded in form posts and link payloads.
//!
//! Malformed tokens never fail a request; they decode to "nothing".

use crate::actions::SharedFsAction;

const FS_INFO_SEPARATOR: &str = "###";

/// Decode an action drop-down option. `"0"` is the "select an action"
/// placeholder and decodes to `None` silently.
pub fn decode_action(token: &str) -> Option<SharedFsAction> {
    let option = match token.trim().parse::<u32>() {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(token, error=%e, "unparsable action option, ignoring");
            return None;
        }
    };
    if option == 0 {
        return None;
    }

    let canonical = option.to_string();
    let action = SharedFsAction::ALL
        .into_iter()
        .find(|a| a.token() == Some(canonical.as_str()));
    if action.is_none() {
        tracing::warn!(option, "unknown action option, ignoring");
    }
    action
}

/// `name###mount_point` as embedded in file browser links.
pub fn encode_fs_info(fs_name: &str, mount_point: &str) -> String {
    format!("{fs_name}{FS_INFO_SEPARATOR}{mount_point}")
}

/// Inverse of [`encode_fs_info`]; anything else decodes to `None`.
pub fn decode_fs_info(token: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = token.split(FS_INFO_SEPARATOR).collect();
    match parts.as_slice() {
        [name, mount_point] if !name.is_empty() => {
            Some((name.to_string(), mount_point.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_action() {
        assert_eq!(decode_action("2"), Some(SharedFsAction::Mount));
        assert_eq!(decode_action(" 3 "), Some(SharedFsAction::Unmount));
        assert_eq!(decode_action("0"), None);
        assert_eq!(decode_action("9"), None);
        assert_eq!(decode_action("mount"), None);
        assert_eq!(decode_action(""), None);
    }

    #[test]
    fn test_action_tokens_decode_to_themselves() {
        for action in SharedFsAction::ALL {
            if let Some(token) = action.token() {
                assert_eq!(decode_action(token), Some(action));
            }
        }
    }

    #[test]
    fn test_fs_info() {
        let token = encode_fs_info("samfs1", "/sam/samfs1");
        assert_eq!(
            decode_fs_info(&token),
            Some(("samfs1".to_string(), "/sam/samfs1".to_string()))
        );
        assert_eq!(decode_fs_info("samfs1"), None);
        assert_eq!(decode_fs_info("a###b###c"), None);
        assert_eq!(decode_fs_info("###/mnt"), None);
    }
}
