//! On-disk session layout (§6): `<root>/<sessionId>/{metadata.json,messages.jsonl,images/}`.

use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "metadata.json";
pub const MESSAGES_FILE: &str = "messages.jsonl";
pub const IMAGES_DIR: &str = "images";

pub fn session_dir(root: &Path, session_id: &str) -> PathBuf {
    root.join(session_id)
}

pub fn metadata_path(root: &Path, session_id: &str) -> PathBuf {
    session_dir(root, session_id).join(METADATA_FILE)
}

pub fn messages_path(root: &Path, session_id: &str) -> PathBuf {
    session_dir(root, session_id).join(MESSAGES_FILE)
}

pub fn images_dir(root: &Path, session_id: &str) -> PathBuf {
    session_dir(root, session_id).join(IMAGES_DIR)
}

pub fn image_path(root: &Path, session_id: &str, file_name: &str) -> PathBuf {
    images_dir(root, session_id).join(file_name)
}

/// Strips any path component from a caller-supplied file name so a blob write can
/// never escape the session's `images/` directory (§4.1: "filename must be
/// sanitized by the caller" — the caller here is the store itself).
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let candidate = Path::new(name).file_name()?.to_str()?.to_string();
    if candidate.is_empty() || candidate == "." || candidate == ".." {
        return None;
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(sanitize_file_name("a/b/c.png"), Some("c.png".to_string()));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn sanitize_accepts_plain_name() {
        assert_eq!(sanitize_file_name("shot-0.png"), Some("shot-0.png".to_string()));
    }

    #[test]
    fn layout_paths() {
        let root = Path::new("/data/sessions");
        assert_eq!(
            metadata_path(root, "s1"),
            PathBuf::from("/data/sessions/s1/metadata.json")
        );
        assert_eq!(
            messages_path(root, "s1"),
            PathBuf::from("/data/sessions/s1/messages.jsonl")
        );
        assert_eq!(
            image_path(root, "s1", "shot.png"),
            PathBuf::from("/data/sessions/s1/images/shot.png")
        );
    }
}
