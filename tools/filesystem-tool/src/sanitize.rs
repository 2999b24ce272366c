//! Path sanitising for user-supplied file paths

use std::path::{Path, PathBuf};

/// Strip `../` traversal sequences from a user-supplied path
///
/// The removal is a single left-to-right pass, so `....//` collapses to `../`
/// rather than to nothing.
pub fn safe_path(path: &str) -> PathBuf {
    PathBuf::from(path.replace("../", ""))
}

/// Display form of a sanitised path, used in replies
pub fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_traversal() {
        assert_eq!(safe_path("/tmp/../etc/passwd"), PathBuf::from("/tmp/etc/passwd"));
        assert_eq!(safe_path("../../secret"), PathBuf::from("secret"));
    }

    #[test]
    fn test_leaves_clean_paths_alone() {
        assert_eq!(safe_path("/home/user/a.rs"), PathBuf::from("/home/user/a.rs"));
        assert_eq!(safe_path("./src/main.rs"), PathBuf::from("./src/main.rs"));
    }

    #[test]
    fn test_single_pass() {
        assert_eq!(safe_path("....//x"), PathBuf::from("../x"));
    }
}
