//! Local filesystem access root enforcement.

use scout_errors::ScoutError;
use std::path::{Path, PathBuf};

/// Resolve `path` to an absolute canonical form and, if `root` is set,
/// reject anything that canonicalizes outside it.
///
/// Canonicalizing (rather than lexically joining) is what stops a
/// `root/../../etc/passwd`-style escape: symlinks and `..` components are
/// resolved by the filesystem, not by string inspection.
pub fn enforce_local_access_root(path: &Path, root: Option<&Path>) -> Result<PathBuf, ScoutError> {
    let canonical =
        path.canonicalize().map_err(|e| ScoutError::FileNotFound(format!("{}: {e}", path.display())))?;

    if let Some(root) = root {
        let canonical_root = root
            .canonicalize()
            .map_err(|e| ScoutError::FileNotFound(format!("local_file_access_root {}: {e}", root.display())))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(ScoutError::PermissionDenied(format!(
                "{} is outside the configured local file access root {}",
                canonical.display(),
                canonical_root.display()
            )));
        }
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn allows_path_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hi").unwrap();

        let resolved = enforce_local_access_root(&file, Some(dir.path())).unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn rejects_path_outside_root_via_parent_traversal() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let file = outside.path().join("b.txt");
        fs::write(&file, b"hi").unwrap();

        let err = enforce_local_access_root(&file, Some(root.path())).unwrap_err();
        assert!(matches!(err, ScoutError::PermissionDenied(_)));
    }

    #[test]
    fn no_root_configured_allows_anything_that_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.txt");
        fs::write(&file, b"hi").unwrap();
        assert!(enforce_local_access_root(&file, None).is_ok());
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = enforce_local_access_root(&missing, None).unwrap_err();
        assert!(matches!(err, ScoutError::FileNotFound(_)));
    }
}
