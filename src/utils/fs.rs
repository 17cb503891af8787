use crate::error::{QdataError, Result};
use std::path::{Path, PathBuf};

fn map_permission(path: &Path, e: std::io::Error) -> QdataError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => QdataError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => QdataError::from(e),
    }
}

pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| map_permission(path, e))?;
    }
    Ok(())
}

pub fn remove_dir_recursive(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| map_permission(path, e))?;
    }
    Ok(())
}

pub fn remove_file(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| map_permission(path, e))?;
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(std::path::Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or(QdataError::HomeDirectoryNotFound)?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}

pub fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Recursively check whether any file below `dir` satisfies `pred`.
pub fn any_file_matches<F>(dir: &Path, pred: &F) -> Result<bool>
where
    F: Fn(&str) -> bool,
{
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            if any_file_matches(&path, pred)? {
                return Ok(true);
            }
        } else if path.file_name().and_then(|n| n.to_str()).is_some_and(pred) {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        let path = Path::new("/var/data/cn_data");
        assert_eq!(expand_home(path).unwrap(), PathBuf::from("/var/data/cn_data"));

        let relative = Path::new("data/~cn");
        assert_eq!(expand_home(relative).unwrap(), PathBuf::from("data/~cn"));
    }

    #[test]
    fn test_expand_home_replaces_tilde() {
        let expanded = expand_home(Path::new("~/.qlib/qlib_data")).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join(".qlib/qlib_data"));
    }

    #[test]
    fn test_any_file_matches_recurses() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("sh600000");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("close.day.bin"), b"").unwrap();

        assert!(any_file_matches(tmp.path(), &|n: &str| n.ends_with(".day.bin")).unwrap());
        assert!(!any_file_matches(tmp.path(), &|n: &str| n.ends_with(".1min.bin")).unwrap());
    }

    #[test]
    fn test_is_non_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(!is_non_empty_dir(tmp.path()));
        assert!(!is_non_empty_dir(&tmp.path().join("missing")));

        std::fs::write(tmp.path().join("a.txt"), b"x").unwrap();
        assert!(is_non_empty_dir(tmp.path()));
    }
}
