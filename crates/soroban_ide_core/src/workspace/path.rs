//! Path helpers for the slash-delimited workspace addressing scheme.
//!
//! A node's path is the `/`-joined sequence of its ancestors' names followed
//! by its own name. Root nodes have a path equal to their name.

use crate::error::{IdeError, Result};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Join a parent path and a child name. An empty parent denotes the root level.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// Final segment of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Everything before the final segment, or `""` for a root path.
pub fn parent(path: &str) -> &str {
    path.rsplit_once(SEPARATOR).map(|(p, _)| p).unwrap_or("")
}

/// True if `path` is `ancestor` itself or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor || is_descendant(path, ancestor)
}

/// True if `path` lies strictly beneath `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// Replace the `old_prefix` of `path` with `new_prefix`.
///
/// `path` must be within `old_prefix` (see [`is_within`]).
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    format!("{new_prefix}{}", &path[old_prefix.len()..])
}

/// Validate a single path segment.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATOR) {
        return Err(IdeError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_root_and_nested() {
        assert_eq!(join("", "hello_world"), "hello_world");
        assert_eq!(join("hello_world/src", "lib.rs"), "hello_world/src/lib.rs");
    }

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(parent("hello_world/src/lib.rs"), "hello_world/src");
        assert_eq!(parent("hello_world"), "");
        assert_eq!(file_name("hello_world/src/lib.rs"), "lib.rs");
        assert_eq!(file_name("hello_world"), "hello_world");
    }

    #[test]
    fn test_descendant_requires_separator_boundary() {
        assert!(is_descendant("hello_world/src/lib.rs", "hello_world/src"));
        assert!(!is_descendant("hello_world/src2", "hello_world/src"));
        assert!(!is_descendant("hello_world/src", "hello_world/src"));
        assert!(is_within("hello_world/src", "hello_world/src"));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(
            rebase("hello_world/src/lib.rs", "hello_world/src", "hello_world/source"),
            "hello_world/source/lib.rs"
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("lib.rs").is_ok());
        for bad in ["", ".", "..", "a/b"] {
            assert!(matches!(validate_name(bad), Err(IdeError::InvalidName(_))));
        }
    }
}
