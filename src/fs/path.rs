//! Share-relative path helpers.
//!
//! Paths on the wire use `\` separators and never start with one; the empty
//! string names the share root. Callers may use either separator.

/// Normalize a share-relative path to wire form.
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

/// Join a child name onto a share-relative directory path.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = normalize_path(dir);
    let name = normalize_path(name);
    if dir.is_empty() {
        name
    } else if name.is_empty() {
        dir
    } else {
        format!("{}\\{}", dir, name)
    }
}

/// Parent directory of a normalized path (`""` for top-level entries).
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('\\').map(|(parent, _)| parent).unwrap_or("")
}

/// Final component of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('\\').map(|(_, name)| name).unwrap_or(path)
}

/// Check if a directory entry name is `.` or `..`.
pub fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path("\\"), "");
        assert_eq!(normalize_path("foo"), "foo");
        assert_eq!(normalize_path("/foo/"), "foo");
        assert_eq!(normalize_path("foo//bar"), "foo\\bar");
        assert_eq!(normalize_path("administrator\\shared\\"), "administrator\\shared");
        assert_eq!(normalize_path("a/b\\c"), "a\\b\\c");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a.txt"), "a.txt");
        assert_eq!(join_path("shared", "a.txt"), "shared\\a.txt");
        assert_eq!(join_path("shared\\", "/sub/"), "shared\\sub");
        assert_eq!(join_path("shared", ""), "shared");
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_path("a\\b\\c.txt"), "a\\b");
        assert_eq!(parent_path("c.txt"), "");
        assert_eq!(file_name("a\\b\\c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
    }

    #[test]
    fn test_dot_entries() {
        assert!(is_dot_entry("."));
        assert!(is_dot_entry(".."));
        assert!(!is_dot_entry("..."));
        assert!(!is_dot_entry(".hidden"));
    }
}
