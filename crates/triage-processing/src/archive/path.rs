//! Archive member name validation.
//!
//! Member names come straight from attacker-controlled headers. A name is
//! accepted only if it stays below the extraction root once normalized;
//! anything else is rejected outright rather than clamped.

use triage_core::ScanError;

/// Normalize a member name into a relative display path, or reject it.
///
/// Rejected: NUL bytes, absolute paths, drive or UNC prefixes, and any `..`
/// component. Backslashes count as separators; `.` and empty components are
/// dropped.
pub fn validate_member_name(raw: &str) -> Result<String, ScanError> {
    let reject = |reason: &str| ScanError::PathTraversal(format!("{} ({:?})", reason, raw));

    if raw.contains('\0') {
        return Err(reject("NUL byte in member name"));
    }

    let unified = raw.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(reject("absolute member path"));
    }
    if has_drive_prefix(&unified) {
        return Err(reject("drive prefix in member path"));
    }

    let mut components = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(reject("parent directory component")),
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Err(reject("empty member path"));
    }
    Ok(components.join("/"))
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_relative_names() {
        assert_eq!(validate_member_name("photos/cat.png").unwrap(), "photos/cat.png");
        assert_eq!(validate_member_name("./a//b/./c.jpg").unwrap(), "a/b/c.jpg");
        assert_eq!(validate_member_name("dir\\clip.mp4").unwrap(), "dir/clip.mp4");
        assert_eq!(validate_member_name("..hidden.png").unwrap(), "..hidden.png");
    }

    #[test]
    fn rejects_traversal() {
        assert!(validate_member_name("../../etc/passwd").is_err());
        assert!(validate_member_name("a/../../b.png").is_err());
        assert!(validate_member_name("a\\..\\..\\b.png").is_err());
        // Even traversal that would land back inside the root is refused.
        assert!(validate_member_name("a/../b.png").is_err());
    }

    #[test]
    fn rejects_absolute_and_drive_paths() {
        assert!(validate_member_name("/etc/passwd").is_err());
        assert!(validate_member_name("\\\\server\\share\\x.png").is_err());
        assert!(validate_member_name("C:/Windows/x.png").is_err());
        assert!(validate_member_name("c:x.png").is_err());
    }

    #[test]
    fn rejects_nul_and_empty() {
        assert!(validate_member_name("ok.png\0.exe").is_err());
        assert!(validate_member_name("./").is_err());
        assert!(validate_member_name("").is_err());
    }
}
