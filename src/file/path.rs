//! Mapping of request path fragments to paths under the storage root.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use super::fs::FsError;

/// The only escape sequence decoded from fragments.
pub const ENCODED_SPACE: &str = "%20";

/// Join `root` and `fragment` with a single separator.
///
/// `%20` in the fragment becomes a space; no other escape is decoded. The
/// root is taken verbatim. No validation happens here, see [`bounded`].
pub fn normalize(root: &Path, fragment: &str) -> PathBuf {
    let decoded = decode_spaces(fragment);
    let filtered = replace_special_chars(&decoded);

    let mut joined = OsString::from(root.as_os_str());
    joined.push("/");
    joined.push(filtered.as_ref());
    PathBuf::from(joined)
}

/// Resolve `fragment` under `root`, refusing anything that climbs above it.
///
/// The fragment is joined by [`normalize`], then the part below `root` is
/// applied lexically: `.` is dropped, `..` pops a segment, and leading
/// separators are ignored. Symlinks are not resolved.
pub fn bounded(root: &Path, fragment: &str) -> Result<PathBuf, FsError> {
    let outside = || FsError::OutsideRoot {
        fragment: fragment.to_string(),
    };

    let joined = normalize(root, fragment);
    let relative = joined.strip_prefix(root).map_err(|_| outside())?;
    bound_within(root, relative).ok_or_else(outside)
}

/// Apply `relative` lexically under `base`. `None` if it escapes `base`.
pub fn bound_within(base: &Path, relative: impl AsRef<Path>) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();
    let mut depth = 0usize;

    for component in relative.as_ref().components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                depth += 1;
            }
            Component::ParentDir => {
                depth = depth.checked_sub(1)?;
                resolved.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Some(resolved)
}

/// Replace every `%20` with a space.
pub fn decode_spaces(fragment: &str) -> Cow<'_, str> {
    if fragment.contains(ENCODED_SPACE) {
        Cow::Owned(fragment.replace(ENCODED_SPACE, " "))
    } else {
        Cow::Borrowed(fragment)
    }
}

/// Special character filter.
///
/// Meant to rewrite non-ASCII characters, but it has never changed its input
/// and clients rely on that; it returns the input untouched.
pub fn replace_special_chars(s: &str) -> Cow<'_, str> {
    Cow::Borrowed(s)
}

/// Render a relative path with `/` separators on every platform.
pub fn to_slash(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_joins_with_single_separator() {
        let path = normalize(Path::new("storage-root"), "docs/reports");
        assert_eq!(path, PathBuf::from("storage-root/docs/reports"));
    }

    #[test]
    fn test_normalize_empty_fragment() {
        let path = normalize(Path::new("storage-root"), "");
        assert_eq!(path, PathBuf::from("storage-root/"));
        assert_eq!(path.file_name().unwrap(), "storage-root");
    }

    #[test]
    fn test_normalize_decodes_only_spaces() {
        let path = normalize(Path::new("root"), "my%20docs/a%2Fb%20c");
        assert_eq!(path, PathBuf::from("root/my docs/a%2Fb c"));
    }

    #[test]
    fn test_decode_spaces_borrows_when_untouched() {
        assert!(matches!(decode_spaces("plain"), Cow::Borrowed("plain")));
        assert_eq!(decode_spaces("a%20b%20c"), "a b c");
    }

    #[test]
    fn test_replace_special_chars_is_identity() {
        assert_eq!(replace_special_chars("ascii"), "ascii");
        assert_eq!(replace_special_chars("ファイル-ü"), "ファイル-ü");
    }

    #[test]
    fn test_bounded_plain_fragment() {
        let path = bounded(Path::new("root"), "docs/report.pdf").unwrap();
        assert_eq!(path, Path::new("root").join("docs").join("report.pdf"));
    }

    #[test]
    fn test_bounded_empty_fragment_is_root() {
        assert_eq!(bounded(Path::new("root"), "").unwrap(), PathBuf::from("root"));
    }

    #[test]
    fn test_bounded_resolves_inner_parent_dirs() {
        let path = bounded(Path::new("root"), "a/./b/../c").unwrap();
        assert_eq!(path, Path::new("root").join("a").join("c"));
    }

    #[test]
    fn test_bounded_rejects_escape() {
        let result = bounded(Path::new("root"), "../etc/passwd");
        assert!(matches!(result, Err(FsError::OutsideRoot { .. })));

        let result = bounded(Path::new("root"), "a/../../b");
        assert!(matches!(result, Err(FsError::OutsideRoot { .. })));
    }

    #[test]
    fn test_bounded_ignores_leading_separator() {
        let path = bounded(Path::new("root"), "/etc").unwrap();
        assert_eq!(path, Path::new("root").join("etc"));
    }

    #[test]
    fn test_bounded_keeps_absolute_root() {
        let path = bounded(Path::new("/srv/storage-root"), "a/../b").unwrap();
        assert_eq!(path, PathBuf::from("/srv/storage-root/b"));

        let result = bounded(Path::new("/srv/storage-root"), "a/../../b");
        assert!(matches!(result, Err(FsError::OutsideRoot { .. })));
    }

    #[test]
    fn test_bounded_decodes_spaces() {
        let path = bounded(Path::new("root"), "My%20Files").unwrap();
        assert_eq!(path, Path::new("root").join("My Files"));
    }

    #[test]
    fn test_to_slash() {
        let relative = Path::new("a").join("b").join("c.txt");
        assert_eq!(to_slash(&relative), "a/b/c.txt");
        assert_eq!(to_slash(Path::new("")), "");
    }
}
