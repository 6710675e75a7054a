//! Folder tree materialization.
//!
//! [`build_tree`] walks a directory and inserts every descendant by its
//! relative path segments: find the child with the same name or append a new
//! one, then descend. Nodes live in an arena until the walk finishes and are
//! converted into a nested [`Entry`] afterwards.
//!
//! Because insertion only depends on path segments, the walk order does not
//! matter for correctness. It only decides the order of children, which is
//! first-seen order unless [`TreeOptions::sort_children`] is set.

use std::fs;
use std::io;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::fs::FsError;

/// A node of a folder tree, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Final path segment.
    pub name: String,
    /// Path relative to the scanned root, `/`-separated. Empty for the root.
    pub path: String,
    /// Whether this is a non-directory.
    pub is_file: bool,
    /// Children in walk order. Omitted from JSON when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Entry>,
}

#[cfg(test)]
impl Entry {
    /// Look up a descendant by its `/`-separated relative path.
    pub(crate) fn find(&self, relative: &str) -> Option<&Entry> {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| {
                node.children.iter().find(|child| child.name == segment)
            })
    }

    /// Number of nodes below this one.
    pub(crate) fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Options for [`build_tree`].
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Sort each directory's children by file name instead of keeping the
    /// order the OS lists them in.
    pub sort_children: bool,
}

const ROOT: usize = 0;

#[derive(Debug)]
struct Node {
    name: String,
    path: String,
    is_file: bool,
    children: Vec<usize>,
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn new(root_name: String) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name,
                path: String::new(),
                is_file: false,
                children: Vec::new(),
            }],
        }
    }

    fn child_named(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == name)
    }

    /// Insert-if-absent along `segments`, returning the final node.
    fn insert(&mut self, segments: &[String]) -> usize {
        let mut current = ROOT;
        let mut prefix = String::new();

        for segment in segments {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            current = match self.child_named(current, segment) {
                Some(existing) => existing,
                None => {
                    let index = self.nodes.len();
                    self.nodes.push(Node {
                        name: segment.clone(),
                        path: prefix.clone(),
                        is_file: false,
                        children: Vec::new(),
                    });
                    self.nodes[current].children.push(index);
                    index
                }
            };
        }

        current
    }

    fn into_entry(mut self) -> Entry {
        self.take(ROOT)
    }

    fn take(&mut self, index: usize) -> Entry {
        let node = &mut self.nodes[index];
        let name = std::mem::take(&mut node.name);
        let path = std::mem::take(&mut node.path);
        let is_file = node.is_file;
        let children = std::mem::take(&mut node.children);

        Entry {
            name,
            path,
            is_file,
            children: children.into_iter().map(|child| self.take(child)).collect(),
        }
    }
}

/// Build the folder tree rooted at `root`.
///
/// A missing root is `NotFound`. A root that is not a directory yields a
/// single file node without walking. Any error during the walk aborts the
/// build with `Io`; no partial tree is returned.
pub fn build_tree(root: &Path, options: &TreeOptions) -> Result<Entry, FsError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FsError::NotFound {
            path: root.to_path_buf(),
        },
        _ => FsError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.to_string_lossy().into_owned());

    if !metadata.is_dir() {
        return Ok(Entry {
            name: root_name,
            path: String::new(),
            is_file: true,
            children: Vec::new(),
        });
    }

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
    if options.sort_children {
        walker = walker.sort_by_file_name();
    }

    let mut arena = Arena::new(root_name);
    let mut visited = 0usize;

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;

        let segments = relative_segments(root, entry.path()).ok_or_else(|| FsError::Io {
            path: entry.path().to_path_buf(),
            source: io::Error::other("walked outside the scan root"),
        })?;
        if segments.is_empty() {
            continue;
        }

        let index = arena.insert(&segments);
        arena.nodes[index].is_file = !entry.file_type().is_dir();
        visited += 1;
    }

    tracing::debug!(root = %root.display(), entries = visited, "Built folder tree");

    Ok(arena.into_entry())
}

fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
    )
}

fn walk_error(root: &Path, err: walkdir::Error) -> FsError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    FsError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn sorted() -> TreeOptions {
        TreeOptions {
            sort_children: true,
        }
    }

    /// Layout:
    /// ```text
    /// docs/
    ///   2024/
    ///     q1.txt
    ///   readme.md
    /// empty/
    /// notes.txt
    /// ```
    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("docs").join("2024")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("docs").join("2024").join("q1.txt"), b"q1").unwrap();
        fs::write(root.join("docs").join("readme.md"), b"# docs").unwrap();
        fs::write(root.join("notes.txt"), b"notes").unwrap();
        dir
    }

    fn collect_paths(entry: &Entry, out: &mut BTreeSet<(String, bool)>) {
        for child in &entry.children {
            out.insert((child.path.clone(), child.is_file));
            collect_paths(child, out);
        }
    }

    #[test]
    fn test_build_tree_structure() {
        let dir = sample_tree();
        let tree = build_tree(dir.path(), &sorted()).unwrap();

        assert_eq!(tree.path, "");
        assert!(!tree.is_file);
        assert_eq!(
            tree.name,
            dir.path().file_name().unwrap().to_string_lossy()
        );

        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "empty", "notes.txt"]);

        let docs = tree.find("docs").unwrap();
        assert!(!docs.is_file);
        assert_eq!(docs.path, "docs");

        let q1 = tree.find("docs/2024/q1.txt").unwrap();
        assert!(q1.is_file);
        assert_eq!(q1.name, "q1.txt");
        assert_eq!(q1.path, "docs/2024/q1.txt");
        assert!(q1.children.is_empty());

        let empty = tree.find("empty").unwrap();
        assert!(!empty.is_file);
        assert!(empty.children.is_empty());
    }

    #[test]
    fn test_build_tree_visits_every_object_once() {
        let dir = sample_tree();
        let tree = build_tree(dir.path(), &TreeOptions::default()).unwrap();

        let mut expected = BTreeSet::new();
        for entry in WalkDir::new(dir.path()).min_depth(1) {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(dir.path()).unwrap();
            expected.insert((
                crate::file::path::to_slash(relative),
                !entry.file_type().is_dir(),
            ));
        }

        let mut actual = BTreeSet::new();
        collect_paths(&tree, &mut actual);

        assert_eq!(actual, expected);
        assert_eq!(tree.descendant_count(), expected.len());
    }

    #[test]
    fn test_build_tree_single_file() {
        let dir = sample_tree();
        let tree = build_tree(&dir.path().join("notes.txt"), &sorted()).unwrap();

        assert_eq!(tree.name, "notes.txt");
        assert_eq!(tree.path, "");
        assert!(tree.is_file);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_build_tree_empty_directory() {
        let dir = TempDir::new().unwrap();
        let tree = build_tree(dir.path(), &sorted()).unwrap();

        assert!(!tree.is_file);
        assert!(tree.children.is_empty());

        let json = serde_json::to_value(&tree).unwrap();
        assert!(json.get("children").is_none());
        assert_eq!(json["isFile"], false);
    }

    #[test]
    fn test_build_tree_not_found() {
        let dir = TempDir::new().unwrap();
        let result = build_tree(&dir.path().join("missing"), &sorted());
        assert!(matches!(result, Err(FsError::NotFound { .. })));
    }

    #[test]
    fn test_entry_json_shape() {
        let dir = sample_tree();
        let tree = build_tree(&dir.path().join("docs"), &sorted()).unwrap();
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["name"], "docs");
        assert_eq!(json["path"], "");
        assert_eq!(json["children"][0]["name"], "2024");
        assert_eq!(json["children"][0]["path"], "2024");
        assert_eq!(json["children"][0]["children"][0]["path"], "2024/q1.txt");
        assert_eq!(json["children"][0]["children"][0]["isFile"], true);
        assert!(json["children"][0]["children"][0].get("children").is_none());
        assert_eq!(json["children"][1]["name"], "readme.md");
    }

    #[test]
    fn test_arena_reuses_existing_segments() {
        let mut arena = Arena::new("root".to_string());

        let deep = arena.insert(&["a".to_string(), "b".to_string(), "c.txt".to_string()]);
        arena.nodes[deep].is_file = true;
        let a = arena.insert(&["a".to_string()]);
        let b = arena.insert(&["a".to_string(), "b".to_string()]);

        assert_eq!(arena.nodes[ROOT].children, vec![a]);
        assert_eq!(arena.nodes[a].children, vec![b]);
        assert_eq!(arena.nodes.len(), 4);

        let tree = arena.into_entry();
        let c = tree.find("a/b/c.txt").unwrap();
        assert!(c.is_file);
        assert_eq!(c.path, "a/b/c.txt");
        assert!(!tree.find("a/b").unwrap().is_file);
    }

    #[test]
    fn test_arena_keeps_first_seen_order() {
        let mut arena = Arena::new("root".to_string());
        arena.insert(&["zeta".to_string()]);
        arena.insert(&["alpha".to_string()]);
        arena.insert(&["zeta".to_string(), "x".to_string()]);

        let tree = arena.into_entry();
        let names: Vec<_> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_entry_find_missing() {
        let dir = sample_tree();
        let tree = build_tree(dir.path(), &sorted()).unwrap();

        assert!(tree.find("docs/2025").is_none());
        assert_eq!(tree.find("").unwrap().path, "");
    }
}
