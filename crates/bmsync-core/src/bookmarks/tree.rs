//! Bookmark tree types, path lookup and depth-first traversal.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a node in the bookmark tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Container with ordered children.
    Folder,
    /// Leaf pointing at a URL.
    Bookmark,
    /// Anything else the source emits (separators, queries, untyped
    /// tombstones).
    #[default]
    #[serde(other)]
    Other,
}

/// Wire shape of a node as emitted by the bookmark source.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: NodeKind,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    added_unix: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    children: Vec<BookmarkNode>,
}

/// One node of the bookmark tree.
///
/// `uri` is present iff `kind` is [`NodeKind::Bookmark`] and the node is
/// live; decoding rejects a live bookmark without one and drops a stray
/// `uri` on anything else. Deleted bookmarks may come without a uri.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct BookmarkNode {
    /// Stable identifier assigned by the bookmark store.
    pub id: String,
    /// Display title; also the path segment for this node.
    pub title: String,
    /// Node variant.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Target URL (bookmarks only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Creation time in unix seconds.
    pub added_unix: i64,
    /// Tombstone flag.
    pub deleted: bool,
    /// Ordered children (folders only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl TryFrom<RawNode> for BookmarkNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let uri = match raw.kind {
            NodeKind::Bookmark => match raw.uri {
                Some(uri) if !uri.is_empty() => Some(uri),
                _ if raw.deleted => None,
                _ => return Err(format!("bookmark '{}' ({}) has no uri", raw.title, raw.id)),
            },
            NodeKind::Folder | NodeKind::Other => None,
        };

        let children = if raw.kind == NodeKind::Folder {
            raw.children
        } else {
            Vec::new()
        };

        Ok(Self {
            id: raw.id,
            title: raw.title,
            kind: raw.kind,
            uri,
            added_unix: raw.added_unix,
            deleted: raw.deleted,
            children,
        })
    }
}

impl BookmarkNode {
    /// Build a folder node.
    pub fn folder(id: impl Into<String>, title: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: NodeKind::Folder,
            uri: None,
            added_unix: 0,
            deleted: false,
            children,
        }
    }

    /// Build a bookmark leaf.
    pub fn bookmark(
        id: impl Into<String>,
        title: impl Into<String>,
        uri: impl Into<String>,
        added_unix: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: NodeKind::Bookmark,
            uri: Some(uri.into()),
            added_unix,
            deleted: false,
            children: Vec::new(),
        }
    }

    /// Mark the node deleted.
    #[must_use]
    pub const fn into_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// True for folders.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// True for bookmarks that have not been deleted.
    pub fn is_live_bookmark(&self) -> bool {
        self.kind == NodeKind::Bookmark && !self.deleted
    }

    /// URL of a bookmark, empty for anything else.
    pub fn url(&self) -> &str {
        self.uri.as_deref().unwrap_or_default()
    }

    /// Creation timestamp.
    ///
    /// Out-of-range values fall back to the unix epoch.
    pub fn added_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.added_unix, 0).unwrap_or_default()
    }

    /// Calendar year (UTC) the node was created in.
    pub fn added_year(&self) -> i32 {
        self.added_at().year()
    }

    /// Resolve a `/`-delimited path against this node.
    ///
    /// The first segment must equal this node's title; each following
    /// segment selects the first child with exactly that title.
    pub fn find(&self, path: &str) -> Option<&Self> {
        let mut segments = path.split('/');
        if segments.next()? != self.title {
            return None;
        }
        self.find_segments(segments)
    }

    /// Resolve segments relative to this node's children.
    pub(crate) fn find_segments<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Option<&Self> {
        let mut current = self;
        for segment in segments {
            current = current.children.iter().find(|c| c.title == segment)?;
        }
        Some(current)
    }

    /// Lazy pre-order walk over `(path, node)` pairs.
    ///
    /// The node itself comes first at the empty path; descendants carry the
    /// `/`-joined titles below it, children in stored order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(String::new(), self, 0)],
            prune: None,
        }
    }

    /// Like [`Self::walk`], but descendants for which `prune` returns true
    /// are yielded without their subtree. The starting node is never pruned.
    pub fn walk_pruned<'a, F>(&'a self, prune: F) -> Walk<'a>
    where
        F: Fn(&BookmarkNode) -> bool + Send + Sync + 'a,
    {
        Walk {
            stack: vec![(String::new(), self, 0)],
            prune: Some(Box::new(prune)),
        }
    }
}

type PruneFn<'a> = Box<dyn Fn(&BookmarkNode) -> bool + Send + Sync + 'a>;

/// Depth-first iterator returned by [`BookmarkNode::walk`].
pub struct Walk<'a> {
    stack: Vec<(String, &'a BookmarkNode, usize)>,
    prune: Option<PruneFn<'a>>,
}

impl std::fmt::Debug for Walk<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walk")
            .field("pending", &self.stack.len())
            .field("pruned", &self.prune.is_some())
            .finish()
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (String, &'a BookmarkNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node, depth) = self.stack.pop()?;
        let descend = depth == 0 || self.prune.as_ref().is_none_or(|prune| !prune(node));
        if descend {
            for child in node.children.iter().rev() {
                self.stack
                    .push((join_path(&path, &child.title), child, depth + 1));
            }
        }
        Some((path, node))
    }
}

/// Append a title to a `/`-joined path.
pub fn join_path(parent: &str, title: &str) -> String {
    if parent.is_empty() {
        title.to_string()
    } else {
        format!("{parent}/{title}")
    }
}

/// Inverse of [`join_path`]: the parent part of `path` whose last segment
/// is `title`. Titles may themselves contain `/`.
pub fn parent_path<'p>(path: &'p str, title: &str) -> &'p str {
    path.strip_suffix(title)
        .map_or("", |parent| parent.strip_suffix('/').unwrap_or(parent))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> BookmarkNode {
        BookmarkNode::folder(
            "toolbar",
            "toolbar",
            vec![
                BookmarkNode::folder(
                    "f1",
                    "docs",
                    vec![
                        BookmarkNode::bookmark("b1", "page1", "https://example.com/a", 0),
                        BookmarkNode::folder(
                            "f2",
                            "deep",
                            vec![BookmarkNode::bookmark("b2", "page2", "https://example.com/b", 0)],
                        ),
                    ],
                ),
                BookmarkNode::bookmark("b3", "top", "https://example.com/c", 0),
            ],
        )
    }

    #[test]
    fn test_walk_is_preorder_with_relative_paths() {
        // Given: a small nested tree
        let tree = sample_tree();

        // When: walking it
        let paths: Vec<String> = tree.walk().map(|(p, _)| p).collect();

        // Then: parents precede children, siblings keep their order
        assert_eq!(
            paths,
            vec![
                "",
                "docs",
                "docs/page1",
                "docs/deep",
                "docs/deep/page2",
                "top",
            ]
        );
    }

    #[test]
    fn test_walk_is_lazy() {
        let tree = sample_tree();
        let mut walk = tree.walk();
        let (_, root) = walk.next().unwrap();
        assert_eq!(root.id, "toolbar");
        let (path, docs) = walk.next().unwrap();
        assert_eq!(path, "docs");
        assert!(docs.is_folder());
    }

    #[test]
    fn test_walk_pruned_skips_subtrees_but_not_root() {
        let tree = sample_tree();

        let paths: Vec<String> = tree
            .walk_pruned(|n| n.title == "deep" || n.title == "toolbar")
            .map(|(p, _)| p)
            .collect();

        assert_eq!(paths, vec!["", "docs", "docs/page1", "docs/deep", "top"]);
    }

    #[test]
    fn test_parent_path_handles_slashes_in_titles() {
        assert_eq!(parent_path("docs/deep/page2", "page2"), "docs/deep");
        assert_eq!(parent_path("top", "top"), "");
        assert_eq!(parent_path("docs/a/b", "a/b"), "docs");
        assert_eq!(parent_path(&join_path("x", ""), ""), "x");
    }

    #[test]
    fn test_find_matches_exact_title_chain() {
        let tree = sample_tree();
        assert_eq!(tree.find("toolbar").unwrap().id, "toolbar");
        assert_eq!(tree.find("toolbar/docs/deep").unwrap().id, "f2");
        assert_eq!(tree.find("toolbar/docs/deep/page2").unwrap().id, "b2");
    }

    #[test]
    fn test_find_fails_on_any_mismatch() {
        let tree = sample_tree();
        assert!(tree.find("menu/docs").is_none());
        assert!(tree.find("toolbar/Docs").is_none());
        assert!(tree.find("toolbar/docs/page1/extra").is_none());
        assert!(tree.find("").is_none());
    }

    #[test]
    fn test_find_prefers_first_duplicate_sibling() {
        let tree = BookmarkNode::folder(
            "r",
            "root",
            vec![
                BookmarkNode::folder("first", "dup", vec![]),
                BookmarkNode::folder("second", "dup", vec![]),
            ],
        );
        assert_eq!(tree.find("root/dup").unwrap().id, "first");
    }

    #[test]
    fn test_decode_enforces_uri_invariant() {
        let ok = r#"{"id":"b","title":"t","type":"bookmark","uri":"https://x.dev","added_unix":1}"#;
        let node: BookmarkNode = serde_json::from_str(ok).unwrap();
        assert_eq!(node.url(), "https://x.dev");

        let missing = r#"{"id":"b","title":"t","type":"bookmark"}"#;
        assert!(serde_json::from_str::<BookmarkNode>(missing).is_err());

        let folder = r#"{"id":"f","title":"f","type":"folder","uri":"https://stray"}"#;
        let node: BookmarkNode = serde_json::from_str(folder).unwrap();
        assert!(node.uri.is_none());
    }

    #[test]
    fn test_decode_accepts_deleted_bookmark_without_uri() {
        let json = r#"{"id":"b","title":"gone","type":"bookmark","deleted":true}"#;
        let node: BookmarkNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.kind, NodeKind::Bookmark);
        assert!(node.deleted);
        assert!(node.uri.is_none());
        assert!(!node.is_live_bookmark());
        assert_eq!(node.url(), "");
    }

    #[test]
    fn test_decode_defaults_missing_type_to_other() {
        let json = r#"{"id":"gone","deleted":true}"#;
        let node: BookmarkNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.kind, NodeKind::Other);
        assert!(!node.is_live_bookmark());
    }

    #[test]
    fn test_tombstones_do_not_poison_the_tree() {
        // Given: a folder mixing live nodes with both kinds of tombstone
        let json = r#"{"id":"f","title":"f","type":"folder","children":[
            {"id":"gone","deleted":true},
            {"id":"old","title":"old","type":"bookmark","deleted":true},
            {"id":"b","title":"t","type":"bookmark","uri":"https://x.dev"}
        ]}"#;

        // When: decoding
        let node: BookmarkNode = serde_json::from_str(json).unwrap();

        // Then: everything decodes and only the live bookmark is live
        let live: Vec<_> = node
            .walk()
            .filter(|(_, n)| n.is_live_bookmark())
            .map(|(_, n)| n.id.as_str())
            .collect();
        assert_eq!(node.children.len(), 3);
        assert_eq!(live, ["b"]);
    }

    #[test]
    fn test_decode_tolerates_unknown_node_types() {
        let json = r#"{"id":"f","title":"f","type":"folder","children":[
            {"id":"s","title":"","type":"separator"},
            {"id":"b","title":"t","type":"bookmark","uri":"https://x.dev"}
        ]}"#;
        let node: BookmarkNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.children[0].kind, NodeKind::Other);
        assert!(node.children[1].is_live_bookmark());
    }

    #[test]
    fn test_added_year_uses_utc() {
        // 2023-12-31T23:30:00Z
        let node = BookmarkNode::bookmark("b", "t", "https://x.dev", 1_704_065_400);
        assert_eq!(node.added_year(), 2023);
    }
}
