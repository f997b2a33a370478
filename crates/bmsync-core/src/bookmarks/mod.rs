//! Bookmark tree model and the sources it is loaded from.

pub mod source;
pub mod tree;

pub use source::{BookmarkRoot, BookmarkSource, CommandSource, FileSource, TopLevelFolders};
pub use tree::{BookmarkNode, NodeKind, Walk, join_path, parent_path};
