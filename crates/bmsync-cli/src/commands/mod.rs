//! Command implementations for the bmsync CLI
//!
//! Each command lives in its own submodule.

mod cache;
mod completions;
mod list;
mod sync;

pub use cache::{clear_cache, execute as clear_cache_command};
pub use completions::generate;
pub use list::{ListEntry, execute as list_bookmarks, list_entries};
pub use sync::{execute as run_sync, print_report};
