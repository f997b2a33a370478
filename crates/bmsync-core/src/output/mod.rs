//! Everything about the generated markdown tree: note format, filenames,
//! the index of already-synced notes and the per-year index notes.

pub mod cache;
pub mod frontmatter;
pub mod naming;
pub mod year_index;

pub use cache::{OutputCache, OutputRecord};
pub use frontmatter::{Frontmatter, render_document};
pub use naming::{extract_domain, folder_dir_name, sanitize_filename, with_id_suffix};
pub use year_index::{YearIndex, group_by_year, render_year_index, write_year_indexes};
