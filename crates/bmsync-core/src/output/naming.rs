//! Filename derivation for generated notes.

/// Characters that are unsafe in filenames on at least one platform.
const INVALID_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Host part of `url`, without scheme, `www.` prefix or port.
///
/// ```rust
/// use bmsync_core::output::extract_domain;
///
/// assert_eq!(extract_domain("https://www.example.com:8080/a"), "example.com");
/// assert_eq!(extract_domain("ftp://x"), "ftp");
/// ```
pub fn extract_domain(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = rest.split('/').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.split(':').next().unwrap_or_default()
}

/// Markdown filename for a bookmark.
///
/// Unsafe characters become spaces and whitespace runs collapse. The domain
/// is prefixed as `<domain> - ` unless the title already starts with it.
pub fn sanitize_filename(title: &str, url: &str) -> String {
    let domain = extract_domain(url);
    let cleaned = title.replace(INVALID_CHARS, " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if !domain.is_empty()
        && !cleaned
            .to_lowercase()
            .starts_with(&domain.to_lowercase())
    {
        format!("{domain} - {cleaned}.md")
    } else {
        format!("{cleaned}.md")
    }
}

/// Directory name for a bookmark folder.
///
/// The result is always a single normal path component: unsafe characters
/// become spaces, an empty title becomes `_` and the dot-only names `.` and
/// `..` become underscores.
///
/// ```rust
/// use bmsync_core::output::folder_dir_name;
///
/// assert_eq!(folder_dir_name("/r/rust"), "r rust");
/// assert_eq!(folder_dir_name(".."), "__");
/// ```
pub fn folder_dir_name(title: &str) -> String {
    let cleaned = title.replace(INVALID_CHARS, " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        "_".to_string()
    } else if cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len())
    } else {
        cleaned
    }
}

/// Disambiguate `filename` for bookmark `id`: `<stem> [<id>].md`.
pub fn with_id_suffix(filename: &str, id: &str) -> String {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let id = id.replace(INVALID_CHARS, "_");
    format!("{stem} [{id}].md")
}
