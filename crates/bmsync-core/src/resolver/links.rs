//! Rewriting of relative markdown links against a base URL.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Inline links and images: `[text](target)` with an optional leading `!`.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!)?\[(.*?)\]\((.*?)\)").unwrap());

/// Targets that already carry a scheme (`https:`, `mailto:`, `data:`).
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Whether a link target is left untouched.
fn is_absolute(target: &str) -> bool {
    SCHEME_RE.is_match(target) || target.starts_with("//")
}

/// Make every relative link in `content` absolute under `base`.
///
/// The base's trailing `/` is dropped and the target always gets a leading
/// `/`, so `docs/a.md` under `https://x.dev/guide/` becomes
/// `https://x.dev/guide/docs/a.md`.
///
/// ```rust
/// use bmsync_core::resolver::rewrite_links;
///
/// let out = rewrite_links("![logo](img/logo.png)", "https://github.com/o/r/blob/HEAD");
/// assert_eq!(out, "![logo](https://github.com/o/r/blob/HEAD/img/logo.png)");
/// ```
pub fn rewrite_links(content: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    LINK_RE
        .replace_all(content, |caps: &Captures<'_>| {
            let target = &caps[3];
            if is_absolute(target) {
                return caps[0].to_string();
            }
            let bang = caps.get(1).map_or("", |m| m.as_str());
            let text = &caps[2];
            let slash = if target.starts_with('/') { "" } else { "/" };
            format!("{bang}[{text}]({base}{slash}{target})")
        })
        .into_owned()
}
