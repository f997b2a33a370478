//! YAML frontmatter for generated bookmark notes.
//!
//! Rendering is hand-ordered so the files stay stable across runs and
//! readable in a notes app; parsing goes through `serde_yaml` and accepts
//! whatever scalar types a hand-edited file may contain.

use crate::bookmarks::BookmarkNode;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Date format of `created_at`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tag attached to every generated note.
pub const BOOKMARK_TAG: &str = "bookmark";

const DELIMITER: &str = "---";

/// Metadata block at the top of a generated note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Bookmark title
    #[serde(default, deserialize_with = "scalar")]
    pub title: String,
    /// Bookmark URL
    #[serde(default, deserialize_with = "scalar")]
    pub url: String,
    /// Folder path relative to the sync base, empty at the root
    #[serde(default, deserialize_with = "scalar")]
    pub path: String,
    /// Optional free-text description
    #[serde(default, deserialize_with = "optional_scalar")]
    pub description: Option<String>,
    /// Creation date, `YYYY-MM-DD`
    #[serde(default, deserialize_with = "scalar")]
    pub created_at: String,
    /// Stable bookmark id
    #[serde(default, deserialize_with = "scalar")]
    pub id: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
}

impl Frontmatter {
    /// Frontmatter for a bookmark written under folder `path`.
    pub fn for_bookmark(node: &BookmarkNode, path: &str) -> Self {
        Self {
            title: node.title.clone(),
            url: node.url().to_string(),
            path: path.to_string(),
            description: None,
            created_at: node.added_at().format(DATE_FORMAT).to_string(),
            id: node.id.clone(),
            tags: vec![BOOKMARK_TAG.to_string()],
        }
    }

    /// Render the block, delimiters included, without a trailing newline.
    ///
    /// Empty values are omitted. The title is always quoted; other values
    /// are quoted only when they would not read back as the same string.
    pub fn render(&self) -> String {
        let mut out = String::from(DELIMITER);
        out.push('\n');

        let mut field = |key: &str, value: &str| {
            if !value.is_empty() {
                out.push_str(key);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
        };

        field("title", &quote(&self.title));
        field("url", &quote_if_needed(&self.url));
        field("path", &quote_if_needed(&self.path));
        field(
            "description",
            &quote_if_needed(self.description.as_deref().unwrap_or_default()),
        );
        field("created_at", &self.created_at);
        field("id", &quote_if_needed(&self.id));
        field("cssclasses", "line3");
        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .map(|t| double_quote(t))
                .collect::<Vec<_>>()
                .join(", ");
            field("tags", &format!("[{tags}]"));
        }

        out.push_str(DELIMITER);
        out
    }

    /// Parse the leading frontmatter block of `text`.
    ///
    /// Returns `Ok(None)` when the text does not start with a block.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let Some((yaml, _)) = split(text) else {
            return Ok(None);
        };
        if yaml.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        Ok(Some(serde_yaml::from_str(yaml)?))
    }
}

/// Split `text` into the YAML between the leading delimiters and the body.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix(DELIMITER)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Assemble a full note: frontmatter, optional screenshot, body.
pub fn render_document(frontmatter: &Frontmatter, screenshot: Option<&str>, body: &str) -> String {
    let mut out = frontmatter.render();
    out.push('\n');
    if let Some(url) = screenshot {
        out.push_str("![Screenshot](");
        out.push_str(url);
        out.push_str(")\n");
    }
    out.push_str(body);
    out.push('\n');
    out
}

/// Quote unconditionally: single quotes, or double quotes when the value
/// contains `'` or control characters.
pub fn quote(value: &str) -> String {
    if value.contains('\'') || value.chars().any(needs_escape) {
        double_quote(value)
    } else {
        format!("'{value}'")
    }
}

/// Quote only when a plain scalar would not round-trip.
pub fn quote_if_needed(value: &str) -> String {
    if needs_quotes(value) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Characters that only survive a round-trip inside double quotes: controls
/// and the line/paragraph separators YAML treats as line breaks.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}')
}

fn needs_quotes(value: &str) -> bool {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`', '+', '.', '~', '=',
    ];
    const RESERVED: &[&str] = &[
        "true", "false", "yes", "no", "on", "off", "null", "y", "n", "~",
    ];

    let Some(first) = value.chars().next() else {
        return false;
    };

    first.is_ascii_digit()
        || INDICATORS.contains(&first)
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.contains(": ")
        || value.contains(" #")
        || value.chars().any(needs_escape)
        || RESERVED.contains(&value.to_ascii_lowercase().as_str())
}
