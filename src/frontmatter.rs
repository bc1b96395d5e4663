//! YAML front-matter codec.
//!
//! An article is a Markdown file that may start with a metadata block:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-01-05 10:00:00
//! cover: ''
//! categories:
//! - Tech/Rust
//! tags:
//! - cargo
//! ---
//!
//! Body text...
//! ```
//!
//! [`decode`] splits on the first two occurrences of `---` and parses the
//! segment between them. [`encode`] writes the known keys in a fixed order
//! (`title`, `date`, `cover`, `categories`, `tags`) followed by any other
//! keys the block carried, so re-encoding normalizes key order without
//! losing data.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Opening and closing marker of the metadata block.
pub const DELIMITER: &str = "---";

/// Why a metadata block could not be decoded.
///
/// "No front matter" is not an error; see [`Decoded::front_matter`].
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter is not closed by a second `---`")]
    Unterminated,
    #[error("malformed front matter: {0}")]
    Malformed(#[source] serde_yaml::Error),
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("failed to serialize front matter: {0}")]
    Encode(#[source] serde_yaml::Error),
}

/// Parsed metadata of one article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub cover: Option<String>,
    /// `None` when the key is absent; `Some(vec![])` when it is present but empty.
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    /// Keys other than the five above, kept verbatim. Must not repeat a known key.
    pub extra: BTreeMap<String, Value>,
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// `None` when the text does not start with a metadata block.
    pub front_matter: Option<FrontMatter>,
    /// Trimmed text after the block, or the whole text untouched when there is no block.
    pub body: String,
}

/// Split `text` into metadata and body.
pub fn decode(text: &str) -> Result<Decoded, FrontMatterError> {
    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return Ok(Decoded {
            front_matter: None,
            body: text.to_string(),
        });
    };
    let end = rest.find(DELIMITER).ok_or(FrontMatterError::Unterminated)?;
    let front_matter = parse_block(&rest[..end])?;
    let body = rest[end + DELIMITER.len()..].trim().to_string();
    Ok(Decoded {
        front_matter: Some(front_matter),
        body,
    })
}

fn parse_block(block: &str) -> Result<FrontMatter, FrontMatterError> {
    if block.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    let value: Value = serde_yaml::from_str(block).map_err(FrontMatterError::Malformed)?;
    let mapping = match value {
        Value::Null => return Ok(FrontMatter::default()),
        Value::Mapping(m) => m,
        Value::Bool(_) => return Err(FrontMatterError::NotAMapping("a boolean")),
        Value::Number(_) => return Err(FrontMatterError::NotAMapping("a number")),
        Value::String(_) => return Err(FrontMatterError::NotAMapping("a string")),
        Value::Sequence(_) => return Err(FrontMatterError::NotAMapping("a sequence")),
        Value::Tagged(_) => return Err(FrontMatterError::NotAMapping("a tagged value")),
    };

    let mut fm = FrontMatter::default();
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            continue;
        };
        match key.as_str() {
            "title" => fm.title = scalar_text(&value),
            "date" => fm.date = scalar_text(&value),
            "cover" => fm.cover = scalar_text(&value),
            "categories" => fm.categories = Some(text_list(&value)),
            "tags" => fm.tags = Some(text_list(&value)),
            _ => {
                fm.extra.insert(key, value);
            }
        }
    }
    Ok(fm)
}

/// Scalars become their textual form; `null`, sequences and maps have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(t) => scalar_text(&t.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// A sequence of scalars, or a single scalar treated as a one-item list.
fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

#[derive(Serialize)]
struct Ordered<'a> {
    title: &'a str,
    date: &'a str,
    cover: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    categories: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    tags: &'a [String],
    #[serde(flatten)]
    extra: &'a BTreeMap<String, Value>,
}

fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

/// Render metadata and body as article text.
///
/// `title`, `date` and `cover` are always written (empty string when unset);
/// `categories` and `tags` only when non-empty. The body follows the closing
/// delimiter and a blank line, verbatim.
pub fn encode(fm: &FrontMatter, body: &str) -> Result<String, FrontMatterError> {
    let ordered = Ordered {
        title: fm.title.as_deref().unwrap_or(""),
        date: fm.date.as_deref().unwrap_or(""),
        cover: fm.cover.as_deref().unwrap_or(""),
        categories: fm.categories.as_deref().unwrap_or_default(),
        tags: fm.tags.as_deref().unwrap_or_default(),
        extra: &fm.extra,
    };
    let yaml = serde_yaml::to_string(&ordered).map_err(FrontMatterError::Encode)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
}
