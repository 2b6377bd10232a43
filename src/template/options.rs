//! Per-document option header parsing.
//!
//! Templates start with a block of comment lines carrying options:
//!
//! ```text
//! ; layout: default
//! ; title: Hello, world
//! ; tag: rust, web
//! [:h1 (:title site)]
//! ```
//!
//! The header is the leading run of blank lines and `;` lines. Each header
//! line is split at its first `:`. Keys we don't know are dropped, and so are
//! lines that don't look like `key:value` at all.

use super::value::{Map, Value};
use chrono::NaiveDate;

/// Markup dialect a document asks to be serialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html5,
    Xhtml,
    Html4,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html5" => Some(Self::Html5),
            "xhtml" => Some(Self::Xhtml),
            "html4" => Some(Self::Html4),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Html5 => "html5",
            Self::Xhtml => "xhtml",
            Self::Html4 => "html4",
        }
    }
}

/// A `tag` option entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
}

/// Recognized options of a single document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentOptions {
    pub layout: Option<String>,
    pub title: Option<String>,
    pub tags: Vec<TagRef>,
    pub format: Option<Format>,
    pub date: Option<NaiveDate>,
}

impl DocumentOptions {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    /// Fields merged into the site context when this document is rendered.
    pub fn to_fields(&self) -> Map {
        let mut fields = Map::new();
        if let Some(layout) = &self.layout {
            fields.insert("layout".into(), Value::from(layout.as_str()));
        }
        if let Some(title) = &self.title {
            fields.insert("title".into(), Value::from(title.as_str()));
        }
        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .map(|tag| Value::map([("name", Value::from(tag.name.as_str()))]))
                .collect();
            fields.insert("tags".into(), Value::List(tags));
        }
        if let Some(format) = self.format {
            fields.insert("format".into(), Value::from(format.name()));
        }
        fields
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "layout" if !value.is_empty() => self.layout = Some(value.to_owned()),
            "title" => self.title = Some(value.to_owned()),
            "tag" | "tags" => self.tags.extend(
                value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|name| !name.is_empty())
                    .map(|name| TagRef {
                        name: name.to_owned(),
                    }),
            ),
            "format" => self.format = Format::parse(value),
            "date" => self.date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
            _ => {}
        }
    }
}

/// Split raw template text into its options and body.
///
/// The body is a suffix slice of `raw`, so callers can compute the line it
/// starts on.
pub fn parse_options(raw: &str) -> (DocumentOptions, &str) {
    let mut options = DocumentOptions::default();
    let mut offset = 0;

    for line in raw.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }
        let Some(header) = trimmed.strip_prefix(';') else {
            break;
        };
        offset += line.len();

        let header = header.trim_start_matches(';').trim();
        if let Some((key, value)) = header.split_once(':') {
            let key = key.trim();
            if !key.is_empty() && !key.contains(char::is_whitespace) {
                options.apply(key, value.trim());
            }
        }
    }

    (options, &raw[offset..])
}
