//! URL slugification and output path utilities.

use super::date::split_date_prefix;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

/// Characters forbidden in file paths
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '\t', '\r', '\n',
];

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Sanitize each component of a path
fn sanitize_path(path: &Path) -> PathBuf {
    path.components()
        .map(|c| sanitize_text(&c.as_os_str().to_string_lossy()))
        .collect()
}

/// Slug of a post file: its stem without the date prefix, slugified.
pub fn post_slug(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let (_, rest) = split_date_prefix(&stem);
    slug::slugify(rest)
}

/// Replace every `{key}` in `pattern`.
fn expand_pattern(pattern: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(pattern.to_owned(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

/// URL of a post from the `[build] post_url` pattern.
pub fn post_url(pattern: &str, date: NaiveDate, slug: &str) -> String {
    let year = date.year().to_string();
    let month = format!("{:02}", date.month());
    let day = format!("{:02}", date.day());
    expand_pattern(
        pattern,
        &[("year", &year), ("month", &month), ("day", &day), ("slug", slug)],
    )
}

/// URL of a tag page from the `[build] tag_url` pattern.
pub fn tag_url(pattern: &str, tag: &str) -> String {
    expand_pattern(pattern, &[("tag", &slug::slugify(tag))])
}

/// URL of a regular template: its relative path minus the template
/// extension, with `.html` appended when nothing else is left.
///
/// | Source | URL |
/// |--------|-----|
/// | `index.html.sx` | `/index.html` |
/// | `blog/atom.xml.sx` | `/blog/atom.xml` |
/// | `about.sx` | `/about.html` |
pub fn template_url(relative: &Path, extension: &str) -> String {
    let mut path = sanitize_path(relative);
    if path.extension().is_some_and(|ext| ext == extension) {
        path.set_extension("");
    }
    if path.extension().is_none() {
        path.set_extension("html");
    }

    let url = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{url}")
}

/// Output file for a URL; URLs ending in `/` get an `index.html`.
pub fn output_path(output_dir: &Path, url: &str) -> PathBuf {
    let relative = url.trim_start_matches('/');
    let path = output_dir.join(relative);
    if relative.is_empty() || url.ends_with('/') {
        path.join("index.html")
    } else {
        path
    }
}
