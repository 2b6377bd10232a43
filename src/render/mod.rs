//! Turning document trees into markup text.

mod html;
mod markdown;
mod minify;

pub use html::serialize;
pub use markdown::markdown_transformer;
pub use minify::{MinifyType, minify};

use std::borrow::Cow;

/// Escape markup special characters.
///
/// `&` is replaced first so the entities produced for `"`, `<` and `>` are
/// not escaped a second time.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"', '<', '>']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('"', "&quot;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_borrowed_when_clean() {
        assert!(matches!(escape("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_existing_entity_is_escaped_once() {
        assert_eq!(escape("&lt;"), "&amp;lt;");
        assert_eq!(escape("<"), "&lt;");
    }
}
