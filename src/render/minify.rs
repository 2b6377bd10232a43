//! Minification of serialized output.
//!
//! HTML goes through `minify_html`; XHTML and other XML documents (feeds)
//! only have their indentation and blank lines stripped.

use crate::{config::SiteConfig, template::Format};
use std::{borrow::Cow, path::Path};

/// Content type for minification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinifyType {
    Html,
    Xml,
}

impl MinifyType {
    /// Pick the minifier for an output file.
    pub fn for_output(path: &Path, format: Option<Format>) -> Self {
        let is_xml_file = path.extension().is_some_and(|ext| ext == "xml");
        if is_xml_file || format == Some(Format::Xhtml) {
            Self::Xml
        } else {
            Self::Html
        }
    }
}

/// Minify `content` when `[build] minify` is enabled.
pub fn minify<'a>(content: &'a str, kind: MinifyType, config: &SiteConfig) -> Cow<'a, str> {
    if !config.build.minify {
        return Cow::Borrowed(content);
    }

    match kind {
        MinifyType::Html => Cow::Owned(minify_html_inner(content)),
        MinifyType::Xml => Cow::Owned(minify_xml_inner(content)),
    }
}

fn minify_html_inner(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    let minified = minify_html::minify(html.as_bytes(), &cfg);
    String::from_utf8(minified).unwrap_or_else(|_| html.to_owned())
}

fn minify_xml_inner(xml: &str) -> String {
    xml.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_minify(enabled: bool) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.minify = enabled;
        config
    }

    #[test]
    fn test_minify_html_enabled() {
        let html = "<html>\n  <body>\n    <p>Hello World</p>\n  </body>\n</html>";

        let minified = minify(html, MinifyType::Html, &config_with_minify(true));
        let not_minified = minify(html, MinifyType::Html, &config_with_minify(false));

        assert!(minified.len() < not_minified.len());
        assert!(minified.contains("<p>Hello World</p>"));
        assert_eq!(not_minified, html);
    }

    #[test]
    fn test_minify_xml_removes_indentation() {
        let xml = "<?xml version=\"1.0\"?>\n<feed>\n\n  <entry>Hello</entry>\n</feed>";
        let result = minify(xml, MinifyType::Xml, &config_with_minify(true));
        assert_eq!(result, "<?xml version=\"1.0\"?><feed><entry>Hello</entry></feed>");
    }

    #[test]
    fn test_minify_type_for_output() {
        assert_eq!(
            MinifyType::for_output(Path::new("public/atom.xml"), None),
            MinifyType::Xml
        );
        assert_eq!(
            MinifyType::for_output(Path::new("public/index.html"), Some(Format::Xhtml)),
            MinifyType::Xml
        );
        assert_eq!(
            MinifyType::for_output(Path::new("public/index.html"), Some(Format::Html5)),
            MinifyType::Html
        );
    }
}
