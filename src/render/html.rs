//! Document tree serialization.
//!
//! | Format    | Prefix                              | Void elements |
//! |-----------|-------------------------------------|---------------|
//! | `html5`   | `<!DOCTYPE html>`                   | `<br>`        |
//! | `xhtml`   | XML declaration + XHTML 1.0 doctype | `<br />`      |
//! | `html4`   | HTML 4.01 Strict doctype            | `<br>`        |
//! | (none)    | nothing                             | `<br>`        |

use super::escape;
use crate::template::{Format, Map, Node, TemplateError, Value};

const HTML5_DOCTYPE: &str = "<!DOCTYPE html>\n";
const XHTML_PROLOGUE: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" ",
    "\"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n",
);
const HTML4_DOCTYPE: &str = concat!(
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" ",
    "\"http://www.w3.org/TR/html4/strict.dtd\">\n",
);

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Serialize a document tree in the given dialect, or as bare markup when
/// `format` is `None`.
pub fn serialize(tree: &Value, format: Option<Format>) -> Result<String, TemplateError> {
    let mut out = String::from(match format {
        Some(Format::Html5) => HTML5_DOCTYPE,
        Some(Format::Xhtml) => XHTML_PROLOGUE,
        Some(Format::Html4) => HTML4_DOCTYPE,
        None => "",
    });
    let xhtml = format == Some(Format::Xhtml);
    write_value(&mut out, tree, xhtml)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, xhtml: bool) -> Result<(), TemplateError> {
    match value {
        Value::Nil => {}
        Value::Raw(raw) => out.push_str(raw),
        Value::List(items) => {
            for item in items {
                write_value(out, item, xhtml)?;
            }
        }
        Value::Node(node) => write_node(out, node, xhtml)?,
        Value::Deferred(deferred) => write_value(out, &deferred.force()?, xhtml)?,
        Value::Map(_) => {
            return Err(TemplateError::Serialize(
                "a map cannot be rendered as markup".into(),
            ));
        }
        text => out.push_str(&escape(&text.to_text())),
    }
    Ok(())
}

fn write_node(out: &mut String, node: &Node, xhtml: bool) -> Result<(), TemplateError> {
    let (name, attrs) = expand_tag(&node.tag, &node.attrs);
    if !is_markup_name(name) {
        return Err(TemplateError::Serialize(format!(
            "invalid tag `{}`",
            node.tag
        )));
    }

    out.push('<');
    out.push_str(name);
    for (key, value) in &attrs {
        if !is_markup_name(key) {
            return Err(TemplateError::Serialize(format!(
                "invalid attribute name `{key}` on <{name}>"
            )));
        }
        match value {
            Value::Nil | Value::Bool(false) => {}
            Value::Bool(true) if xhtml => {
                out.push_str(&format!(" {key}=\"{key}\""));
            }
            Value::Bool(true) => {
                out.push(' ');
                out.push_str(key);
            }
            value => {
                out.push_str(&format!(" {key}=\"{}\"", escape(&value.to_text())));
            }
        }
    }

    if node.children.is_empty() && VOID_ELEMENTS.contains(&name) {
        out.push_str(if xhtml { " />" } else { ">" });
        return Ok(());
    }

    out.push('>');
    for child in &node.children {
        write_value(out, child, xhtml)?;
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
    Ok(())
}

/// Element and attribute names are written unescaped, so they must not be
/// able to close the tag or start another attribute.
fn is_markup_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '/'))
}

/// Expand `div#main.post.wide` into the element name plus `id`/`class`.
///
/// Explicit attributes win for `id`; explicit classes are appended after the
/// shorthand ones.
fn expand_tag<'a>(tag: &'a str, attrs: &Map) -> (&'a str, Map) {
    let name_end = tag.find(['#', '.']).unwrap_or(tag.len());
    let (name, mut rest) = tag.split_at(name_end);

    let mut id = None;
    let mut classes = Vec::new();
    while !rest.is_empty() {
        let marker = rest.as_bytes()[0];
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let part = &body[..end];
        if !part.is_empty() {
            if marker == b'#' {
                id = Some(part);
            } else {
                classes.push(part.to_owned());
            }
        }
        rest = &body[end..];
    }

    let mut merged = attrs.clone();
    if let Some(id) = id {
        merged.entry("id".into()).or_insert_with(|| Value::from(id));
    }
    if !classes.is_empty() {
        if let Some(explicit) = merged.get("class") {
            let explicit = explicit.to_text();
            if !explicit.is_empty() {
                classes.push(explicit);
            }
        }
        merged.insert("class".into(), Value::Str(classes.join(" ")));
    }
    (name, merged)
}
