//! Built-in `markdown` transformer.
//!
//! Replaces every `[:markdown "..."]` node with the HTML rendered from its
//! text children.

use crate::template::{Node, Value};
use pulldown_cmark::{Options, Parser, html};

pub fn markdown_transformer(value: Value) -> Value {
    value.map_nodes(&render_node)
}

fn render_node(node: Node) -> Value {
    if node.tag != "markdown" {
        return Value::Node(node);
    }

    let source: String = node.children.iter().map(Value::to_text).collect();
    Value::Raw(render_markdown(&source))
}

fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
