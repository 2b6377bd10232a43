//! Template compilation.
//!
//! # Architecture
//!
//! ```text
//! compile_template(name, allow_layout)
//!     │
//!     ├── TemplateSource::read(name)      raw text
//!     ├── parse_options(raw)              options + body
//!     ├── compile_body(body)              RenderFn over `site` / `content`
//!     │
//!     └── allow_layout && options.layout
//!             │
//!             └── resolve_layout_chain()  layouts wrapped around the body
//! ```
//!
//! A document's option fields are merged into `site` before its body and its
//! layouts run, so a layout can read the page title with `(:title site)`.

use super::{
    error::TemplateError,
    eval::{Scope, eval_forms},
    options::{DocumentOptions, Format, parse_options},
    reader::{ReadError, read_all},
    source::TemplateSource,
    value::{Map, Value},
};
use std::{fmt, rc::Rc};

type RenderImpl = dyn Fn(&Value, &[Value]) -> Result<Value, TemplateError>;

/// A compiled template: `(site, content...) -> document tree`.
///
/// Cheap to clone; clones share the compiled body.
#[derive(Clone)]
pub struct RenderFn(Rc<RenderImpl>);

impl RenderFn {
    pub fn new(f: impl Fn(&Value, &[Value]) -> Result<Value, TemplateError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, site: &Value, content: &[Value]) -> Result<Value, TemplateError> {
        (self.0)(site, content)
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFn")
    }
}

/// Result of [`Compiler::compile_template`].
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub options: DocumentOptions,
    /// Serialization format of the outermost template in the chain that declares one.
    pub format: Option<Format>,
    pub render: RenderFn,
}

pub(super) fn syntax_error(template: &str, err: ReadError) -> TemplateError {
    TemplateError::Syntax {
        template: template.to_owned(),
        line: err.span.line,
        column: err.span.column,
        message: err.message,
    }
}

/// Compile a template body into a render function.
///
/// `first_line` is the line the body starts on in its file, so syntax and
/// evaluation errors point at the right place.
pub fn compile_body(name: &str, body: &str, first_line: usize) -> Result<RenderFn, TemplateError> {
    let forms = read_all(body, first_line).map_err(|err| syntax_error(name, err))?;
    let name = name.to_owned();

    Ok(RenderFn::new(move |site, content| {
        let mut scope = Scope::new(site.clone(), content);
        eval_forms(&forms, &mut scope).map_err(|err| TemplateError::Eval {
            template: format!("{name}:{}:{}", err.span.line, err.span.column),
            message: err.message,
        })
    }))
}

/// Parse the header of `raw` and compile what follows it.
pub(super) fn compile_raw(name: &str, raw: &str) -> Result<(DocumentOptions, RenderFn), TemplateError> {
    let (options, body) = parse_options(raw);
    let header = &raw[..raw.len() - body.len()];
    let first_line = header.matches('\n').count() + 1;
    let render = compile_body(name, body, first_line)?;
    Ok((options, render))
}

/// Merge document fields over the site context.
fn merge_site(site: &Value, fields: &Map) -> Value {
    if fields.is_empty() {
        return site.clone();
    }
    match site {
        Value::Map(map) => {
            let mut merged = map.clone();
            merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            Value::Map(merged)
        }
        Value::Nil => Value::Map(fields.clone()),
        other => other.clone(),
    }
}

/// Compiles documents and resolves their layouts.
pub struct Compiler<'a> {
    pub(super) templates: &'a dyn TemplateSource,
    pub(super) layouts: &'a dyn TemplateSource,
}

impl<'a> Compiler<'a> {
    pub fn new(templates: &'a dyn TemplateSource, layouts: &'a dyn TemplateSource) -> Self {
        Self { templates, layouts }
    }

    /// Load and compile a named template.
    pub fn compile_template(
        &self,
        name: &str,
        allow_layout: bool,
    ) -> Result<CompiledTemplate, TemplateError> {
        let raw = self.templates.read(name)?;
        self.compile_document(name, &raw, allow_layout)
    }

    /// Compile a named layout as a standalone document (tag pages).
    pub fn compile_layout_document(&self, name: &str) -> Result<CompiledTemplate, TemplateError> {
        let raw = self.layouts.read(name).map_err(|err| match err {
            TemplateError::MissingTemplate(_) => TemplateError::MissingLayout(name.to_owned()),
            other => other,
        })?;
        self.compile_document(name, &raw, true)
    }

    /// Compile already loaded template text.
    pub fn compile_document(
        &self,
        name: &str,
        raw: &str,
        allow_layout: bool,
    ) -> Result<CompiledTemplate, TemplateError> {
        let (options, body) = compile_raw(name, raw)?;

        let (render, format) = match options.layout.as_deref() {
            Some(layout) if allow_layout => {
                let resolved = self.resolve_layout_chain(layout)?;
                let wrap = resolved.render;
                let render = RenderFn::new(move |site, content| {
                    let inner = body.call(site, content)?;
                    wrap.call(site, &[inner])
                });
                (render, resolved.format.or(options.format))
            }
            _ => (body, options.format),
        };

        let fields = options.to_fields();
        let render = RenderFn::new(move |site, content| {
            render.call(&merge_site(site, &fields), content)
        });

        Ok(CompiledTemplate {
            options,
            format,
            render,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Node, source::MemorySource};

    fn site(title: &str) -> Value {
        Value::map([("title", Value::from(title))])
    }

    fn p(children: Vec<Value>) -> Value {
        Value::Node(Node::new("p", children))
    }

    #[test]
    fn test_compile_body_binds_site_and_content() {
        let render = compile_body("t", "[:p (:title site)]\n[:p content]", 1).unwrap();
        let result = render
            .call(&site("a"), &[Value::from("b"), Value::from("c")])
            .unwrap();

        assert_eq!(
            result,
            Value::List(vec![
                p(vec![Value::from("a")]),
                p(vec![Value::List(vec![Value::from("b"), Value::from("c")])]),
            ])
        );
    }

    #[test]
    fn test_render_fn_is_reusable() {
        let render = compile_body("t", "(:title site)", 1).unwrap();
        assert_eq!(render.call(&site("x"), &[]).unwrap(), Value::List(vec![Value::from("x")]));
        assert_eq!(render.call(&site("y"), &[]).unwrap(), Value::List(vec![Value::from("y")]));
    }

    #[test]
    fn test_document_with_layout() {
        let templates = MemorySource::new().with("index", ";layout:default\n[:p \"body\"]");
        let layouts = MemorySource::new().with("default", "[:h1 (:title site)]\ncontent");
        let compiler = Compiler::new(&templates, &layouts);

        let compiled = compiler.compile_template("index", true).unwrap();
        let tree = compiled.render.call(&site("home"), &[]).unwrap();
        let html = crate::render::serialize(&tree, compiled.format).unwrap();
        assert_eq!(html, "<h1>home</h1><p>body</p>");
    }

    #[test]
    fn test_document_without_layout_when_disallowed() {
        let templates = MemorySource::new().with("post", ";layout:default\n[:p \"body\"]");
        let layouts = MemorySource::new();
        let compiler = Compiler::new(&templates, &layouts);

        // the missing layout is never looked up
        let compiled = compiler.compile_template("post", false).unwrap();
        let tree = compiled.render.call(&Value::Nil, &[]).unwrap();
        assert_eq!(tree, Value::List(vec![p(vec![Value::from("body")])]));
    }

    #[test]
    fn test_document_fields_reach_layout() {
        let templates = MemorySource::new().with("about", ";title:About\n;layout:default\n\"x\"");
        let layouts = MemorySource::new().with("default", "[:title (:title site)]");
        let compiler = Compiler::new(&templates, &layouts);

        let compiled = compiler.compile_template("about", true).unwrap();
        let tree = compiled.render.call(&site("Site"), &[]).unwrap();
        assert_eq!(
            crate::render::serialize(&tree, None).unwrap(),
            "<title>About</title>"
        );
    }

    #[test]
    fn test_missing_layout() {
        let templates = MemorySource::new().with("index", ";layout:nope\n[:p]");
        let layouts = MemorySource::new();
        let compiler = Compiler::new(&templates, &layouts);

        let err = compiler.compile_template("index", true).unwrap_err();
        assert_eq!(err, TemplateError::MissingLayout("nope".into()));
    }

    #[test]
    fn test_missing_template() {
        let templates = MemorySource::new();
        let layouts = MemorySource::new();
        let compiler = Compiler::new(&templates, &layouts);

        assert!(matches!(
            compiler.compile_template("ghost", true),
            Err(TemplateError::MissingTemplate(_))
        ));
    }

    #[test]
    fn test_syntax_error_location_counts_header() {
        let templates = MemorySource::new().with("broken", ";title:x\n;layout:y\n[:p\n  (:title site]");
        let layouts = MemorySource::new();
        let compiler = Compiler::new(&templates, &layouts);

        let err = compiler.compile_template("broken", false).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Syntax {
                template: "broken".into(),
                line: 4,
                column: 15,
                message: "unexpected `]`".into(),
            }
        );
    }

    #[test]
    fn test_eval_error_reports_template() {
        let render = compile_body("page", "(nope 1)", 1).unwrap();
        let err = render.call(&Value::Nil, &[]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Eval {
                template: "page:1:1".into(),
                message: "unknown function `nope`".into(),
            }
        );
    }

    #[test]
    fn test_merge_site() {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::from("page"));

        let merged = merge_site(&Value::map([("title", Value::from("site")), ("x", Value::Int(1))]), &fields);
        assert_eq!(
            merged,
            Value::map([("title", Value::from("page")), ("x", Value::Int(1))])
        );
        assert_eq!(merge_site(&Value::Nil, &fields), Value::Map(fields.clone()));

        // non-map sites are left alone
        let list = Value::List(vec![Value::Int(1)]);
        assert_eq!(merge_site(&list, &fields), list);
    }
}
