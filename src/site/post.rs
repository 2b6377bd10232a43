//! Post entries.
//!
//! # Fields
//!
//! | Field | Example | Used By |
//! |-------|---------|---------|
//! | `source` | `template/_posts/2024-03-01-hello.sx` | build, logging |
//! | `slug` | `hello` | `post_url` |
//! | `url` | `/2024/03/hello.html` | build output, `(:url post)` |
//! | `date` | `2024-03-01` | sorting, `(:date post)` |
//! | `content` | deferred escaped markup | feeds, `(:content post)` |

use crate::{
    render::{escape, serialize},
    template::{Compiler, Deferred, DocumentOptions, Pipeline, Value, read_source},
    utils::{
        date::{derive_date, format_date},
        slug::{post_slug, post_url, tag_url},
    },
};
use chrono::NaiveDate;
use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

/// A post and everything derived from it.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub source: PathBuf,
    pub options: DocumentOptions,
    pub slug: String,
    pub url: String,
    pub date: NaiveDate,
    /// Body rendered without layout, computed on first access.
    pub content: Deferred,
}

/// Settings shared by every post of a build.
pub struct PostSettings<'a> {
    pub post_url: &'a str,
    pub tag_url: &'a str,
    /// Site metadata visible while rendering post content.
    pub base: Value,
    pub pipeline: Rc<Pipeline>,
}

impl PostEntry {
    /// Read and compile a post.
    ///
    /// Syntax errors surface here; rendering the content waits until it is
    /// first read.
    pub fn load(
        path: &Path,
        compiler: &Compiler<'_>,
        settings: &PostSettings<'_>,
    ) -> anyhow::Result<Self> {
        let raw = read_source(path)?;
        let name = path.display().to_string();
        let compiled = compiler.compile_document(&name, &raw, false)?;

        let date = derive_date(path, compiled.options.date);
        let slug = post_slug(path);
        let url = post_url(settings.post_url, date, &slug);

        // only the post itself and the site metadata, never the post list
        let site = Value::map([
            ("base", settings.base.clone()),
            ("date", Value::from(format_date(date))),
            ("url", Value::from(url.as_str())),
        ]);
        let pipeline = Rc::clone(&settings.pipeline);
        let render = compiled.render;
        let content = Deferred::new(move || {
            let tree = pipeline.transform(render.call(&site, &[])?);
            let html = serialize(&tree, None)?;
            Ok(Value::Raw(escape(&html).into_owned()))
        });

        Ok(Self {
            source: path.to_path_buf(),
            options: compiled.options,
            slug,
            url,
            date,
            content,
        })
    }

    /// Escaped rendered body.
    pub fn content(&self) -> Result<Value, crate::template::TemplateError> {
        self.content.force()
    }

    /// Whether the post carries every tag in `filter`.
    pub fn has_tags(&self, filter: &[&str]) -> bool {
        filter.iter().all(|tag| self.options.has_tag(tag))
    }

    /// Map exposed to templates.
    pub fn to_value(&self, tag_url_pattern: &str) -> Value {
        let title = self
            .options
            .title
            .as_deref()
            .map_or(Value::Nil, Value::from);
        let tags = self
            .options
            .tags
            .iter()
            .map(|tag| {
                Value::map([
                    ("name", Value::from(tag.name.as_str())),
                    ("url", Value::from(tag_url(tag_url_pattern, &tag.name))),
                ])
            })
            .collect();

        Value::map([
            ("title", title),
            ("url", Value::from(self.url.as_str())),
            ("slug", Value::from(self.slug.as_str())),
            ("date", Value::from(format_date(self.date))),
            ("tags", Value::List(tags)),
            ("content", Value::Deferred(self.content.clone())),
        ])
    }
}

/// Newest first; posts sharing a date keep their enumeration order.
pub fn sort_posts(posts: &mut [PostEntry]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{MemorySource, Node};
    use std::{cell::Cell, fs};
    use tempfile::TempDir;

    fn settings(pipeline: Pipeline) -> PostSettings<'static> {
        PostSettings {
            post_url: "/{year}/{month}/{slug}.html",
            tag_url: "/tag/{tag}.html",
            base: Value::map([("title", Value::from("Site"))]),
            pipeline: Rc::new(pipeline),
        }
    }

    fn write_post(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_post() {
        let dir = TempDir::new().unwrap();
        let path = write_post(
            dir.path(),
            "2024-03-01-hello.sx",
            ";title:Hello\n;tag:rust, web\n;layout:missing\n[:p (:title site) \" & \" (:title (:base site))]",
        );
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);

        let post = PostEntry::load(&path, &compiler, &settings(Pipeline::new())).unwrap();
        assert_eq!(post.slug, "hello");
        assert_eq!(post.url, "/2024/03/hello.html");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(post.has_tags(&["rust"]));
        assert!(post.has_tags(&["rust", "web"]));
        assert!(post.has_tags(&[]));
        assert!(!post.has_tags(&["rust", "go"]));

        // rendered without the (missing) layout, then escaped
        assert_eq!(
            post.content().unwrap(),
            Value::Raw("&lt;p&gt;Hello &amp;amp; Site&lt;/p&gt;".into())
        );
    }

    #[test]
    fn test_content_is_computed_once() {
        let dir = TempDir::new().unwrap();
        let path = write_post(dir.path(), "a.sx", "[:p \"x\"]");
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut pipeline = Pipeline::new();
        pipeline.add_transformer(move |v| {
            counter.set(counter.get() + 1);
            v
        });

        let post = PostEntry::load(&path, &compiler, &settings(pipeline)).unwrap();
        assert!(!post.content.is_forced());
        let first = post.content().unwrap();
        let second = post.content().unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_content_goes_through_pipeline() {
        let dir = TempDir::new().unwrap();
        let path = write_post(dir.path(), "a.sx", "[:p \"x\"]");
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);

        let mut pipeline = Pipeline::new();
        pipeline.add_transformer(|v| {
            v.map_nodes(&|mut node: Node| {
                node.tag = "em".into();
                Value::Node(node)
            })
        });

        let post = PostEntry::load(&path, &compiler, &settings(pipeline)).unwrap();
        assert_eq!(post.content().unwrap(), Value::Raw("&lt;em&gt;x&lt;/em&gt;".into()));
    }

    #[test]
    fn test_syntax_error_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = write_post(dir.path(), "bad.sx", "[:p");
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);

        assert!(PostEntry::load(&path, &compiler, &settings(Pipeline::new())).is_err());
    }

    #[test]
    fn test_to_value() {
        let dir = TempDir::new().unwrap();
        let path = write_post(dir.path(), "2024-01-05-x.sx", ";title:X\n;tag:Rust Lang\n\"body\"");
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);
        let post = PostEntry::load(&path, &compiler, &settings(Pipeline::new())).unwrap();

        let value = post.to_value("/tag/{tag}.html");
        let field = |k: &str| value.field(&Value::Keyword(k.into())).unwrap();
        assert_eq!(field("title"), Value::from("X"));
        assert_eq!(field("date"), Value::from("2024-01-05"));
        assert_eq!(field("url"), Value::from("/2024/01/x.html"));
        assert_eq!(
            field("tags"),
            Value::List(vec![Value::map([
                ("name", Value::from("Rust")),
                ("url", Value::from("/tag/rust.html")),
            ]),
            Value::map([
                ("name", Value::from("Lang")),
                ("url", Value::from("/tag/lang.html")),
            ])])
        );
        // reading content through a field lookup forces it
        assert_eq!(field("content"), Value::Raw("body".into()));
    }

    #[test]
    fn test_sort_posts_is_stable() {
        let dir = TempDir::new().unwrap();
        let sources = MemorySource::new();
        let compiler = Compiler::new(&sources, &sources);
        let settings = settings(Pipeline::new());

        let mut posts: Vec<_> = [
            ("a.sx", "2024-01-01"),
            ("b.sx", "2024-02-01"),
            ("c.sx", "2024-01-01"),
        ]
        .iter()
        .map(|(name, date)| {
            let path = write_post(dir.path(), name, &format!(";date:{date}\n\"x\""));
            PostEntry::load(&path, &compiler, &settings).unwrap()
        })
        .collect();

        sort_posts(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["b", "a", "c"]);
    }
}
