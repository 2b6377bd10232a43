//! Site-wide data handed to templates.
//!
//! # Architecture
//!
//! ```text
//! Site::load()
//!     │
//!     ├── list_files(posts_dir)     sorted post sources
//!     ├── PostEntry::load()         options, date, url, deferred content
//!     ├── sort_posts()              newest first
//!     └── get_tags()                counted, alphabetical
//!
//! Site::context(date, tag)  ──►  `site` value for one output unit
//! ```

mod post;
mod tag;

pub use post::{PostEntry, PostSettings, sort_posts};
pub use tag::{Tag, count_tags, get_tags};

use crate::{
    config::SiteConfig,
    log,
    template::{Compiler, Map, Pipeline, Value},
    utils::{
        date::format_date,
        fs::list_files,
        slug::tag_url,
    },
};
use chrono::NaiveDate;
use std::rc::Rc;

/// Posts and tags of one build.
pub struct Site<'a> {
    config: &'a SiteConfig,
    pub posts: Vec<PostEntry>,
    pub tags: Vec<Tag>,
    /// Posts that failed to load; already logged.
    pub failed: usize,
    base: Value,
    extra: Value,
}

impl<'a> Site<'a> {
    /// Enumerate and load every post.
    pub fn load(config: &'a SiteConfig, compiler: &Compiler<'_>, pipeline: Rc<Pipeline>) -> Self {
        let base = base_value(config);
        let settings = PostSettings {
            post_url: &config.build.post_url,
            tag_url: &config.build.tag_url,
            base: base.clone(),
            pipeline,
        };

        let mut posts = Vec::new();
        let mut failed = 0;
        for path in list_files(&config.posts_dir(), &config.build.extension, false) {
            match PostEntry::load(&path, compiler, &settings) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    failed += 1;
                    log!("error"; "{}: {:#}", path.display(), e);
                }
            }
        }
        sort_posts(&mut posts);
        let tags = get_tags(&posts);

        Self {
            config,
            posts,
            tags,
            failed,
            base,
            extra: extra_value(config),
        }
    }

    /// Posts carrying every tag in `filter`, newest first.
    pub fn get_posts(&self, filter: &[&str]) -> Vec<&PostEntry> {
        self.posts.iter().filter(|post| post.has_tags(filter)).collect()
    }

    /// The `site` value for one output unit.
    ///
    /// Tag pages pass their tag: `posts` is narrowed to it and `tag-name` set.
    pub fn context(&self, date: NaiveDate, tag: Option<&str>) -> Value {
        let filter: Vec<&str> = tag.into_iter().collect();
        let tag_pattern = &self.config.build.tag_url;

        let posts = self
            .get_posts(&filter)
            .into_iter()
            .map(|post| post.to_value(tag_pattern))
            .collect();
        let tags = self
            .tags
            .iter()
            .map(|tag| {
                Value::map([
                    ("name", Value::from(tag.name.as_str())),
                    ("count", Value::Int(i64::try_from(tag.count).unwrap_or(i64::MAX))),
                    ("url", Value::from(tag_url(tag_pattern, &tag.name))),
                ])
            })
            .collect();

        let mut site = Map::new();
        site.insert("posts".into(), Value::List(posts));
        site.insert("tags".into(), Value::List(tags));
        site.insert("date".into(), Value::from(format_date(date)));
        site.insert("base".into(), self.base.clone());
        site.insert("extra".into(), self.extra.clone());
        if let Some(tag) = tag {
            site.insert("tag-name".into(), Value::from(tag));
        }
        Value::Map(site)
    }
}

/// `[base]` as a template value.
pub fn base_value(config: &SiteConfig) -> Value {
    let base = &config.base;
    Value::map([
        ("title", Value::from(base.title.as_str())),
        ("description", Value::from(base.description.as_str())),
        ("author", Value::from(base.author.as_str())),
        ("email", Value::from(base.email.as_str())),
        ("url", base.url.as_deref().map_or(Value::Nil, Value::from)),
        ("language", Value::from(base.language.as_str())),
    ])
}

fn extra_value(config: &SiteConfig) -> Value {
    Value::Map(
        config
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), toml_to_value(v)))
            .collect(),
    )
}

/// Convert a TOML value; datetimes become their string form.
pub fn toml_to_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_value(v)))
                .collect(),
        ),
    }
}
