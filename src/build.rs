//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build()
//!     │
//!     ├── clean_output()            when [build] clean
//!     │
//!     ├── compile_all_templates()
//!     │       ├── templates/**/*.sx   (skipping `_` directories)
//!     │       └── templates/_posts/*  (with their layouts)
//!     │
//!     └── compile_all_tags()        one page per tag via [build] tag_layout
//! ```
//!
//! Every output unit is compiled, rendered against a fresh `site` value,
//! passed through the pipeline once, serialized, minified and written. A
//! failing unit is logged and the rest continue.

use crate::{
    config::SiteConfig,
    log,
    logger::Progress,
    render::{MinifyType, markdown_transformer, minify, serialize},
    site::{PostEntry, Site},
    template::{CompiledTemplate, Compiler, FsSource, Pipeline, Value, read_source},
    utils::{
        date::{derive_date, today},
        fs::{clean_output, list_files, write_output},
        slug::{output_path, tag_url, template_url},
    },
};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

/// The pipeline every build starts from.
pub fn default_pipeline(config: &SiteConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();
    if config.build.markdown {
        pipeline.add_transformer(markdown_transformer);
    }
    pipeline
}

pub struct Builder<'a> {
    config: &'a SiteConfig,
    templates: FsSource,
    layouts: FsSource,
    pipeline: Rc<Pipeline>,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a SiteConfig, pipeline: Pipeline) -> Self {
        let ext = &config.build.extension;
        Self {
            config,
            templates: FsSource::new(&config.build.templates, ext),
            layouts: FsSource::new(config.layouts_dir(), ext),
            pipeline: Rc::new(pipeline),
        }
    }

    fn compiler(&self) -> Compiler<'_> {
        Compiler::new(&self.templates, &self.layouts)
    }

    fn load_site(&self) -> Site<'a> {
        Site::load(self.config, &self.compiler(), Rc::clone(&self.pipeline))
    }

    /// Clean if asked, then render every template, post and tag page.
    pub fn build(&self) -> Result<bool> {
        if self.config.build.clean {
            clean_output(&self.config.build.output)?;
        }
        if !self.pipeline.is_empty() {
            log!("build"; "{} transformers registered", self.pipeline.len());
        }

        let site = self.load_site();
        let templates_ok = self.compile_templates_with(&site);
        let tags_ok = self.compile_tags_with(&site);

        if templates_ok && tags_ok {
            log!("build"; "done");
        } else {
            log!("build"; "finished with errors");
        }
        Ok(templates_ok && tags_ok)
    }

    /// Render one template, or one post when `path` is inside the post directory.
    pub fn compile_template(&self, path: &Path) -> bool {
        let site = self.load_site();
        let path = self.config.build.templates.join(path);
        let result = if path.starts_with(self.config.posts_dir()) {
            match site.posts.iter().find(|post| post.source == path) {
                Some(post) => self.render_post(&site, post),
                // failed to load; already logged
                None => return false,
            }
        } else {
            self.render_template(&site, &path)
        };
        report(&path.display().to_string(), result)
    }

    /// Render the page of one tag.
    pub fn compile_tag(&self, name: &str) -> bool {
        let site = self.load_site();
        report(&format!("tag `{name}`"), self.render_tag(&site, name))
    }

    /// Render every regular template and every post.
    pub fn compile_all_templates(&self) -> bool {
        self.compile_templates_with(&self.load_site())
    }

    /// Render a page for every tag in use.
    pub fn compile_all_tags(&self) -> bool {
        self.compile_tags_with(&self.load_site())
    }

    /// Evaluate a single expression with today's site context and
    /// serialize the result.
    pub fn eval(&self, expr: &str) -> Result<String> {
        let render = self.pipeline.compile_expr(expr)?;
        let site = self.load_site();
        let tree = self.pipeline.transform(render.call(&site.context(today(), None), &[])?);
        Ok(serialize(&tree, None)?)
    }

    fn compile_templates_with(&self, site: &Site<'_>) -> bool {
        let templates = list_files(&self.config.build.templates, &self.config.build.extension, true);
        log!("compile"; "{} templates, {} posts", templates.len(), site.posts.len());

        let progress = Progress::new("compile", templates.len() + site.posts.len());
        let mut ok = site.failed == 0;
        for path in &templates {
            ok &= report(&path.display().to_string(), self.render_template(site, path));
            progress.inc();
        }
        for post in &site.posts {
            ok &= report(&post.source.display().to_string(), self.render_post(site, post));
            progress.inc();
        }
        progress.finish();
        ok
    }

    fn compile_tags_with(&self, site: &Site<'_>) -> bool {
        if site.tags.is_empty() {
            return true;
        }
        log!("compile"; "{} tags", site.tags.len());

        // slugified urls can collide for distinct names, e.g. `Rust` and `rust`
        let mut claimed: FxHashMap<String, &str> = FxHashMap::default();
        let mut ok = true;
        for tag in &site.tags {
            let unit = format!("tag `{}`", tag.name);
            let url = tag_url(&self.config.build.tag_url, &tag.name);
            if let Some(owner) = claimed.get(&url) {
                log!("error"; "{unit}: output {url} already written for tag `{owner}`");
                ok = false;
                continue;
            }
            claimed.insert(url, &tag.name);
            ok &= report(&unit, self.render_tag(site, &tag.name));
        }
        ok
    }

    fn render_template(&self, site: &Site<'_>, path: &Path) -> Result<PathBuf> {
        let relative = path
            .strip_prefix(&self.config.build.templates)
            .with_context(|| format!("not inside the template directory: {}", path.display()))?;
        let name = relative.to_string_lossy();

        let compiled = self.compiler().compile_template(&name, true)?;
        let date = derive_date(path, compiled.options.date);
        let url = template_url(relative, &self.config.build.extension);
        self.write_unit(&compiled, &site.context(date, None), &url)
    }

    fn render_post(&self, site: &Site<'_>, post: &PostEntry) -> Result<PathBuf> {
        let raw = read_source(&post.source)?;
        let name = post.source.display().to_string();
        let compiled = self.compiler().compile_document(&name, &raw, true)?;

        let mut context = site.context(post.date, None);
        if let Value::Map(map) = &mut context {
            map.insert("url".into(), Value::from(post.url.as_str()));
            map.insert("post".into(), post.to_value(&self.config.build.tag_url));
        }
        self.write_unit(&compiled, &context, &post.url)
    }

    fn render_tag(&self, site: &Site<'_>, name: &str) -> Result<PathBuf> {
        if !site.tags.iter().any(|tag| tag.name == name) {
            bail!("no post is tagged `{name}`");
        }

        let compiled = self
            .compiler()
            .compile_layout_document(&self.config.build.tag_layout)?;
        let url = tag_url(&self.config.build.tag_url, name);
        self.write_unit(&compiled, &site.context(today(), Some(name)), &url)
    }

    /// Render, transform, serialize, minify and write one output unit.
    fn write_unit(&self, compiled: &CompiledTemplate, site: &Value, url: &str) -> Result<PathBuf> {
        let tree = self.pipeline.transform(compiled.render.call(site, &[])?);
        let html = serialize(&tree, compiled.format)?;

        let path = output_path(&self.config.build.output, url);
        let html = minify(&html, MinifyType::for_output(&path, compiled.format), self.config);
        write_output(&path, &html)?;
        Ok(path)
    }
}

fn report(unit: &str, result: Result<PathBuf>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            log!("error"; "{unit}: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn site_dir() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "kasane.toml",
            "[base]\ntitle = \"Blog\"\n[extra]\nmotto = \"hi\"\n",
        );
        write(
            root,
            "template/_layouts/default.sx",
            ";format:html5\n[:html [:head [:title (:title site)]] [:body content]]",
        );
        write(root, "template/_layouts/post.sx", ";layout:default\n[:article content]");
        write(
            root,
            "template/_layouts/tag.sx",
            ";layout:default\n[:h1 (:tag-name site)]\n(for [p (:posts site)] [:a {:href (:url p)} (:title p)])",
        );
        write(
            root,
            "template/index.html.sx",
            ";layout:default\n;title:Home\n[:p (:motto (:extra site))]\n(for [p (:posts site)] [:li (:title p)])",
        );
        write(
            root,
            "template/atom.xml.sx",
            "(raw \"<?xml version=\\\"1.0\\\"?>\")\n[:feed (for [p (:posts site)] [:entry (:content p)])]",
        );
        write(
            root,
            "template/_posts/2024-01-01-first.sx",
            ";layout:post\n;title:First\n;tag:rust\n[:p \"one\"]",
        );
        write(
            root,
            "template/_posts/2024-02-01-second.sx",
            ";layout:post\n;title:Second\n;tag:rust, web\n[:markdown \"*two*\"]",
        );

        let mut config = SiteConfig::from_path(&root.join("kasane.toml")).unwrap();
        config.update_path_with_root(root, Path::new("kasane.toml"));
        (dir, config)
    }

    fn read(config: &SiteConfig, rel: &str) -> String {
        fs::read_to_string(config.build.output.join(rel)).unwrap()
    }

    #[test]
    fn test_build_site() {
        let (_dir, config) = site_dir();
        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(builder.build().unwrap());

        assert_eq!(
            read(&config, "index.html"),
            "<!DOCTYPE html>\n<html><head><title>Home</title></head><body><p>hi</p><li>Second</li><li>First</li></body></html>"
        );
        assert_eq!(
            read(&config, "2024/02/second.html"),
            "<!DOCTYPE html>\n<html><head><title>Second</title></head><body><article><p><em>two</em></p>\n</article></body></html>"
        );
        assert!(config.build.output.join("2024/01/first.html").exists());
        assert_eq!(
            read(&config, "atom.xml"),
            "<?xml version=\"1.0\"?><feed><entry>&lt;p&gt;&lt;em&gt;two&lt;/em&gt;&lt;/p&gt;\n</entry><entry>&lt;p&gt;one&lt;/p&gt;</entry></feed>"
        );

        let rust = read(&config, "tag/rust.html");
        assert!(rust.contains("<h1>rust</h1>"));
        assert!(rust.contains(r#"<a href="/2024/02/second.html">Second</a><a href="/2024/01/first.html">First</a>"#));
        let web = read(&config, "tag/web.html");
        assert!(!web.contains("First"));

        // layouts and posts are not rendered as regular templates
        assert!(!config.build.output.join("_layouts").exists());
        assert!(!config.build.output.join("_posts").exists());
    }

    #[test]
    fn test_failing_unit_does_not_stop_batch() {
        let (dir, config) = site_dir();
        write(dir.path(), "template/broken.sx", ";layout:nowhere\n[:p]");
        write(dir.path(), "template/cycle.sx", ";layout:a\n[:p]");
        write(dir.path(), "template/_layouts/a.sx", ";layout:b\ncontent");
        write(dir.path(), "template/_layouts/b.sx", ";layout:a\ncontent");

        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(!builder.compile_all_templates());
        assert!(config.build.output.join("index.html").exists());
        assert!(config.build.output.join("2024/01/first.html").exists());
        assert!(!config.build.output.join("broken.html").exists());
        assert!(!config.build.output.join("cycle.html").exists());
    }

    #[test]
    fn test_compile_single_units() {
        let (_dir, config) = site_dir();
        let builder = Builder::new(&config, default_pipeline(&config));

        assert!(builder.compile_template(Path::new("index.html.sx")));
        assert!(builder.compile_template(Path::new("_posts/2024-01-01-first.sx")));
        assert!(!builder.compile_template(Path::new("missing.sx")));
        assert!(config.build.output.join("index.html").exists());
        assert!(config.build.output.join("2024/01/first.html").exists());

        assert!(builder.compile_tag("web"));
        assert!(!builder.compile_tag("nope"));
        assert!(config.build.output.join("tag/web.html").exists());
        assert!(!config.build.output.join("tag/rust.html").exists());
    }

    #[test]
    fn test_tag_url_clash_fails() {
        let (dir, config) = site_dir();
        write(
            dir.path(),
            "template/_posts/2024-03-01-third.sx",
            ";layout:post\n;title:Third\n;tag:Rust\n[:p \"three\"]",
        );

        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(!builder.compile_all_tags());

        // `Rust` sorts first and keeps the page; `rust` is refused
        let page = read(&config, "tag/rust.html");
        assert!(page.contains("Third"));
        assert!(!page.contains("First"));
        assert!(config.build.output.join("tag/web.html").exists());
    }

    #[test]
    fn test_eval_expression() {
        let (_dir, config) = site_dir();
        let builder = Builder::new(&config, default_pipeline(&config));

        assert_eq!(builder.eval("(count (:posts site))").unwrap(), "2");
        assert_eq!(
            builder.eval("[:b (:title (first (:posts site)))]").unwrap(),
            "<b>Second</b>"
        );
        assert!(builder.eval("(+ 1").is_err());
    }

    #[test]
    fn test_markdown_transformer_optional() {
        let (_dir, mut config) = site_dir();
        config.build.markdown = false;
        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(builder.compile_template(Path::new("_posts/2024-02-01-second.sx")));

        let html = read(&config, "2024/02/second.html");
        assert!(html.contains("<markdown>*two*</markdown>"));
    }

    #[test]
    fn test_minify_and_clean() {
        let (_dir, mut config) = site_dir();
        write(&config.build.output, "stale.html", "old");
        config.build.clean = true;
        config.build.minify = true;

        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(builder.build().unwrap());
        assert!(!config.build.output.join("stale.html").exists());
        let html = read(&config, "index.html");
        assert!(!html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<title>Home</title>"));
    }
}
