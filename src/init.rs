//! Site initialization module.
//!
//! Creates a starter site: default configuration, layouts, an index page,
//! a feed and one post.

use crate::{
    config::SiteConfig,
    log,
    utils::{
        date::{format_date, today},
        fs::write_output,
    },
};
use anyhow::{Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

const DEFAULT_LAYOUT: &str = r#";format:html5
[:html {:lang (:language (:base site))}
  [:head
    [:meta {:charset "utf-8"}]
    [:title (:title site (:title (:base site)))]]
  [:body
    [:header [:a {:href "/"} (:title (:base site))]]
    [:main content]]]
"#;

const POST_LAYOUT: &str = r#";layout:default
[:article
  [:h1 (:title site)]
  [:time (:date site)]
  content]
"#;

const TAG_LAYOUT: &str = r#";layout:default
[:h1 "Tagged " (:tag-name site)]
[:ul
  (for [post (:posts site)]
    [:li [:a {:href (:url post)} (:title post)]])]
"#;

const INDEX: &str = r#";layout:default
[:ul.posts
  (for [post (:posts site)]
    [:li [:a {:href (:url post)} (:title post)] " " (:date post)])]
[:ul.tags
  (for [tag (:tags site)]
    [:li [:a {:href (:url tag)} (:name tag) " (" (:count tag) ")"]])]
"#;

const FEED: &str = r#"(raw "<?xml version=\"1.0\" encoding=\"utf-8\"?>")
[:feed {:xmlns "http://www.w3.org/2005/Atom"}
  [:title (:title (:base site))]
  [:updated (:date site)]
  (for [post (take 10 (:posts site))]
    [:entry
      [:title (:title post)]
      [:link {:href (:url post)}]
      [:updated (:date post)]
      [:content {:type "html"} (:content post)]])]
"#;

const FIRST_POST: &str = r#";layout:post
;title:Hello
;tag:meta
[:markdown "Welcome! Edit this post under `template/_posts`."]
"#;

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // init in the current directory requires it to be empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `kasane init <SITE_NAME>` to create in a subdirectory."
        );
    }
    if config.build.templates.exists() {
        bail!(
            "Path `{}` already exists. Try `kasane init <SITE_NAME>` instead.",
            config.build.templates.display()
        );
    }

    init_default_config(config)?;
    init_templates(config)?;
    let output_name = config.build.output.file_name().unwrap_or_default();
    init_ignored_files(root, &[Path::new(output_name)])?;

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(config: &SiteConfig) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    write_output(&config.config_path, &content)
}

fn init_templates(config: &SiteConfig) -> Result<()> {
    let ext = &config.build.extension;
    let layouts = config.layouts_dir();
    let posts = config.posts_dir();
    let templates = &config.build.templates;

    write_output(&layouts.join(format!("default.{ext}")), DEFAULT_LAYOUT)?;
    write_output(&layouts.join(format!("post.{ext}")), POST_LAYOUT)?;
    write_output(&layouts.join(format!("{}.{ext}", config.build.tag_layout)), TAG_LAYOUT)?;
    write_output(&templates.join(format!("index.html.{ext}")), INDEX)?;
    write_output(&templates.join(format!("atom.xml.{ext}")), FEED)?;

    let first = format!("{}-hello.{ext}", format_date(today()));
    write_output(&posts.join(first), FIRST_POST)
}

/// Initialize .gitignore and .ignore files with specified paths
pub fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.to_str())
        .collect::<Vec<_>>()
        .join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{Builder, default_pipeline};
    use tempfile::TempDir;

    fn starter(dir: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.update_path_with_root(dir, Path::new("kasane.toml"));
        config
    }

    #[test]
    fn test_new_site_builds() {
        let dir = TempDir::new().unwrap();
        let config = starter(dir.path());
        new_site(&config, false).unwrap();

        let root = config.get_root();
        assert!(root.join("kasane.toml").exists());
        assert_eq!(fs::read_to_string(root.join(".gitignore")).unwrap(), "public");

        // the written config loads back
        let loaded = SiteConfig::from_path(&root.join("kasane.toml")).unwrap();
        assert_eq!(loaded.build.extension, "sx");

        let builder = Builder::new(&config, default_pipeline(&config));
        assert!(builder.build().unwrap());

        let index = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(index.starts_with("<!DOCTYPE html>"));
        assert!(index.contains(">Hello</a>"));
        assert!(config.build.output.join("atom.xml").exists());
        assert!(config.build.output.join("tag/meta.html").exists());
    }

    #[test]
    fn test_new_site_refuses_non_empty_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let config = starter(dir.path());

        assert!(new_site(&config, false).is_err());
    }

    #[test]
    fn test_new_site_refuses_existing_templates() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("template")).unwrap();
        let config = starter(dir.path());

        assert!(new_site(&config, true).is_err());
    }
}
