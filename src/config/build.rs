//! `[build]` section configuration.
//!
//! Source and output locations, URL patterns and output post-processing.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in kasane.toml.
///
/// # Example
/// ```toml
/// [build]
/// templates = "template"             # Source directory
/// output = "public"                  # Output directory
/// post_url = "/{year}/{slug}.html"   # Post output pattern
/// minify = true
/// ```
///
/// `layouts` and `posts` are resolved relative to `templates`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Template source directory.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Layout directory, relative to `templates`.
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Post directory, relative to `templates`.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Template file extension, without the dot.
    #[serde(default = "defaults::build::extension")]
    #[educe(Default = defaults::build::extension())]
    pub extension: String,

    /// Output URL pattern for posts: `{year}`, `{month}`, `{day}`, `{slug}`.
    #[serde(default = "defaults::build::post_url")]
    #[educe(Default = defaults::build::post_url())]
    pub post_url: String,

    /// Layout rendered for every tag page.
    #[serde(default = "defaults::build::tag_layout")]
    #[educe(Default = defaults::build::tag_layout())]
    pub tag_layout: String,

    /// Output URL pattern for tag pages: `{tag}`.
    #[serde(default = "defaults::build::tag_url")]
    #[educe(Default = defaults::build::tag_url())]
    pub tag_url: String,

    /// Minify output (removes whitespace).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Register the built-in `markdown` transformer.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub markdown: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}
