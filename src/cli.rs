//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kasane static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name (default: kasane.toml)
    #[arg(short = 'C', long, global = true, default_value = "kasane.toml")]
    pub config: PathBuf,

    /// Output directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Template directory path (relative to project root)
    #[arg(short, long, global = true)]
    pub templates: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the Build command
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(long)]
    pub clean: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a starter site
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Render every template, post and tag page
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Render a single template
    Template {
        /// Template path, relative to the template directory
        path: PathBuf,
    },

    /// Render the page of a single tag
    Tag {
        /// Tag name
        name: String,
    },

    /// Evaluate one expression against the site context and print the markup
    Eval {
        /// Expression, e.g. `(count (:posts site))`
        expr: String,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}
