//! Kasane - a static site generator built on layered s-expression templates.

mod build;
mod cli;
mod config;
mod init;
mod logger;
mod render;
mod site;
mod template;
mod utils;

use anyhow::{Result, bail};
use build::{Builder, default_pipeline};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use std::{path::Path, process::ExitCode};

fn main() -> Result<ExitCode> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config = load_config(cli)?;

    let ok = match &cli.command {
        Commands::Init { name } => {
            new_site(&config, name.is_some())?;
            true
        }
        Commands::Build { .. } => Builder::new(&config, default_pipeline(&config)).build()?,
        Commands::Template { path } => {
            Builder::new(&config, default_pipeline(&config)).compile_template(path)
        }
        Commands::Tag { name } => Builder::new(&config, default_pipeline(&config)).compile_tag(name),
        Commands::Eval { expr } => {
            let output = Builder::new(&config, default_pipeline(&config)).eval(expr)?;
            println!("{output}");
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = match (config_path.exists(), cli.is_init()) {
        (true, false) => SiteConfig::from_path(&config_path)?,
        (false, false) => bail!("Config file not found: {}", config_path.display()),
        (_, true) => SiteConfig::default(),
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
