//! Prerender CLI
//!
//! Reads the settings file, crawls the site and writes the static pages.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use spa_prerender::settings::DEFAULT_CONFIG_FILE;
use spa_prerender::{Backend, EngineConfig, Settings};

/// Statically prerender a single-page application
#[derive(Parser, Debug)]
#[command(name = "prerender", version, about)]
struct Cli {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the site root from the settings file
    #[arg(long)]
    root: Option<PathBuf>,

    /// Engine used to render pages (defaults to Chrome when built with `cdp`)
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Write a JSON report of the rendered routes to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    /// Headless Chrome, runs the app
    Chrome,
    /// Plain HTTP fetch, no JavaScript
    Http,
}

impl From<EngineArg> for Backend {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Chrome => Backend::Chrome,
            EngineArg::Http => Backend::Http,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    if let Some(root) = cli.root {
        settings.root = root;
    }
    log::debug!("Settings: {}", serde_json::to_string(&settings)?);

    let backend = cli.engine.map(Backend::from).unwrap_or_default();
    if !backend.runs_javascript() {
        log::warn!(
            "Rendering with the HTTP engine: the app's JavaScript does not run, pages are written as served"
        );
    }

    let config = EngineConfig {
        enable_javascript: backend.runs_javascript(),
        ..Default::default()
    };
    let report = spa_prerender::prerender_using(backend, config, &settings)
        .context("Prerendering failed")?;
    log::info!(
        "Prerendered {} routes into {}",
        report.rendered.len(),
        settings.root.display()
    );

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report saved to {}", path.display());
    }

    Ok(())
}
