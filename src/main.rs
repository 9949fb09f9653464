// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot CLI - WCAG 2.1 AA page scanner

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wcagbot::config::{self, Config, RenderConfig, RenderEngine};
use wcagbot::findings::ScanSnapshot;
use wcagbot::fix;
use wcagbot::render::{BrowserRenderer, Renderer, StaticRenderer};
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::scanner;
use wcagbot::store::SnapshotStore;

/// Scan a web page for WCAG 2.1 AA issues and apply automated fixes
#[derive(Parser)]
#[command(name = "wcagbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page and report findings
    Scan {
        /// URL or local HTML file
        url: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the scan snapshot as JSON for `fix-snapshot`
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Rendering engine (overrides the config file)
        #[arg(long)]
        engine: Option<EngineArg>,

        /// Config file (defaults to .wcagbot.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Scan a page and write the patched HTML
    Fix {
        /// URL or local HTML file
        url: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rendering engine (overrides the config file)
        #[arg(long)]
        engine: Option<EngineArg>,

        /// Config file (defaults to .wcagbot.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Apply fixes to a snapshot saved by `scan --snapshot`
    FixSnapshot {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file (defaults to .wcagbot.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable verbose logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (.yml or .toml)
        path: Option<PathBuf>,
    },
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

/// Rendering engine CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    /// Headless Chrome
    Browser,
    /// Built-in cascade, no browser needed
    Static,
}

impl From<EngineArg> for RenderEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Browser => RenderEngine::Browser,
            EngineArg::Static => RenderEngine::Static,
        }
    }
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("wcagbot=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("wcagbot={}", level)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<&Path>, verbose: bool) -> anyhow::Result<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config(&path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    init_logging(verbose, &config.log.level);
    Ok(config)
}

fn build_renderer(config: &RenderConfig, engine: Option<EngineArg>) -> anyhow::Result<Box<dyn Renderer>> {
    let renderer: Box<dyn Renderer> = match engine.map(RenderEngine::from).unwrap_or(config.engine) {
        RenderEngine::Browser => Box::new(BrowserRenderer::new(config)),
        RenderEngine::Static => Box::new(StaticRenderer::new(config)?),
    };
    Ok(renderer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { url, format, output, snapshot, engine, config, verbose } => {
            let config = load(config.as_deref(), verbose)?;
            let renderer = build_renderer(&config.render, engine)?;
            let result = scanner::scan(&url, renderer.as_ref(), &config).await?;

            if let Some(path) = snapshot {
                std::fs::write(&path, result.to_json()?)
                    .with_context(|| format!("writing snapshot to {}", path.display()))?;
                eprintln!("Snapshot written to {}", path.display());
            }

            let report = generate_report(&result, format.into());
            write_output(&report, output.as_deref())?;

            if result.has_high_severity() {
                std::process::exit(1);
            }
        }

        Commands::Fix { url, output, engine, config, verbose } => {
            let config = load(config.as_deref(), verbose)?;
            let renderer = build_renderer(&config.render, engine)?;
            let store = SnapshotStore::new();
            store.publish(scanner::scan(&url, renderer.as_ref(), &config).await?).await;

            let html = store.apply_fixes(&config.fix).await?;
            write_output(&html, output.as_deref())?;
        }

        Commands::FixSnapshot { snapshot, output, config, verbose } => {
            let config = load(config.as_deref(), verbose)?;
            let content = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
            let saved = ScanSnapshot::from_json(&content)?;

            let html = fix::apply_fixes(&saved, &config.fix)?;
            write_output(&html, output.as_deref())?;
        }

        Commands::InitConfig { path } => {
            init_logging(false, "warn");
            let path = path.unwrap_or_else(config::default_config_path);
            config::write_default_config(&path)?;
            eprintln!("Default configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Output written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
