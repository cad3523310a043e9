//! adsieve CLI
//!
//! Compile a filter list, decide single requests and inspect generated
//! stylesheets without a browser.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use sieve_engine::{Config, Engine, MatchDecision};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "adsieve filter list compiler and tools")]
struct Cli {
    /// Log per-request decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// JSON configuration file
    #[arg(short, long, conflicts_with = "list")]
    config: Option<PathBuf>,

    /// Filter list to use with default settings
    #[arg(short, long)]
    list: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter list and report what it contains
    Compile {
        #[command(flatten)]
        source: Source,
    },

    /// Decide whether a request would be blocked
    Check {
        #[command(flatten)]
        source: Source,

        /// Request URL
        url: String,

        /// URL of the top-level page, for third-party rules
        #[arg(short, long)]
        page: Option<String>,

        /// MIME type of the response
        #[arg(short = 't', long)]
        content_type: Option<String>,
    },

    /// Print the stylesheet generated for a host
    Stylesheet {
        #[command(flatten)]
        source: Source,

        /// Page host
        host: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let result = match cli.command {
        Commands::Compile { source } => cmd_compile(&source),
        Commands::Check {
            source,
            url,
            page,
            content_type,
        } => cmd_check(&source, &url, page.as_deref(), content_type.as_deref()),
        Commands::Stylesheet { source, host } => cmd_stylesheet(&source, &host),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(source: &Source) -> Result<Config, String> {
    match (&source.config, &source.list) {
        (Some(path), _) => Config::load(path).map_err(|e| e.to_string()),
        (None, Some(list)) => Ok(Config::with_filter_list(list)),
        (None, None) => Ok(Config::default()),
    }
}

fn start_engine(source: &Source) -> Result<Engine, String> {
    let config = load_config(source)?;
    Engine::new(&config).map_err(|e| e.to_string())
}

fn cmd_compile(source: &Source) -> Result<(), String> {
    let start = Instant::now();
    let engine = start_engine(source)?;
    let elapsed = start.elapsed();
    let stats = engine.stats();

    println!("Compiled filter list");
    println!("  Lines:      {}", stats.lines);
    println!("  Blocking:   {}", stats.network_rules);
    println!("  Exceptions: {}", stats.exception_rules);
    println!("  Hiding:     {} scoped, {} general", stats.hiders, stats.general_selectors);
    println!("  Ignored:    {}", stats.ignored);
    println!("  Dropped:    {}", stats.dropped);
    println!("  Time:       {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_check(
    source: &Source,
    url: &str,
    page: Option<&str>,
    content_type: Option<&str>,
) -> Result<(), String> {
    let engine = start_engine(source)?;

    match engine.check_request(url, page, content_type) {
        MatchDecision::Block => println!("block {url}"),
        MatchDecision::Allow => println!("allow {url}"),
    }

    Ok(())
}

fn cmd_stylesheet(source: &Source, host: &str) -> Result<(), String> {
    let engine = start_engine(source)?;

    let path = engine
        .stylesheet_for(host)
        .ok_or_else(|| format!("Failed to generate stylesheet for '{}'", host))?;
    let css = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    log::debug!("stylesheet for {} at {}", host, path.display());
    print!("{css}");

    Ok(())
}
