use anyhow::{Context, Result};
use clap::Parser;
use nidx::config::EngineConfig;
use nidx::error::ConfigError;
use nidx::ingest::{ProcessingEngine, StealPolicy};
use nidx::numa::{StaticTopology, SysfsTopology, Topology};
use nidx::output;
use nidx::tokenize::TokenizerKind;
use nidx::utils::app_data::AppConfig;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nidx")]
#[command(about = "NUMA-aware file ingestion and tokenization")]
struct Cli {
    /// Number of tokenizer threads
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    threads: u32,

    /// Pin tokenizer threads to their NUMA node (0 = off, 1 = on)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    affinity: u8,

    /// Tokenizer strategy: branchless, pattern or delimiter
    #[arg(short, long)]
    strategy: Option<TokenizerKind>,

    /// What a thread does when its node's queue is empty: local or cross-node
    #[arg(long)]
    steal: Option<StealPolicy>,

    /// Pretend the machine has N NUMA nodes (pinning becomes a no-op)
    #[arg(long, value_name = "N")]
    simulate_nodes: Option<usize>,

    /// Leave loaded files in the page cache
    #[arg(long)]
    keep_page_cache: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Index PATH once and exit instead of starting the command loop
    #[arg(long, value_name = "PATH")]
    index: Option<PathBuf>,

    /// Persist --strategy, --steal and the page cache setting as defaults
    #[arg(long)]
    save_defaults: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut app = AppConfig::load().unwrap_or_else(|e| {
        error!("Ignoring saved defaults: {:#}", e);
        AppConfig::default()
    });
    if let Some(strategy) = cli.strategy {
        app.tokenizer = strategy;
    }
    if let Some(steal) = cli.steal {
        app.steal_policy = steal;
    }
    if cli.keep_page_cache {
        app.drop_page_cache = false;
    }
    if cli.save_defaults {
        app.save().context("Failed to save defaults")?;
        info!("Saved defaults");
    }

    let config = EngineConfig::from_app_config(&app, cli.threads as usize, cli.affinity)?
        .with_progress(app.show_progress && !cli.no_progress && !cli.json);

    let topology = build_topology(cli.simulate_nodes)?;
    info!(nodes = topology.node_count(), "NUMA topology");
    let engine = ProcessingEngine::with_topology(config, topology)?;

    match cli.index {
        Some(path) => index(&engine, &path, cli.json),
        None => repl(&engine, cli.json),
    }
}

fn build_topology(simulate_nodes: Option<usize>) -> Result<Arc<dyn Topology>> {
    match simulate_nodes {
        Some(0) => Err(ConfigError::InvalidNodeCount(0).into()),
        Some(nodes) => {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            Ok(Arc::new(StaticTopology::uniform(nodes, cpus)))
        }
        None => Ok(Arc::new(SysfsTopology::detect())),
    }
}

fn index(engine: &ProcessingEngine, path: &Path, json: bool) -> Result<()> {
    if json {
        let report = engine.run(path);
        output::print_report_json(&report)?;
    } else {
        engine.index_files(path);
    }
    Ok(())
}

/// Read `index <path>`, `search` and `quit` commands from stdin
fn repl(engine: &ProcessingEngine, json: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("quit") => {
                println!("Exit File Retrieval Engine");
                break;
            }
            Some("index") => match parts.next() {
                Some(path) if Path::new(path).exists() => index(engine, Path::new(path), json)?,
                _ => println!("Error: Please provide the correct path."),
            },
            Some("search") => engine.search_files(),
            None => {}
            Some(_) => println!("unrecognized command!"),
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("nidx=debug,warn")
        } else {
            EnvFilter::new("nidx=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
