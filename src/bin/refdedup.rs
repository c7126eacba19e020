//! refdedup CLI: feeds newline-delimited reference messages through the
//! deduplication pipeline.
//!
//! Usage:
//!   refdedup run [--input messages.jsonl] [--config refdedup.yaml]
//!   refdedup check [--input message.json]

use clap::{Parser, Subcommand};
use refdedup::pipeline::InboundMessage;
use refdedup::strategy::TitleSyntacticStrategy;
use refdedup::{DedupConfig, DedupPipeline, ExclusionFilter, JsonlComparisonSink, MessageOutcome};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "refdedup",
    version,
    about = "Streaming deduplication of bibliographic references per author"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every message of a newline-delimited JSON stream
    Run {
        /// Input file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override the configured report directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Override the configured comparison record directory
        #[arg(long)]
        comparison_dir: Option<PathBuf>,
    },
    /// Parse one message and tell whether it would be processed
    Check {
        /// Input file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_pipeline(config: &DedupConfig) -> Result<DedupPipeline, String> {
    let sink = JsonlComparisonSink::new(&config.comparison_dir, config.records_per_file)
        .map_err(|e| format!("cannot open comparison directory: {}", e))?;
    let pipeline = DedupPipeline::from_config(config)
        .map_err(|e| format!("invalid configuration: {}", e))?
        .with_strategy(Arc::new(TitleSyntacticStrategy::new(&config.syntactic)))
        .with_comparison_sink(Arc::new(sink));
    Ok(with_semantic_strategies(pipeline, config))
}

#[cfg(feature = "embeddings")]
fn with_semantic_strategies(mut pipeline: DedupPipeline, config: &DedupConfig) -> DedupPipeline {
    use refdedup::strategy::{FastEmbedEmbedder, SemanticSimilarityStrategy, SemanticText};

    for text in [SemanticText::Notice, SemanticText::Title] {
        match FastEmbedEmbedder::default_model() {
            Ok(embedder) => {
                let strategy = SemanticSimilarityStrategy::new(text, &config.semantic, Box::new(embedder));
                pipeline = pipeline.with_strategy(Arc::new(strategy));
            }
            Err(e) => warn!(error = %e, "embedding model unavailable, semantic strategy disabled"),
        }
    }
    pipeline
}

#[cfg(not(feature = "embeddings"))]
fn with_semantic_strategies(pipeline: DedupPipeline, _config: &DedupConfig) -> DedupPipeline {
    pipeline
}

async fn open_input(input: Option<PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, String> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

async fn cmd_run(pipeline: DedupPipeline, input: Option<PathBuf>) -> i32 {
    let reader = match open_input(input).await {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    info!(strategies = ?pipeline.strategy_names(), "pipeline ready");

    let mut lines = reader.lines();
    let (mut processed, mut discarded, mut failed) = (0usize, 0usize, 0usize);
    let mut line_number = 0usize;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error: cannot read input: {}", e);
                return 1;
            }
        };
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match pipeline.handle_message(line.as_bytes()).await {
            Ok(MessageOutcome::Processed(_)) => processed += 1,
            Ok(MessageOutcome::Discarded { .. }) => discarded += 1,
            Err(e) => {
                failed += 1;
                warn!(line = line_number, error = %e, "message skipped");
            }
        }
    }

    info!(processed, discarded, failed, authors = pipeline.session().len(), "input exhausted");
    println!(
        "{} processed, {} discarded, {} failed, {} author reports",
        processed,
        discarded,
        failed,
        pipeline.session().len()
    );
    0
}

fn cmd_check(input: Option<PathBuf>) -> i32 {
    let body = match input {
        Some(path) => std::fs::read(&path).map_err(|e| format!("cannot read '{}': {}", path.display(), e)),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .map(|_| buffer)
                .map_err(|e| format!("cannot read stdin: {}", e))
        }
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let (entity, reference) = match InboundMessage::parse(&body) {
        Ok(message) => message.into_parts(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("reference: {}", reference.unique_identifier());
    match ExclusionFilter::default().matching_rule(&reference) {
        Some(rule) => println!("discarded: yes ({})", rule),
        None => println!("discarded: no"),
    }
    match entity.main_entity_id() {
        Ok(id) => {
            println!("main entity id: {}", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match DedupConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Run {
            input,
            report_dir,
            comparison_dir,
        } => {
            let mut config = config;
            if let Some(dir) = report_dir {
                config.report_dir = dir;
            }
            if let Some(dir) = comparison_dir {
                config.comparison_dir = dir;
            }
            let pipeline = match build_pipeline(&config) {
                Ok(pipeline) => pipeline,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("failed to create tokio runtime: {}", e);
                    std::process::exit(1);
                }
            };
            rt.block_on(cmd_run(pipeline, input))
        }
        Commands::Check { input } => cmd_check(input),
    };
    std::process::exit(code);
}
