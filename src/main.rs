use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use weft_nodes::{Pipeline, build_registry, load_pipeline};
use weft_runtime::{Engine, EngineConfig};

/// Weft - run pipelines of entry, middle and exit nodes
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a pipeline once, reading the input payload from stdin
  Run {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Maximum number of nodes running at the same time
    #[arg(long)]
    concurrency: Option<usize>,
  },

  /// Check a pipeline and print its execution order
  Validate {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      pipeline_file,
      concurrency,
    }) => run_pipeline(&pipeline_file, concurrency),
    Some(Commands::Validate { pipeline_file }) => validate_pipeline(&pipeline_file),
    None => {
      println!("weft - use --help to see available commands");
      Ok(())
    }
  }
}

fn load_engine(pipeline_file: &Path, config: EngineConfig) -> Result<(Pipeline, Engine)> {
  let pipeline = load_pipeline(pipeline_file)
    .with_context(|| format!("failed to load pipeline file: {}", pipeline_file.display()))?;
  let registry = build_registry(&pipeline)
    .with_context(|| format!("invalid node declaration in pipeline '{}'", pipeline.name))?;
  Ok((pipeline, Engine::new(registry, config)))
}

fn validate_pipeline(pipeline_file: &Path) -> Result<()> {
  let (pipeline, engine) = load_engine(pipeline_file, EngineConfig::default())?;
  let graph = engine
    .validate()
    .with_context(|| format!("pipeline '{}' is not runnable", pipeline.name))?;

  eprintln!("Pipeline '{}' is valid ({} nodes)", pipeline.name, graph.len());
  for (position, node_id) in graph.execution_order().into_iter().enumerate() {
    let upstream = graph.upstream(node_id);
    if upstream.is_empty() {
      println!("{}. {}", position + 1, node_id);
    } else {
      println!("{}. {} <- {}", position + 1, node_id, upstream.join(", "));
    }
  }

  Ok(())
}

fn run_pipeline(pipeline_file: &Path, concurrency: Option<usize>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_pipeline_async(pipeline_file, concurrency).await })
}

async fn run_pipeline_async(pipeline_file: &Path, concurrency: Option<usize>) -> Result<()> {
  let config = EngineConfig {
    max_concurrency: concurrency,
  };
  let (pipeline, engine) = load_engine(pipeline_file, config)?;
  eprintln!("Loaded pipeline: {}", pipeline.name);

  let payload = read_payload_from_stdin()?;

  // Ctrl-C stops scheduling; nodes already running are allowed to finish.
  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, cancelling execution");
      on_signal.cancel();
    }
  });

  let result = engine
    .execute_with_cancel(payload, cancel)
    .await
    .with_context(|| format!("pipeline '{}' could not be executed", pipeline.name))?;

  eprintln!("Execution completed: {}", result.execution_id);
  eprintln!("Nodes executed: {}", result.execution_order.len());

  println!("{}", serde_json::to_string_pretty(&result)?);

  if !result.is_success() {
    bail!("{} node(s) did not complete", result.failures.len());
  }
  Ok(())
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}
