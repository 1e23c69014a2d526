//! `normrag-index`: builds the ISO/IEC 17025 vector index.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use normrag::{run, IndexerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "normrag-index")]
#[command(about = "Embed the ISO/IEC 17025:2017 corpus and persist the vector index")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "NORMRAG_INDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus JSON file (replaces the configured candidates)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output directory for the index
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<IndexerConfig> {
    let mut cfg = match &args.config {
        Some(path) => IndexerConfig::from_file(path)?,
        None => IndexerConfig::default(),
    };
    if let Some(corpus) = &args.corpus {
        cfg = cfg.with_corpus(corpus);
    }
    if let Some(output) = &args.output {
        cfg = cfg.with_output(output);
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let result = match load_config(&args) {
        Ok(cfg) => run(&cfg).await.map_err(anyhow::Error::from),
        Err(err) => Err(err),
    };

    match result {
        Ok(summary) => {
            println!(
                "💾 Base vetorial salva em '{}' ({} documentos, dimensão {})",
                summary.location, summary.documents, summary.dimension
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "indexing failed");
            eprintln!("❌ {err:#}");
            ExitCode::FAILURE
        }
    }
}
