//! CLI binary for shipdoc-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs one document through the pipeline, and prints
//! the resulting field set as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use shipdoc_extract::{ExtractionConfig, IngestOutcome, ReviewSession, UploadedDocument};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "shipdoc",
    version,
    about = "Extract shipment fields (SI number, supplier, ETA, amount) from a scanned document"
)]
struct Cli {
    /// Image or PDF file to process.
    input: PathBuf,

    /// Declared content type; guessed from the suffix when omitted.
    #[arg(long)]
    mime: Option<String>,

    /// PDF-conversion service URL.
    #[arg(long, env = "SHIPDOC_RASTERIZE_URL")]
    rasterize_url: String,

    /// OCR engine URL.
    #[arg(long, env = "SHIPDOC_OCR_URL")]
    ocr_url: String,

    /// AI completion service URL.
    #[arg(long, env = "SHIPDOC_COMPLETE_URL")]
    complete_url: String,

    /// OCR language hint.
    #[arg(long, default_value = "jpn+eng")]
    language: String,

    /// Ask the AI service to fill fields the patterns left empty.
    #[arg(long)]
    fill_missing: bool,

    /// Also print the recognized text to stderr.
    #[arg(long)]
    show_text: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = cli.mime.clone().unwrap_or_default();

    let config = ExtractionConfig::builder()
        .rasterize_endpoint(&cli.rasterize_url)
        .ocr_endpoint(&cli.ocr_url)
        .complete_endpoint(&cli.complete_url)
        .language(&cli.language)
        .build()
        .context("building extraction config")?;

    let session = ReviewSession::new(&config).context("creating review session")?;

    let outcome = session
        .ingest(UploadedDocument::new(bytes, mime, file_name))
        .await
        .context("running extraction pipeline")?;
    // Single-shot CLI: nothing can supersede the run we just awaited.
    debug_assert_eq!(outcome, IngestOutcome::Extracted);

    if cli.show_text {
        if let Some(text) = session.original_text() {
            eprintln!("--- recognized text ---\n{text}\n-----------------------");
        }
    }

    if cli.fill_missing {
        let filled = session
            .fill_missing()
            .await
            .context("requesting AI completion")?;
        eprintln!("AI filled {filled} field(s)");
    }

    let fields = session
        .finalize()
        .context("run did not reach a reviewable state")?;
    println!("{}", serde_json::to_string_pretty(&fields)?);

    Ok(())
}
