use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use split_doc_corpus::extraction::{
    collect_documents, converter_available, extract_file, normalize_whitespace, ConverterConfig,
    DEFAULT_PRIMARY, DEFAULT_SECONDARY,
};
use split_doc_corpus::log_formatter::BracketedFormatter;

/// Text extraction companion: runs an external converter over `.doc`
/// files and falls back to a secondary converter when the primary
/// reports a too-small text stream.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Extract plain text from .doc files via antiword/catdoc",
    long_about = None
)]
struct Cli {
    /// A specific file or the folder where all documents are located
    input: PathBuf,

    /// Primary converter command
    #[arg(short = 'a', long, default_value = DEFAULT_PRIMARY)]
    antiword: String,

    /// Secondary converter, used only when the primary reports a
    /// too-small text stream
    #[arg(short = 'c', long, default_value = DEFAULT_SECONDARY)]
    catdoc: String,

    /// Write extracted text to stdout instead of sibling .txt files
    #[arg(long)]
    stdout: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .event_format(BracketedFormatter)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("Text extraction failed: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut config = ConverterConfig {
        primary: cli.antiword.clone(),
        secondary: cli.catdoc.clone(),
    };

    if !converter_available(&config.primary) {
        warn!(
            "No '{}' found, switching to '{}'!",
            config.primary, config.secondary
        );
        config.primary = config.secondary.clone();
    }

    let documents = collect_documents(&cli.input)?;
    if documents.is_empty() {
        warn!("No documents found under {:?}; nothing to do", cli.input);
        return Ok(());
    }
    info!("Extracting text from {} documents", documents.len());

    for document in &documents {
        let raw = extract_file(&config, document)?;
        let text = normalize_whitespace(&String::from_utf8_lossy(&raw));

        if cli.stdout {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
        } else {
            let out_path = document.with_extension("txt");
            fs::write(&out_path, &text)?;
            info!("Extracted text written to: {:?}", out_path);
        }
    }

    Ok(())
}
