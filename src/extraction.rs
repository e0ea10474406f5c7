use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

/// Stderr signature of the primary converter choking on a tiny text
/// stream; the one and only condition that triggers the fallback.
pub const TOO_SMALL_SIGNATURE: &str =
    "I'm afraid the text stream of this file is too small to handle.";

pub const DEFAULT_PRIMARY: &str = "antiword";
pub const DEFAULT_SECONDARY: &str = "catdoc";

/// External converter commands for one extraction run.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug)]
pub enum ExtractionError {
    /// A converter process could not be spawned at all.
    Spawn { command: String, source: io::Error },
    IoError(io::Error),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Spawn { command, source } => {
                write!(f, "failed to run '{}': {}", command, source)
            }
            ExtractionError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<io::Error> for ExtractionError {
    fn from(error: io::Error) -> Self {
        ExtractionError::IoError(error)
    }
}

/// Whether a converter's stderr carries the recognized too-small
/// signature. Generic failures never qualify.
pub fn needs_fallback(stderr: &str) -> bool {
    stderr.contains(TOO_SMALL_SIGNATURE)
}

/// Probe whether a converter command can be spawned at all.
pub fn converter_available(command: &str) -> bool {
    match Command::new(command)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(e) => {
            debug!("Probe of '{}' failed: {}", command, e);
            false
        }
    }
}

/// Resolve the documents an input argument refers to: the file itself,
/// or every `.doc` directly under the given directory, sorted.
pub fn collect_documents(input: &Path) -> io::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut documents = Vec::new();
    for entry in fs::read_dir(input)? {
        let entry = entry?;
        let path = entry.path();
        let is_doc = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == "doc")
            .unwrap_or(false);
        if is_doc && entry.file_type()?.is_file() {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Extract the text of one document.
///
/// Runs the primary converter; when its stderr carries the recognized
/// too-small signature, retries exactly once with the secondary. Any
/// other failure is passed through without a retry, matching the
/// original tool chain's behavior of writing whatever the converter
/// produced.
pub fn extract_file(config: &ConverterConfig, path: &Path) -> Result<Vec<u8>, ExtractionError> {
    let output = run_converter(&config.primary, path)?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    if needs_fallback(&stderr) {
        warn!(
            "'{}' could not read {:?}, trying with '{}'!",
            config.primary, path, config.secondary
        );
        let fallback = run_converter(&config.secondary, path)?;
        return Ok(fallback.stdout);
    }

    if !output.status.success() {
        warn!(
            "'{}' exited with {} on {:?}; keeping its output as-is",
            config.primary, output.status, path
        );
    }

    Ok(output.stdout)
}

/// Collapse whitespace runs: 4 or more spaces become 4, runs of tabs and
/// runs of 2-3 spaces become 2 spaces.
pub fn normalize_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' => {
                let mut run = 1;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    run += 1;
                }
                let width = if run >= 4 {
                    4
                } else if run >= 2 {
                    2
                } else {
                    1
                };
                for _ in 0..width {
                    normalized.push(' ');
                }
            }
            '\t' => {
                while chars.peek() == Some(&'\t') {
                    chars.next();
                }
                normalized.push_str("  ");
            }
            other => normalized.push(other),
        }
    }

    normalized
}

fn run_converter(command: &str, path: &Path) -> Result<Output, ExtractionError> {
    Command::new(command)
        .arg(path)
        .output()
        .map_err(|source| ExtractionError::Spawn {
            command: command.to_string(),
            source,
        })
}
