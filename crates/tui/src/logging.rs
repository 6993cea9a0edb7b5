use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// Where log records are written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// One-shot commands log next to their output.
    Stderr,
    /// The terminal UI owns the screen, so it logs to a file instead.
    File(PathBuf),
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(filter: Option<&str>, target: LogTarget) -> Result<()> {
    let env_filter = build_filter(filter)?;

    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .try_init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
    }
    Ok(())
}

fn build_filter(filter: Option<&str>) -> Result<EnvFilter> {
    let filter = filter.unwrap_or(DEFAULT_DIRECTIVE);
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("invalid log directive '{filter}'"))?;
    Ok(EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy())
}
