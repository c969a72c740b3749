//! JSON trace output for hosts that keep an engine alive, behind the `trace`
//! feature.

use std::path::{Path, PathBuf};

/// Trace file name inside the log directory.
pub const TRACE_FILE: &str = "hanzi-trace.jsonl";

#[cfg(feature = "trace")]
const DEFAULT_FILTER: &str = "hanzi_engine=debug,hanzi_core=debug";

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("cannot create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(feature = "trace")]
static TRACE_PATH: std::sync::OnceLock<PathBuf> = std::sync::OnceLock::new();

/// Send trace events as JSON lines to `<log_dir>/hanzi-trace.jsonl`,
/// creating `log_dir` if needed, and return the file in use. The first
/// successful call picks the file; later calls return it unchanged.
/// `RUST_LOG` overrides the default `debug` filter on both crates.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> Result<Option<PathBuf>, TraceError> {
    if let Some(path) = TRACE_PATH.get() {
        return Ok(Some(path.clone()));
    }
    std::fs::create_dir_all(log_dir).map_err(|source| TraceError::LogDir {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let path = TRACE_PATH.get_or_init(|| {
        install(log_dir);
        log_dir.join(TRACE_FILE)
    });
    Ok(Some(path.clone()))
}

#[cfg(feature = "trace")]
fn install(log_dir: &Path) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let file_appender = tracing_appender::rolling::never(log_dir, TRACE_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    std::mem::forget(guard); // flush for the life of the process

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // A host may have installed its own subscriber already; keep it.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(filter)
        .try_init();
}

/// Without the `trace` feature nothing is installed and no file is used.
#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &Path) -> Result<Option<PathBuf>, TraceError> {
    Ok(None)
}
