use std::fmt;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn seedgap_cli_error(context: &str, err: crate::SeedGapError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for an error variant.
pub fn cli_hint(err: &crate::SeedGapError) -> String {
    use crate::SeedGapError::*;
    match err {
        Io(io) => format!("{io}"),
        Csv(e) => format!(
            "{e}. The table needs seed_idx, num_queries, strategy, A_t, B_t and mse columns."
        ),
        Json(e) => format!("{e}. Compare against the output of --dump-config."),
        Config(msg) => format!("{msg}. Invalid configuration."),
        NoData(msg) => format!("{msg}. Check the strategy labels and the control value."),
        MissingInput(path) => format!("{path} not found. Pass --input."),
        Plot(msg) => format!("{msg}. Chart rendering failed."),
        Internal(msg) => format!("{msg}. This is a bug, please report it."),
    }
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
