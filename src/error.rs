use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedGapError {
    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed results table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// No seed had both strategies present at the control value.
    #[error("no data: {0}")]
    NoData(String),

    /// Neither the primary nor the fallback input exists.
    #[error("Error: {0} not found.")]
    MissingInput(String),

    /// Chart rendering failure.
    #[error("plot error: {0}")]
    Plot(String),

    /// Broken internal invariant.
    #[error("internal error: {0}")]
    Internal(String),
}
