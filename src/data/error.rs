/// Errors raised while turning one source path into a sample table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error reading the source
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Archive could not be opened or the member is missing
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("unsupported source extension: .{0}")]
    UnsupportedExtension(String),

    #[error("invalid source format: {0}")]
    InvalidFormat(String),
}

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The root directory or an archive under it could not be listed
    #[error("failed to discover sources under {root}: {reason}")]
    Discovery { root: String, reason: String },

    /// A discovered source could not be loaded
    #[error("failed to load source {path}")]
    SourceLoad {
        path: String,
        #[source]
        source: LoadError,
    },

    /// A record carries a date that cannot be read as a calendar date
    #[error("cannot normalize date {value:?} of {filename}")]
    DateNormalization { filename: String, value: String },

    /// The derived concentration is infinite or NaN
    #[error("concentration of {filename} is not finite ({value})")]
    NonFiniteConcentration { filename: String, value: f64 },
}
