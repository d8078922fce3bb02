use thiserror::Error;

/// Everything that can go wrong between fetching a buoy source and handing
/// the deck document to the renderer.
///
/// Missing columns are deliberately absent from this list: a stage whose
/// field is not present is skipped, not failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: {found} fields, header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("row {row}: cannot parse '{value}' as a date")]
    DateParse { row: usize, value: String },

    #[error("row {row}, column '{column}': {message}")]
    Projection {
        row: usize,
        column: String,
        message: String,
    },

    #[error("cell size {0} is outside 100..=600 or not a multiple of 5")]
    CellSize(i64),

    #[error("config error: {0}")]
    Config(String),
}

impl From<parquet::errors::ParquetError> for PipelineError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        PipelineError::Parquet(e.to_string())
    }
}

impl From<arrow::error::ArrowError> for PipelineError {
    fn from(e: arrow::error::ArrowError) -> Self {
        PipelineError::Parquet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
