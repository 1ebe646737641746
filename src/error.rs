#[derive(Debug, thiserror::Error)]
pub enum SpimexError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No report published for {date}")]
    ReportNotFound { date: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Report layout not recognized: {0}")]
    Layout(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Ingestion failed for {date}: {source}")]
    Ingest {
        date: String,
        #[source]
        source: Box<SpimexError>,
    },
}

impl SpimexError {
    /// The innermost error, looking through [`SpimexError::Ingest`] wrappers.
    pub fn root(&self) -> &SpimexError {
        match self {
            SpimexError::Ingest { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpimexError>;
