use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropertyIngestError {
    #[error("Input is empty: no delimited content to ingest")]
    EmptyInput,

    #[error("Input has no usable header row")]
    MissingHeaders,

    #[error("Input has a header row but no data rows")]
    NoDataRows,

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PropertyIngestError>;
