use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("export service error: {0}")]
    TransientService(String),

    #[error("export failed permanently: {0}")]
    PermanentExport(String),

    #[error("malformed export record: {0}")]
    MalformedRecord(String),

    #[error("failed to parse: {0}")]
    Parse(String),

    #[error("incompatible flat table: {0}")]
    IncompatibleTable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientService(_) | Error::Network(_))
    }
}
