use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("a dispatch run is already active")]
    RunActive,
    #[error("transaction {0} not found")]
    NotFound(u64),
    #[error("channel error: {0}")]
    Channel(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for DispatchError {
    fn from(err: rocksdb::Error) -> Self {
        DispatchError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Channel(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
