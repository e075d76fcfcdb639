use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    EncodingError(#[from] serde_json::Error),

    #[error("Corrupt store file {path}: {reason}")]
    CorruptFile { path: String, reason: String },
}

impl From<StoreError> for common::Error {
    fn from(err: StoreError) -> Self {
        common::Error::StorageError(err.to_string())
    }
}
