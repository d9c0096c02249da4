use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session `{0}` already exists")]
    AlreadyExists(String),

    #[error("session `{0}` not found")]
    NotFound(String),

    #[error("invalid image file name: {0}")]
    InvalidFileName(String),

    #[error("image `{0}` not found in session `{1}`")]
    ImageNotFound(String, String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
