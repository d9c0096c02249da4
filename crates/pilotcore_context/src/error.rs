use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("image reference `{file_name}` belongs to session `{owner}`, not `{current}`")]
    CrossSessionImageRef {
        file_name: String,
        owner: String,
        current: String,
    },

    #[error("no image bytes supplied for reference `{0}`")]
    MissingImageBytes(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
