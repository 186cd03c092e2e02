use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(String),

    #[error("Post store does not hold a list of posts: {0}")]
    UndecodableStore(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),
}
