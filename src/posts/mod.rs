pub mod core;
pub mod error;
pub mod handlers;
pub mod store;
pub mod types;

pub use core::ForumManager;
pub use error::PostsError;
pub use store::PostStore;
pub use types::{Comment, NewPost, Post, PostAction, PostActionForm, PostSummary, PostsConfig};
