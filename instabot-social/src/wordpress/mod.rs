//! WordPress REST API integration.
pub mod client;
pub mod types;

pub use client::WordPressClient;
pub use types::{Comment, NewComment, Post, Rendered};
