//! Clients for the sites Instabot comments on.
//!
//! Only WordPress (REST API v2) is implemented: listing posts and comments and
//! publishing approved replies.
pub mod wordpress;
