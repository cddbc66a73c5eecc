//! Common types and utilities shared across Instabot crates.
//!
//! This crate holds the shared error type, a `Result` alias and the
//! observability helpers every binary and integration test uses. It stays
//! dependency-light so that all crates can depend on it without dragging in
//! the browser or HTTP stacks.
//!
//! # Overview
//!
//! - [`InstabotError`] and [`Result`]: shared error handling for the service
//!   clients (LLM, REST wrappers)
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`DEFAULT_BRAND_TONE`]: tone used when an operator does not pick one
//!
//! # Examples
//!
//! ```rust
//! use instabot_common::InstabotError;
//!
//! let err = InstabotError::Config("missing llm section".into());
//! assert_eq!(err.to_string(), "Configuration error: missing llm section");
//! ```

pub mod observability;

/// Brand tone injected into comment prompts when none is configured.
pub const DEFAULT_BRAND_TONE: &str = "friendly and professional";

/// Error types shared by the Instabot service clients.
#[derive(thiserror::Error, Debug)]
pub enum InstabotError {
    /// A remote API answered with an error or an unusable payload.
    #[error("API error: {0}")]
    Api(String),

    /// The transport failed before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,

    /// Anything else bubbled up from glue code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`InstabotError`].
pub type Result<T> = std::result::Result<T, InstabotError>;
