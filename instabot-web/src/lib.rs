//! Article extraction.
//!
//! - Browser capture with guaranteed session teardown (`browser`)
//! - The URL → text pipeline and its request/options types (`extract`)
//! - A readability heuristic over rendered HTML (`readability`)
//! - The typed failure taxonomy (`error`)

pub mod browser;
pub mod error;
pub mod extract;
pub mod readability;

pub use error::{ErrorKind, ExtractionError};
pub use extract::{ArticleExtractor, ExtractionOptions, ExtractionRequest};
pub use readability::{Article, ContentExtractor, Readability, ReadabilityOptions};
