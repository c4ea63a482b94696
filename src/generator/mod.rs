//! Query generation
//!
//! A generator turns a question plus the store's schema into raw query
//! text. Its output is untrusted: it goes through the sanitizer and the
//! enrichment rules before it reaches a store.

mod errors;
mod http;
mod prompt;

use async_trait::async_trait;

pub use errors::{GenerationError, GenerationResult};
pub use http::ChatCompletionGenerator;
pub use prompt::{system_prompt, user_prompt};

use crate::schema::Schema;
use crate::store::StoreKind;

/// Produces raw query text for a question
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(&self, question: &str, schema: &Schema, kind: StoreKind) -> GenerationResult<String>;
}
