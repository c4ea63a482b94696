//! polyquery - natural-language questions answered against relational,
//! document and key-value stores
//!
//! A generator drafts a query from the question and the store's schema.
//! The draft is untrusted: it is sanitized to the store's syntax, corrected
//! and completed from the question, and then executed. Key-value stores get
//! application-side joins, filters and aggregation so they can answer the
//! same questions as the relational backends.

pub mod config;
pub mod enrichment;
pub mod error;
pub mod executor;
pub mod generator;
pub mod observability;
mod patterns;
pub mod pipeline;
pub mod query;
pub mod sanitizer;
pub mod schema;
pub mod store;

pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use executor::{ResultTable, Scalar};
pub use generator::{ChatCompletionGenerator, GenerationError, QueryGenerator};
pub use pipeline::{Answer, Backend, QueryPipeline};
pub use query::StructuredQuery;
pub use store::StoreKind;
