//! Observability subsystem for polyquery
//!
//! Provides:
//! - Structured logging through `tracing`, keyed by a closed `Event` set
//! - Atomic request counters
//!
//! # Usage
//!
//! ```ignore
//! use polyquery::observability::{init_logging, Event, LogFormat};
//!
//! init_logging(LogFormat::Json);
//! tracing::info!(event = %Event::QueryExecuted, rows = 3, "query complete");
//! ```
//!
//! Observability is read-only: nothing here influences query results.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{init_logging, LogFormat};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
