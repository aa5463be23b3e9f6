//! Streamgate - chat request filter library
//!
//! This library provides a request-interception filter for a chat
//! front-end: it stamps every chat turn with a stable conversation
//! identifier and a per-turn session identifier, tracks active streams,
//! and relays user-initiated stop signals to a backend LLM service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `filter`: The stateful filter - conversation resolver, stream
//!   registry, and the inlet/outlet/stop hooks
//! - `relay`: Outbound HTTP relay to the backend's stop handler
//! - `server`: axum hook server exposing the filter to the front-end
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use streamgate::config::Valves;
//! use streamgate::filter::Filter;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let filter = Filter::new(&Valves::default())?;
//! let body = filter.inlet(json!({
//!     "messages": [{"role": "user", "content": "hello"}]
//! }))?;
//! assert!(body["chat_id"].is_string());
//! assert!(body["session_id"].is_string());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod relay;
pub mod server;

// Re-export commonly used types
pub use config::{Config, Valves};
pub use error::{Result, StreamgateError};
pub use filter::{Filter, StopOutcome, StopResponse};
pub use relay::BackendRelay;
