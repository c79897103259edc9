//! Fraudwatch HTTP Server Library
//!
//! REST API, WebSocket fan-out hub, response cache and message-bus
//! boundaries around the evaluation pipeline. Exposed as a library for
//! integration tests and reuse.

pub mod api;
pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod fanout;
pub mod rate_limit;
pub mod rules_loader;
pub mod ws;
