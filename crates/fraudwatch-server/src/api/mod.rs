//! REST API

pub mod extractors;
mod handlers;
mod router;
pub mod types;

pub use router::create_router;
