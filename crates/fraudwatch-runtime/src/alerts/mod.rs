//! Alert generation and lifecycle management

mod generator;
mod lifecycle;

pub use generator::{AlertGenerator, ALERT_AMOUNT_THRESHOLD, ALERT_RISK_THRESHOLD};
pub use lifecycle::AlertLifecycle;
