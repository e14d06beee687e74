//! HTTP handlers for bfhl-service.

pub mod bfhl;
pub mod health;
pub mod metrics;

pub use bfhl::{operation_code, process};
pub use health::{health_check, readiness_check};
pub use metrics::metrics;
