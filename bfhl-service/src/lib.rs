//! bfhl-service: numeric helpers and one-word AI answers behind a uniform
//! JSON envelope.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
