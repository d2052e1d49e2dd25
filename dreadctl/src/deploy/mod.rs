//! Deployment module

pub mod api;
pub mod client;
pub mod executor;
pub mod progress;
