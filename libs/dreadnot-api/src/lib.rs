//! Dreadnot API wire models
//!
//! Request and response bodies exchanged with the Dreadnot deployment service.

pub mod models;

pub use models::*;
