//! dreadctl library
//!
//! Client for the Dreadnot deployment service: revision lookup, deployment
//! submission and status polling, and the command-line front end.

pub mod app;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
