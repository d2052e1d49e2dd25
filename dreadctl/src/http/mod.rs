//! HTTP transport for the deployment service

pub mod client;
pub mod stacks;
