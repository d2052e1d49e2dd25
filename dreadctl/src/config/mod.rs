//! Configuration file

pub mod settings;
