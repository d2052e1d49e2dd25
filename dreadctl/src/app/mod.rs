//! Command-line application

pub mod args;
pub mod output;
pub mod run;
