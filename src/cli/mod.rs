//! Command-line interface

pub mod commands;
pub mod error;
pub mod output;
