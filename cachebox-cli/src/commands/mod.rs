//! CLI command implementations.

pub mod boxes;
pub mod common;
pub mod config;
