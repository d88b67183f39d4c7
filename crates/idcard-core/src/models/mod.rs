//! Data models: the parsed record and configuration.

pub mod config;
pub mod record;
