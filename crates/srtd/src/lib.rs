//! srtd library - exposes modules for testing.

pub mod collector;
pub mod commands;
pub mod config;
pub mod sources;
pub mod table;
