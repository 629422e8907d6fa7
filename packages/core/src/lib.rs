// Library root — exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod commands;
pub mod db;
pub mod error;
pub mod expiry;
pub mod manager;
pub mod model;
pub mod render;
pub mod repository;
pub mod store;

// These modules are mostly wiring for the binary.
pub mod cli;
pub mod config;
pub mod logging;
