pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod wolfram_client;
