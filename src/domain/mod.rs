//! Domain providers and the tools built on top of them
//!
//! The greeting and Wolfram|Alpha providers hold the business logic; `tools`
//! adapts them to MCP tool calls.

pub mod arguments;
pub mod greeting;
pub mod tools;
pub mod wolfram;
