//! CLI domain: parse and route only.
//! Commands are thin wrappers around the config loader and the bridge.

mod parse;
mod route;

pub use parse::{Cli, Commands};
pub use route::RunContext;
