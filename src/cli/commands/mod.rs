//! CLI command handlers

mod keys;

pub use keys::cmd_keys;
