//! Command implementations for the `syd` CLI.

pub mod aliases;
pub mod estimate;
pub mod route;
pub mod validate;
