//! Shared building blocks for the workspace binaries and the HTTP layer.

pub mod types;
pub mod utils;
