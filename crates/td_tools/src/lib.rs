//! # TD Development Tools
//!
//! Command-line tools for development:
//! - Configuration loaders and validators
//! - Map generation and ASCII rendering
//! - Wave previews

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod loader;
pub mod render;
pub mod validate;

pub use loader::{ToolError, ToolResult};
