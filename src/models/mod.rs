//! Data models for the tool finder.
//!
//! Field names serialize in camelCase to match the web client's records.

mod category;
mod saved;
mod tool;

pub use category::*;
pub use saved::*;
pub use tool::*;
