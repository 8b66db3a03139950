//! Shared helpers.
pub mod json;
