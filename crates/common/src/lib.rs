//! Shared error definitions used across the canon crates.

pub mod error;

pub use error::{Error, Result};
