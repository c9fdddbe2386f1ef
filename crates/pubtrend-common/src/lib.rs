//! pubtrend-common — Shared error taxonomy used across all pubtrend crates.

pub mod error;

pub use error::{PubtrendError, Result};
