//! Shared types, configuration, and errors for Revu.
//!
//! Every other crate in the workspace depends on this one; it carries no
//! service logic of its own.

pub mod config;
pub mod error;
pub mod types;

pub use config::RevuConfig;
pub use error::{Result, RevuError};
pub use types::*;
