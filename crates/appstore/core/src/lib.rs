//! App Store Core Types
//!
//! Shared types for verifying App Store server-to-server signed payloads.

mod claims;
mod environment;

pub use claims::*;
pub use environment::*;
