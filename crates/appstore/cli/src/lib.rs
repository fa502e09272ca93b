//! App Store Verify
//!
//! Configuration and root-certificate loading for the `appstore-verify` tool.

pub mod config;

pub use config::Config;
