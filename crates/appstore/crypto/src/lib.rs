//! App Store Crypto
//!
//! Certificate parsing, `x5c` chain verification and JWS verification for
//! App Store signed payloads.

mod cert;
mod chain;
mod error;
pub mod jws;
mod signed_data;

pub use cert::*;
pub use chain::*;
pub use error::*;
pub use signed_data::*;
