//! Foundation types for kit.
//!
//! This crate provides the identity types shared by every other kit crate.
//!
//! # Key Types
//!
//! - [`ObjectHash`]: Content-addressed identifier (SHA-1 digest of an encoded object)
//! - [`Identity`]: Author/committer signature recorded in commits

pub mod error;
pub mod identity;
pub mod object;

pub use error::TypeError;
pub use identity::Identity;
pub use object::{ObjectHash, HASH_LEN, HEX_LEN};
