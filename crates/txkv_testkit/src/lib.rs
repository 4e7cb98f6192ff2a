//! # txkv Testkit
//!
//! Test utilities for txkv.
//!
//! This crate provides:
//! - Store fixtures and tracing setup for tests
//! - Property-based test generators using proptest
//! - A fault-injecting store wrapper
//! - Concurrent stress harnesses that check transactional invariants
//!
//! ## Usage
//!
//! ```rust
//! use txkv_testkit::prelude::*;
//!
//! with_test_db(|db| {
//!     db.transaction(|txn| txn.put(b"k", b"v")).unwrap();
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fault::*;
pub use fixtures::*;
pub use generators::*;
pub use stress::*;
