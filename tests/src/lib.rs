//! # XEL Test Suite
//!
//! Unified test crate for cross-crate flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs          # In-memory chain harness
//!     ├── market_flows.rs     # Task lifecycle end to end
//!     └── consensus_flows.rs  # Forging, reorgs, retargeting
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p xel-tests
//!
//! # By category
//! cargo test -p xel-tests integration::market_flows::
//! cargo test -p xel-tests integration::consensus_flows::
//! ```

#![allow(dead_code)]

pub mod integration;
