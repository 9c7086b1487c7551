//! # xel-storage
//!
//! Height-versioned row storage. Every consensus-relevant entity (works,
//! submissions, announcements, account balances) is persisted as an
//! append-only log keyed by `(id, height)` with a derived "latest"
//! projection, so a chain reorganization is a bounded delete of all rows
//! above the fork height followed by a latest-marker recompute.

pub mod domain;

pub use domain::errors::{StorageError, StorageResult};
pub use domain::versioned::{VersionedRow, VersionedTable};
