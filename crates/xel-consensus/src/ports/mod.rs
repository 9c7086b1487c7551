//! Port definitions for the consensus subsystem.

pub mod outbound;

pub use outbound::{ManualTimeSource, SystemTimeSource, TimeSource};
