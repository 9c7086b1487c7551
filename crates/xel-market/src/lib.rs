//! # xel-market
//!
//! The embedded "useful work" market: funded task records, proof-of-work
//! and bounty submissions with anti-replay uniqueness, the in-memory
//! reservation guard protecting task funds from unconfirmed-pool
//! over-commitment, and the opaque task-VM capability port.
//!
//! ## Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | `domain::work` | Task record, fund split, lifecycle transitions |
//! | `domain::registry` | Height-versioned task store and fund accounting |
//! | `domain::ledger` | Persisted submissions/announcements, uniqueness index |
//! | `domain::guard` | Unconfirmed-pool fund/slot reservations |
//! | `domain::source` | Prunable task source code |
//! | `ports::task_vm` | Opaque script-execution capability |
//! | `adapters::task_vm` | Deterministic task-VM implementations |

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::guard::UnconfirmedGuard;
pub use domain::ledger::{Submission, SubmissionAnnouncement, SubmissionLedger};
pub use domain::registry::WorkRegistry;
pub use domain::source::SourceStore;
pub use domain::work::{CloseReason, Work};
pub use ports::task_vm::TaskVm;
