//! Domain logic for the consensus subsystem.

pub mod accounts;
pub mod chain;
pub mod config;
pub mod difficulty;
pub mod dispatch;
pub mod error;
pub mod generation;

pub use accounts::{Account, AccountLedger};
pub use chain::{BlockSource, ChainState};
pub use config::ConsensusConfig;
pub use difficulty::DifficultyEngine;
pub use dispatch::{DuplicateTracker, MarketStores, TransactionTypeDispatch, TxKind};
pub use error::{BlockError, BlockResult};
