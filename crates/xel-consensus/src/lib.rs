//! # xel-consensus
//!
//! Block consensus for the XEL chain.
//!
//! ## Architecture
//!
//! Chain agreement is proof of stake: a forger is eligible when the hit
//! derived from the generation-signature chain falls under
//! `base_target * stake * elapsed`. The base target retargets every
//! second block toward a 60-second cadence, and the heaviest chain is
//! the one with the highest cumulative difficulty.
//!
//! An embedded proof-of-work market rides on top: blocks also carry
//! task submissions, and the difficulty of those submissions retargets
//! over a trailing window toward ten accepted proofs per block.
//!
//! ```text
//! push_block ──→ validate (pure) ──→ apply (versioned rows at h+1)
//!                                        │
//!                                 failure? rollback_to(h)
//! ```
//!
//! Every store mutation during block application is a versioned row at
//! the new height, so aborting a half-applied block and popping blocks
//! in a reorg are the same operation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use xel_consensus::{ConsensusConfig, ConsensusService};
//! use xel_market::adapters::HashTaskVm;
//!
//! let service = ConsensusService::new(HashTaskVm::new(), ConsensusConfig::default());
//! service.init_genesis(&seeds, &forger, genesis_time)?;
//! let block_id = service.push_block(block)?;
//! ```

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    BlockError, BlockResult, BlockSource, ChainState, ConsensusConfig, DifficultyEngine,
    DuplicateTracker, MarketStores, TransactionTypeDispatch, TxKind,
};
pub use ports::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use service::ConsensusService;
