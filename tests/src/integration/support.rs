//! In-memory chain harness for integration flows.
//!
//! One forger with a large stake keeps block intervals short, and a
//! manual clock tracks the forged timestamps so drift checks pass
//! deterministically.

use std::sync::{Arc, Once};
use xel_consensus::{ConsensusConfig, ConsensusService, ManualTimeSource, TimeSource};
use xel_crypto::Ed25519KeyPair;
use xel_market::adapters::ScriptedTaskVm;
use xel_types::attachment::{PrunableSourceCode, LANGUAGE_ELASTIC_PL};
use xel_types::constants::{ONE_XEL, SUBMISSION_TX_DEADLINE};
use xel_types::{Attachment, EntityId, Transaction};

pub const GENESIS_TIME: u32 = 1_500_000_000;

static TRACING: Once = Once::new();

/// Route crate logs through a test subscriber, honouring `RUST_LOG`.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Deterministic keypair per seed byte.
pub fn keypair(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// Account id for a seed byte.
pub fn account(seed: u8) -> EntityId {
    keypair(seed).public_key().account_id()
}

pub struct TestNet {
    pub service: ConsensusService<ScriptedTaskVm>,
    pub clock: Arc<ManualTimeSource>,
    pub forger: Ed25519KeyPair,
}

impl TestNet {
    /// Chain with a staked forger (seed 1) and two funded users
    /// (seeds 2 and 3).
    pub fn new() -> Self {
        Self::with_vm(ScriptedTaskVm::new())
    }

    pub fn with_vm(vm: ScriptedTaskVm) -> Self {
        init_tracing();
        let clock = Arc::new(ManualTimeSource::new(GENESIS_TIME));
        let service = ConsensusService::new(vm, ConsensusConfig::default())
            .with_time_source(Box::new(clock.clone()));
        let forger = keypair(1);
        let seeds = vec![
            (account(1), 50_000_000 * ONE_XEL),
            (account(2), 1_000_000 * ONE_XEL),
            (account(3), 1_000_000 * ONE_XEL),
        ];
        service
            .init_genesis(&seeds, &forger, GENESIS_TIME)
            .expect("genesis");
        Self {
            service,
            clock,
            forger,
        }
    }

    /// Forge a block with `transactions` at the earliest eligible
    /// timestamp and push it.
    pub fn forge_and_push(&self, transactions: Vec<Transaction>) -> EntityId {
        let timestamp = self
            .service
            .eligible_timestamp(self.forger.public_key().as_bytes())
            .expect("forger never becomes eligible");
        self.clock.set(timestamp.max(self.clock.now()));
        let block = self
            .service
            .forge_block(&self.forger, transactions, timestamp)
            .expect("forge");
        self.service.push_block(block).expect("push")
    }

    /// Advance the chain by `count` empty blocks.
    pub fn forge_empty_blocks(&self, count: usize) {
        for _ in 0..count {
            self.forge_and_push(vec![]);
        }
    }

    /// Current wall-clock value the service sees.
    pub fn now(&self) -> u32 {
        self.clock.now()
    }
}

// === Transaction builders ===

pub fn payment(from: &Ed25519KeyPair, to: EntityId, amount: u64, timestamp: u32) -> Transaction {
    let mut tx = Transaction::new(
        *from.public_key().as_bytes(),
        Some(to),
        amount,
        ONE_XEL,
        timestamp,
        60,
        Attachment::OrdinaryPayment,
    );
    tx.sign(from);
    tx
}

#[allow(clippy::too_many_arguments)]
pub fn new_task(
    creator: &Ed25519KeyPair,
    amount: u64,
    xel_per_pow: u64,
    percentage_pow_fund: u8,
    bounty_limit: u32,
    deadline: u16,
    timestamp: u32,
) -> Transaction {
    let mut tx = Transaction::new(
        *creator.public_key().as_bytes(),
        None,
        amount,
        ONE_XEL,
        timestamp,
        60,
        Attachment::NewTask {
            title: "search for a low digest".into(),
            deadline,
            bounty_limit,
            xel_per_pow,
            percentage_pow_fund,
        },
    )
    .with_source_code(PrunableSourceCode::new(
        b"digest(work_id, input) < target".to_vec(),
        LANGUAGE_ELASTIC_PL,
    ));
    tx.sign(creator);
    tx
}

pub fn pow(
    miner: &Ed25519KeyPair,
    work_id: EntityId,
    xel_per_pow: u64,
    input: Vec<i32>,
    timestamp: u32,
) -> Transaction {
    let mut tx = Transaction::new(
        *miner.public_key().as_bytes(),
        None,
        xel_per_pow,
        0,
        timestamp,
        SUBMISSION_TX_DEADLINE,
        Attachment::ProofOfWork { work_id, input },
    );
    tx.sign(miner);
    tx
}

pub fn bounty(
    miner: &Ed25519KeyPair,
    work_id: EntityId,
    input: Vec<i32>,
    timestamp: u32,
) -> Transaction {
    let mut tx = Transaction::new(
        *miner.public_key().as_bytes(),
        None,
        0,
        0,
        timestamp,
        SUBMISSION_TX_DEADLINE,
        Attachment::Bounty { work_id, input },
    );
    tx.sign(miner);
    tx
}

pub fn bounty_payout(
    forger: &Ed25519KeyPair,
    work_id: EntityId,
    submission_id: EntityId,
    winner: EntityId,
    amount: u64,
    timestamp: u32,
) -> Transaction {
    let mut tx = Transaction::new(
        *forger.public_key().as_bytes(),
        Some(winner),
        amount,
        0,
        timestamp,
        60,
        Attachment::BountyPayout {
            work_id,
            submission_id,
        },
    );
    tx.sign(forger);
    tx
}

pub fn cancel_request(
    creator: &Ed25519KeyPair,
    work_id: EntityId,
    timestamp: u32,
) -> Transaction {
    let mut tx = Transaction::new(
        *creator.public_key().as_bytes(),
        None,
        0,
        0,
        timestamp,
        60,
        Attachment::CancelTaskRequest { work_id },
    );
    tx.sign(creator);
    tx
}
