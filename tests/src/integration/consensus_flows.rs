//! Forging, chain selection bookkeeping, reorgs, and retargeting.

use super::support::{account, keypair, new_task, payment, pow, TestNet};
use xel_consensus::BlockError;
use xel_types::constants::{
    easiest_pow_target, MAX_BASE_TARGET_2, MIN_BASE_TARGET, MIN_XEL_PER_POW, ONE_XEL,
};

const UNIT: u64 = MIN_XEL_PER_POW;

#[test]
fn chain_grows_and_difficulty_accumulates() {
    let net = TestNet::new();
    let mut last_cumulative = net.service.cumulative_difficulty();

    for expected_height in 1..=10u32 {
        net.forge_and_push(vec![]);
        assert_eq!(net.service.chain_height(), Some(expected_height));

        let tip = net.service.tip().expect("tip");
        assert!(tip.cumulative_difficulty > last_cumulative);
        assert!(tip.base_target >= MIN_BASE_TARGET);
        assert!(tip.base_target <= MAX_BASE_TARGET_2);
        last_cumulative = tip.cumulative_difficulty;
    }
}

#[test]
fn popped_blocks_replay_to_the_same_state() {
    let net = TestNet::new();
    let payer = keypair(2);

    let mut forged = Vec::new();
    for index in 0..3u32 {
        let tx = payment(&payer, 777, (u64::from(index) + 1) * ONE_XEL, net.now());
        let timestamp = net
            .service
            .eligible_timestamp(net.forger.public_key().as_bytes())
            .expect("eligible");
        net.clock.set(timestamp.max(net.now()));
        let block = net
            .service
            .forge_block(&net.forger, vec![tx], timestamp)
            .expect("forge");
        forged.push(block.clone());
        net.service.push_block(block).expect("push");
    }

    let tip_id = net.service.tip().expect("tip").id();
    let payer_balance = net.service.balance(account(2));
    let cumulative = net.service.cumulative_difficulty();

    net.service.pop_to_height(0).expect("pop");
    assert_eq!(net.service.chain_height(), Some(0));
    assert_ne!(net.service.balance(account(2)), payer_balance);

    for block in forged {
        net.service.push_block(block).expect("replay");
    }

    assert_eq!(net.service.tip().expect("tip").id(), tip_id);
    assert_eq!(net.service.balance(account(2)), payer_balance);
    assert_eq!(net.service.cumulative_difficulty(), cumulative);
}

#[test]
fn pow_target_tightens_under_submission_pressure() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);
    assert_eq!(net.service.pow_target(), easiest_pow_target());

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 200, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    assert_eq!(net.service.pow_target(), easiest_pow_target());

    // The two-block window scales up to the full twelve-block depth, so
    // 24 proofs project to 144 per window, above the 120 cadence, and
    // the target drops below the easiest value.
    let pows = (0..24)
        .map(|nonce| pow(&miner, work_id, UNIT, vec![nonce, 0, 0], net.now()))
        .collect();
    net.forge_and_push(pows);
    let tightened = net.service.pow_target();
    assert!(tightened < easiest_pow_target());

    // Once the burst leaves the trailing window the target relaxes all
    // the way back.
    net.forge_empty_blocks(12);
    assert_eq!(net.service.pow_target(), easiest_pow_target());
}

#[test]
fn pow_target_replay_is_deterministic() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 200, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    let pows = (0..24)
        .map(|nonce| pow(&miner, work_id, UNIT, vec![nonce, 0, 0], net.now()))
        .collect();
    net.forge_and_push(pows);

    // The cached value equals a cold full replay.
    let cached = net.service.pow_target();
    assert_eq!(cached, net.service.pow_target());
    let mut engine = xel_consensus::DifficultyEngine::new();
    let chain = rebuild_chain(&net);
    assert_eq!(engine.pow_target(&chain), cached);
}

/// Rebuild a bare [`ChainState`](xel_consensus::ChainState) from the
/// service's committed blocks.
fn rebuild_chain(net: &TestNet) -> xel_consensus::ChainState {
    let mut chain = xel_consensus::ChainState::new();
    let mut height = 0u32;
    while let Some(block) = net.service.block_at_height(height) {
        chain.push(block);
        height += 1;
    }
    chain
}

#[test]
fn tampered_generation_signature_rejected() {
    let net = TestNet::new();
    let timestamp = net
        .service
        .eligible_timestamp(net.forger.public_key().as_bytes())
        .expect("eligible");
    net.clock.set(timestamp.max(net.now()));
    let mut block = net
        .service
        .forge_block(&net.forger, vec![], timestamp)
        .expect("forge");
    block.generation_signature[0] ^= 1;
    block.sign(&net.forger);

    assert!(matches!(
        net.service.push_block(block).unwrap_err(),
        BlockError::InvalidGenerationSignature
    ));
}

#[test]
fn unstaked_account_never_becomes_eligible() {
    let net = TestNet::new();
    let stranger = keypair(42);
    assert!(matches!(
        net.service
            .eligible_timestamp(stranger.public_key().as_bytes())
            .unwrap_err(),
        BlockError::HitAboveTarget
    ));
}

#[test]
fn mid_block_failure_rolls_everything_back() {
    let net = TestNet::new();
    let payer = keypair(2);
    let balance_before = net.service.balance(account(2));

    // Two payments that each fit the balance alone but not together.
    let nearly_all = balance_before - 2 * ONE_XEL;
    let first = payment(&payer, 777, nearly_all, net.now());
    let second = payment(&payer, 778, nearly_all, net.now());

    let timestamp = net
        .service
        .eligible_timestamp(net.forger.public_key().as_bytes())
        .expect("eligible");
    net.clock.set(timestamp.max(net.now()));
    let block = net
        .service
        .forge_block(&net.forger, vec![first, second], timestamp)
        .expect("forge");

    assert!(matches!(
        net.service.push_block(block).unwrap_err(),
        BlockError::ApplyFailed(_)
    ));
    assert_eq!(net.service.chain_height(), Some(0));
    assert_eq!(net.service.balance(account(2)), balance_before);
    assert_eq!(net.service.unconfirmed_balance(account(2)), balance_before);
    assert_eq!(net.service.balance(777), 0);

    // The chain keeps working after the rollback.
    net.forge_and_push(vec![]);
    assert_eq!(net.service.chain_height(), Some(1));
}
