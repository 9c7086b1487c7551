//! Task lifecycle flows: fund, mine, claim, refund.

use super::support::{account, bounty, bounty_payout, cancel_request, keypair, new_task, pow, TestNet};
use xel_market::domain::work::CloseReason;
use xel_types::constants::{MIN_XEL_PER_POW, ONE_XEL};

const UNIT: u64 = MIN_XEL_PER_POW;

/// Sum of every seeded account's confirmed balance.
fn total_money(net: &TestNet) -> u64 {
    [1u8, 2, 3]
        .iter()
        .map(|&seed| net.service.balance(account(seed)))
        .sum()
}

#[test]
fn task_pow_bounty_payout_lifecycle() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);
    let initial_total = total_money(&net);

    // Post a task: 100 pow units, 60% pow fund / 40% bounty fund.
    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    let work = net.service.work(work_id).expect("task registered");
    assert_eq!(work.balance_pow_fund, 60 * UNIT);
    assert_eq!(work.balance_bounty_fund, 40 * UNIT);
    assert!(work.is_open());

    // Three accepted proofs pay the miner out of the pow fund.
    let miner_id = account(3);
    let miner_before = net.service.balance(miner_id);
    let pows = (0..3)
        .map(|nonce| pow(&miner, work_id, UNIT, vec![nonce, 1, 2], net.now()))
        .collect();
    net.forge_and_push(pows);

    assert_eq!(net.service.balance(miner_id), miner_before + 3 * UNIT);
    let work = net.service.work(work_id).expect("task still open");
    assert_eq!(work.balance_pow_fund, 57 * UNIT);
    assert_eq!(work.received_pows, 3);

    // The first accepted bounty claims the whole bounty fund and closes
    // the task; the unspent pow fund goes home to the creator.
    let creator_id = account(2);
    let creator_before = net.service.balance(creator_id);
    let claim = bounty(&miner, work_id, vec![9, 9, 9], net.now());
    let claim_id = claim.id();
    net.forge_and_push(vec![claim]);

    let work = net.service.work(work_id).expect("task record kept");
    assert!(!work.is_open());
    assert_eq!(work.close_reason, Some(CloseReason::BountyClaimed));
    assert_eq!(net.service.balance(creator_id), creator_before + 57 * UNIT);

    let submission = net.service.submission(claim_id).expect("bounty recorded");
    assert_eq!(submission.payout_amount, 40 * UNIT);
    assert!(!submission.paid);

    // The forger settles the recorded winner in the next block.
    let miner_before = net.service.balance(miner_id);
    let settle = bounty_payout(&net.forger, work_id, claim_id, miner_id, 40 * UNIT, net.now());
    net.forge_and_push(vec![settle]);

    assert_eq!(net.service.balance(miner_id), miner_before + 40 * UNIT);
    assert!(net.service.submission(claim_id).expect("still recorded").paid);

    // Fees circulate to the forger and every escrow has drained, so the
    // system total is unchanged.
    assert_eq!(total_money(&net), initial_total);
}

#[test]
fn pow_fund_exhaustion_closes_the_task() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);

    // 100% pow fund holding exactly 20 units.
    let task = new_task(&creator, 20 * UNIT, UNIT, 100, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    let pows = (0..20)
        .map(|nonce| pow(&miner, work_id, UNIT, vec![nonce, 0, 0], net.now()))
        .collect();
    net.forge_and_push(pows);

    let work = net.service.work(work_id).expect("record kept");
    assert!(!work.is_open());
    assert_eq!(work.close_reason, Some(CloseReason::FundsExhausted));
    assert_eq!(work.balance_pow_fund, 0);
    assert_eq!(work.received_pows, 20);
}

#[test]
fn split_fund_exhaustion_refunds_the_creator() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);
    let creator_id = account(2);
    let initial_total = total_money(&net);

    // 50/50 split of 20 units: ten unit-proofs drain the pow fund.
    let task = new_task(&creator, 20 * UNIT, UNIT, 50, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    let work = net.service.work(work_id).expect("task registered");
    assert_eq!(work.balance_pow_fund, 10 * UNIT);
    assert_eq!(work.balance_bounty_fund, 10 * UNIT);

    let creator_mid = net.service.balance(creator_id);
    let pows = (0..10)
        .map(|nonce| pow(&miner, work_id, UNIT, vec![nonce, 0, 0], net.now()))
        .collect();
    net.forge_and_push(pows);

    let work = net.service.work(work_id).expect("record kept");
    assert!(!work.is_open());
    assert_eq!(work.close_reason, Some(CloseReason::FundsExhausted));
    assert_eq!(work.balance_bounty_fund, 0);
    // the untouched bounty fund went home with the close
    assert_eq!(net.service.balance(creator_id), creator_mid + 10 * UNIT);
    assert_eq!(total_money(&net), initial_total);

    // and nothing is left for the timeout sweep to find
    net.forge_empty_blocks(3);
    assert_eq!(total_money(&net), initial_total);
}

#[test]
fn one_settlement_per_bounty_per_block() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);
    let miner_id = account(3);

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    let claim = bounty(&miner, work_id, vec![9, 9, 9], net.now());
    let claim_id = claim.id();
    net.forge_and_push(vec![claim]);
    let payout_amount = net
        .service
        .submission(claim_id)
        .expect("bounty recorded")
        .payout_amount;

    // Two distinct settlements of the same submission in one block
    // would credit the winner twice; the block must not validate.
    let first = bounty_payout(&net.forger, work_id, claim_id, miner_id, payout_amount, net.now());
    let second = bounty_payout(
        &net.forger,
        work_id,
        claim_id,
        miner_id,
        payout_amount,
        net.now() + 1,
    );
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
        xel_consensus::BlockError::Transaction { .. }
    ));

    // The honest single settlement still goes through once.
    let miner_before = net.service.balance(miner_id);
    let settle = bounty_payout(&net.forger, work_id, claim_id, miner_id, payout_amount, net.now());
    net.forge_and_push(vec![settle]);
    assert_eq!(net.service.balance(miner_id), miner_before + payout_amount);
}

#[test]
fn stale_pool_reservation_does_not_block_a_valid_block() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);

    // 5% pow fund: exactly one unit-proof fits.
    let task = new_task(&creator, 20 * UNIT, UNIT, 5, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    assert_eq!(
        net.service.work(work_id).expect("task registered").balance_pow_fund,
        UNIT
    );

    // A pooled proof reserves the only slot.
    let pooled = pow(&miner, work_id, UNIT, vec![1, 1, 1], net.now());
    net.service.apply_unconfirmed(pooled).expect("admit proof");
    assert_eq!(net.service.pool_size(), 1);

    // A block carrying a different proof applies against confirmed
    // state regardless of the reservation; the pooled proof no longer
    // fits the closed task and is dropped on re-admission.
    let confirmed = pow(&miner, work_id, UNIT, vec![2, 2, 2], net.now());
    let confirmed_id = confirmed.id();
    net.forge_and_push(vec![confirmed]);

    assert!(net.service.submission(confirmed_id).expect("proof recorded").paid);
    assert_eq!(net.service.pool_size(), 0);
    let work = net.service.work(work_id).expect("record kept");
    assert!(!work.is_open());
    assert_eq!(work.close_reason, Some(CloseReason::FundsExhausted));
}

#[test]
fn pow_racing_a_bounty_claim_is_too_late() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    // Both submissions are valid against the pre-block state; the proof
    // sits in the pool when the claiming block is assembled.
    let proof = pow(&miner, work_id, UNIT, vec![8, 8, 8], net.now());
    let proof_id = proof.id();
    net.service.apply_unconfirmed(proof.clone()).expect("admit proof");
    let claim = bounty(&miner, work_id, vec![9, 9, 9], net.now());

    let miner_before = net.service.balance(account(3));
    net.forge_and_push(vec![claim, proof]);

    // The claim closed the task before the proof applied: recorded but
    // unpaid.
    let submission = net.service.submission(proof_id).expect("proof recorded");
    assert!(submission.too_late);
    assert!(!submission.paid);
    assert_eq!(submission.payout_amount, 0);
    assert_eq!(net.service.balance(account(3)), miner_before);
}

#[test]
fn task_timeout_refunds_creator() {
    let net = TestNet::new();
    let creator = keypair(2);
    let creator_id = account(2);
    let before = net.service.balance(creator_id);

    // Shortest allowed deadline: three blocks.
    let task = new_task(&creator, 50 * UNIT, UNIT, 60, 1, 3, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    assert_eq!(net.service.balance(creator_id), before - 50 * UNIT - ONE_XEL);

    net.forge_empty_blocks(3);

    let work = net.service.work(work_id).expect("record kept");
    assert!(!work.is_open());
    assert_eq!(work.close_reason, Some(CloseReason::Timeout));
    // everything but the fee came back
    assert_eq!(net.service.balance(creator_id), before - ONE_XEL);
}

#[test]
fn cancel_request_closes_and_refunds() {
    let net = TestNet::new();
    let creator = keypair(2);
    let creator_id = account(2);
    let before = net.service.balance(creator_id);

    let task = new_task(&creator, 50 * UNIT, UNIT, 60, 1, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    let cancel = cancel_request(&creator, work_id, net.now());
    net.forge_and_push(vec![cancel]);

    let work = net.service.work(work_id).expect("record kept");
    assert_eq!(work.close_reason, Some(CloseReason::Cancelled));
    assert_eq!(net.service.balance(creator_id), before - ONE_XEL);
}

#[test]
fn reorg_rolls_the_market_back() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);
    let creator_before = net.service.balance(account(2));
    let miner_before = net.service.balance(account(3));

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    let proof = pow(&miner, work_id, UNIT, vec![5, 6, 7], net.now());
    let proof_id = proof.id();
    net.forge_and_push(vec![proof]);
    assert!(net.service.submission(proof_id).is_some());

    net.service.pop_to_height(0).expect("pop to genesis");

    assert!(net.service.work(work_id).is_none());
    assert!(net.service.submission(proof_id).is_none());
    assert_eq!(net.service.balance(account(2)), creator_before);
    assert_eq!(net.service.balance(account(3)), miner_before);
    assert_eq!(
        net.service.unconfirmed_balance(account(2)),
        creator_before
    );

    // The chain can replay the same lifecycle after the reorg.
    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);
    let proof = pow(&miner, work_id, UNIT, vec![5, 6, 7], net.now());
    net.forge_and_push(vec![proof]);
    assert_eq!(net.service.work(work_id).expect("recreated").received_pows, 1);
}

#[test]
fn duplicate_input_rejected_across_blocks() {
    let net = TestNet::new();
    let creator = keypair(2);
    let miner = keypair(3);

    let task = new_task(&creator, 100 * UNIT, UNIT, 60, 2, 100, net.now());
    let work_id = task.id();
    net.forge_and_push(vec![task]);

    net.forge_and_push(vec![pow(&miner, work_id, UNIT, vec![5, 6, 7], net.now())]);

    // Same input vector in a later block: final validation rejects the
    // whole block.
    let replay = pow(&miner, work_id, UNIT, vec![5, 6, 7], net.now() + 1);
    let timestamp = net
        .service
        .eligible_timestamp(net.forger.public_key().as_bytes())
        .expect("eligible");
    net.clock.set(timestamp.max(net.now()));
    let block = net
        .service
        .forge_block(&net.forger, vec![replay], timestamp)
        .expect("forge");
    let err = net.service.push_block(block).unwrap_err();
    assert!(matches!(
        err,
        xel_consensus::BlockError::Transaction { .. }
    ));
}
