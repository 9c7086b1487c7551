//! # Proof-of-Stake Generation
//!
//! The generation signature chains forger identity into every block:
//! `gen_sig(n) = sha256(gen_sig(n-1) ‖ generator public key)`. The
//! forger's "hit" is the low 8 bytes of that digest; a block is eligible
//! when the hit falls under `base_target × effective stake × elapsed
//! seconds`, so richer accounts and longer waits both widen the window.

use primitive_types::U256;
use xel_crypto::{hash_to_id, sha256_many, Hash};
use xel_types::PublicKey;

/// Next generation signature in the chain.
pub fn next_generation_signature(previous: &Hash, generator_public_key: &PublicKey) -> Hash {
    sha256_many(&[previous, generator_public_key])
}

/// The forger's hit for a generation signature.
pub fn hit(generation_signature: &Hash) -> u64 {
    hash_to_id(generation_signature)
}

/// Whether a hit is eligible to forge.
///
/// `elapsed` is the candidate's timestamp minus the previous block's;
/// the target grows linearly with it, never with wall-clock time.
pub fn verify_hit(hit: u64, base_target: u64, effective_balance_xel: u64, elapsed: u32) -> bool {
    if effective_balance_xel == 0 || elapsed == 0 {
        return false;
    }
    let target = U256::from(base_target) * U256::from(effective_balance_xel) * U256::from(elapsed);
    U256::from(hit) < target
}

/// Shortest elapsed time after which `hit` becomes eligible.
///
/// Inverse of [`verify_hit`], used by block assembly to pick a forgeable
/// timestamp.
pub fn elapsed_for_hit(hit: u64, base_target: u64, effective_balance_xel: u64) -> u32 {
    if effective_balance_xel == 0 {
        return u32::MAX;
    }
    let denominator = u128::from(base_target) * u128::from(effective_balance_xel);
    let elapsed = u128::from(hit) / denominator + 1;
    elapsed.min(u128::from(u32::MAX)) as u32
}
