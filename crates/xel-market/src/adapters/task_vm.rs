//! # Deterministic Task VMs
//!
//! [`HashTaskVm`] stands in for the real ElasticPL sandbox with a pure
//! hash rule, which keeps the proof-of-work target check meaningful:
//! a submission verifies iff `sha256(work_id ‖ input)` read as a 256-bit
//! value is at or below the target. [`ScriptedTaskVm`] forces verdicts
//! per task for exercising rejection paths.

use crate::ports::task_vm::TaskVm;
use primitive_types::U256;
use std::collections::{HashMap, HashSet};
use xel_crypto::Sha256Hasher;
use xel_types::errors::{TxError, TxResult};
use xel_types::EntityId;

/// Digest an input vector in a task's scope.
pub fn submission_digest(work_id: EntityId, input: &[i32]) -> U256 {
    let mut hasher = Sha256Hasher::new();
    hasher.update(&work_id.to_le_bytes());
    for value in input {
        hasher.update(&value.to_le_bytes());
    }
    U256::from_big_endian(&hasher.finalize())
}

/// Hash-rule VM: proof of work verifies iff the submission digest is at
/// or below the target; the bounty trigger fires iff the digest's low
/// 16 bits are zero.
#[derive(Debug, Clone, Default)]
pub struct HashTaskVm {
    compiled: HashSet<EntityId>,
}

impl HashTaskVm {
    /// Create a VM with no compiled tasks.
    pub fn new() -> Self {
        Self::default()
    }

    fn require_compiled(&self, work_id: EntityId) -> TxResult<()> {
        if !self.compiled.contains(&work_id) {
            return Err(TxError::Vm(format!("work {work_id} was never compiled")));
        }
        Ok(())
    }
}

impl TaskVm for HashTaskVm {
    fn compile(&mut self, work_id: EntityId, source: &[u8]) -> TxResult<()> {
        if source.is_empty() {
            return Err(TxError::MalformedAttachment("empty task source".into()));
        }
        self.compiled.insert(work_id);
        Ok(())
    }

    fn execute_proof_of_work(
        &self,
        work_id: EntityId,
        input: &[i32],
        target: U256,
    ) -> TxResult<bool> {
        self.require_compiled(work_id)?;
        Ok(submission_digest(work_id, input) <= target)
    }

    fn execute_bounty_hook(&self, work_id: EntityId, input: &[i32]) -> TxResult<bool> {
        self.require_compiled(work_id)?;
        Ok(submission_digest(work_id, input) & U256::from(0xFFFFu32) == U256::zero())
    }
}

/// Test-oriented VM with forced verdicts per task.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTaskVm {
    compiled: HashSet<EntityId>,
    pow_verdicts: HashMap<EntityId, bool>,
    bounty_verdicts: HashMap<EntityId, bool>,
}

impl ScriptedTaskVm {
    /// Create a VM that accepts everything by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the proof-of-work verdict for a task.
    pub fn with_pow_verdict(mut self, work_id: EntityId, accept: bool) -> Self {
        self.pow_verdicts.insert(work_id, accept);
        self
    }

    /// Force the bounty verdict for a task.
    pub fn with_bounty_verdict(mut self, work_id: EntityId, accept: bool) -> Self {
        self.bounty_verdicts.insert(work_id, accept);
        self
    }
}

impl TaskVm for ScriptedTaskVm {
    fn compile(&mut self, work_id: EntityId, _source: &[u8]) -> TxResult<()> {
        self.compiled.insert(work_id);
        Ok(())
    }

    fn execute_proof_of_work(
        &self,
        work_id: EntityId,
        _input: &[i32],
        _target: U256,
    ) -> TxResult<bool> {
        Ok(self.pow_verdicts.get(&work_id).copied().unwrap_or(true))
    }

    fn execute_bounty_hook(&self, work_id: EntityId, _input: &[i32]) -> TxResult<bool> {
        Ok(self.bounty_verdicts.get(&work_id).copied().unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompiled_work_is_a_vm_failure() {
        let vm = HashTaskVm::new();
        let err = vm.execute_proof_of_work(7, &[1, 2, 3], U256::MAX).unwrap_err();
        assert!(matches!(err, TxError::Vm(_)));
    }

    #[test]
    fn easiest_target_accepts_everything() {
        let mut vm = HashTaskVm::new();
        vm.compile(7, b"code").unwrap();
        assert!(vm.execute_proof_of_work(7, &[1, 2, 3], U256::MAX).unwrap());
    }

    #[test]
    fn zero_target_rejects_everything() {
        let mut vm = HashTaskVm::new();
        vm.compile(7, b"code").unwrap();
        assert!(!vm
            .execute_proof_of_work(7, &[1, 2, 3], U256::zero())
            .unwrap());
    }

    #[test]
    fn digest_is_deterministic_and_work_scoped() {
        assert_eq!(submission_digest(7, &[1, 2, 3]), submission_digest(7, &[1, 2, 3]));
        assert_ne!(submission_digest(7, &[1, 2, 3]), submission_digest(8, &[1, 2, 3]));
    }

    #[test]
    fn empty_source_does_not_compile() {
        let mut vm = HashTaskVm::new();
        assert!(matches!(
            vm.compile(7, b"").unwrap_err(),
            TxError::MalformedAttachment(_)
        ));
    }

    #[test]
    fn scripted_verdicts_are_honored() {
        let mut vm = ScriptedTaskVm::new()
            .with_pow_verdict(7, false)
            .with_bounty_verdict(8, false);
        vm.compile(7, b"code").unwrap();

        assert!(!vm.execute_proof_of_work(7, &[1], U256::MAX).unwrap());
        assert!(vm.execute_proof_of_work(9, &[1], U256::MAX).unwrap());
        assert!(!vm.execute_bounty_hook(8, &[1]).unwrap());
        assert!(vm.execute_bounty_hook(7, &[1]).unwrap());
    }
}
