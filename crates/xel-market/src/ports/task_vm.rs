//! # Task VM Port
//!
//! The script-execution sandbox that runs submitted task code is an
//! external collaborator. Consensus only needs three operations from it,
//! and every implementation must be deterministic: the same submission
//! against the same compiled task must verify identically on every node.

use primitive_types::U256;
use xel_types::errors::TxResult;
use xel_types::EntityId;

/// Opaque script-execution capability.
pub trait TaskVm: Send + Sync {
    /// Compile a task's source for later execution.
    ///
    /// Fails with a `NotValid` rejection when the source does not
    /// compile, and `Internal` on sandbox failures.
    fn compile(&mut self, work_id: EntityId, source: &[u8]) -> TxResult<()>;

    /// Run the task's proof-of-work check for an input vector against
    /// the embedded proof-of-work target. True means the submission
    /// meets the target.
    fn execute_proof_of_work(
        &self,
        work_id: EntityId,
        input: &[i32],
        target: U256,
    ) -> TxResult<bool>;

    /// Run the task's bounty trigger for an input vector. True means the
    /// input satisfies the task's designated hard condition.
    fn execute_bounty_hook(&self, work_id: EntityId, input: &[i32]) -> TxResult<bool>;
}
