//! Adapters implementing the work-market ports.

pub mod task_vm;

pub use task_vm::{HashTaskVm, ScriptedTaskVm};
