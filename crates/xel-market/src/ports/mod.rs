//! Ports (trait seams) for the work market.

pub mod task_vm;
