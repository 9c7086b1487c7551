//! Domain logic for height-versioned storage.

pub mod errors;
pub mod versioned;
