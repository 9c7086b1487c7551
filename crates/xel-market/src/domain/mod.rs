//! Domain logic for the work market.

pub mod guard;
pub mod ledger;
pub mod registry;
pub mod source;
pub mod work;
