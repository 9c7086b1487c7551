//! Cross-crate integration flows.

pub mod support;

#[cfg(test)]
mod consensus_flows;
#[cfg(test)]
mod market_flows;
