//! vestx-state
//!
//! Persistent ledger state (sled) and the transaction engine that mutates it.

pub mod db;
pub mod engine;
pub mod query;

#[cfg(test)]
mod test_support;

pub use db::{StateBatch, StateDb};
pub use engine::StateEngine;
pub use query::LedgerQuery;
