//! Shared types and pure logic for the branch ledger
//!
//! Key derivation, week bucketing and entry aggregation live here so the
//! backend and the browser (via WASM) compute them the same way.

pub mod aggregation;
pub mod calendar;
pub mod keys;
pub mod models;
pub mod types;

pub use aggregation::*;
pub use calendar::*;
pub use keys::*;
pub use models::*;
pub use types::*;
