//! Domain models for the branch ledger

mod entry;
mod record;

pub use entry::*;
pub use record::*;
