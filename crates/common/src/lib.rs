//! Shared identifier types for the tree adoption services.

mod types;

pub use types::{IntentId, LogEntryId, PlotId, SpeciesId, TransactionId, TreeId, UserId};
