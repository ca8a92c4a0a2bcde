//! Adoption side of the saga: intents, trees, and their care log.

mod intent;
mod status;

pub use intent::{AdoptionIntent, LogEntry, TREE_PLANTED_ACTIVITY, Tree};
pub use status::IntentStatus;
