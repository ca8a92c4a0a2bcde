//! Adoption intent, tree, and care log entities.

use chrono::{DateTime, Utc};
use common::{IntentId, LogEntryId, PlotId, SpeciesId, TreeId, UserId};
use serde::{Deserialize, Serialize};

use super::status::IntentStatus;

/// Activity recorded in the first log entry of every materialized tree.
pub const TREE_PLANTED_ACTIVITY: &str = "Tree Planted";

/// A provisional reservation of plot capacity pending payment confirmation.
///
/// Only the status changes after creation, and only through the store's
/// compare-and-set transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionIntent {
    pub id: IntentId,
    pub sponsor_id: UserId,
    pub species_id: SpeciesId,
    pub plot_id: PlotId,
    pub custom_name: String,
    pub status: IntentStatus,
    pub created_at: DateTime<Utc>,
}

impl AdoptionIntent {
    /// Creates a new pending intent.
    pub fn pending(
        sponsor_id: UserId,
        species_id: SpeciesId,
        plot_id: PlotId,
        custom_name: impl Into<String>,
    ) -> Self {
        Self {
            id: IntentId::new(),
            sponsor_id,
            species_id,
            plot_id,
            custom_name: custom_name.into(),
            status: IntentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// A tree planted for a sponsor once its adoption was paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: TreeId,
    /// The intent this tree was materialized from. At most one tree per intent.
    pub intent_id: IntentId,
    pub sponsor_id: UserId,
    pub species_id: SpeciesId,
    pub plot_id: PlotId,
    pub custom_name: String,
    pub height_m: f64,
    pub total_funded: i64,
    pub last_care_at: DateTime<Utc>,
    pub adopted_at: DateTime<Utc>,
}

impl Tree {
    /// Materializes the tree for a paid intent: zero height, timestamps set to now.
    pub fn planted_from(intent: &AdoptionIntent) -> Self {
        let now = Utc::now();
        Self {
            id: TreeId::new(),
            intent_id: intent.id,
            sponsor_id: intent.sponsor_id,
            species_id: intent.species_id,
            plot_id: intent.plot_id,
            custom_name: intent.custom_name.clone(),
            height_m: 0.0,
            total_funded: 0,
            last_care_at: now,
            adopted_at: now,
        }
    }
}

/// An entry in a tree's care log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub tree_id: TreeId,
    /// The administrator who recorded the entry. `None` for system entries.
    pub admin_id: Option<String>,
    pub height_m: f64,
    pub activity: String,
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

impl LogEntry {
    /// The audit entry written when a tree is materialized.
    pub fn tree_planted(tree: &Tree) -> Self {
        Self {
            id: LogEntryId::new(),
            tree_id: tree.id,
            admin_id: None,
            height_m: tree.height_m,
            activity: TREE_PLANTED_ACTIVITY.to_string(),
            note: format!("Tree adopted by {}", tree.sponsor_id),
            recorded_at: Utc::now(),
        }
    }
}
