use async_trait::async_trait;
use common::{IntentId, PlotId, SpeciesId, TreeId};
use domain::{AdoptionIntent, IntentStatus, LogEntry, Plot, Species, Tree};

use crate::Result;

/// Outcome of a capacity debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The plot had room and `available_capacity` was debited.
    Reserved,
    /// The plot had less room than requested; nothing changed.
    Insufficient,
}

/// Tracks available planting capacity per plot.
///
/// Both operations are atomic on a single plot row. Every `reserve` made for an
/// adoption intent must be matched by one `release` unless the intent completes;
/// callers guard this with the intent's status compare-and-set.
#[async_trait]
pub trait CapacityLedger: Send + Sync {
    /// Debits `amount` from the plot if at least that much is available.
    async fn reserve(&self, plot_id: PlotId, amount: i64) -> Result<Reservation>;

    /// Credits `amount` back to the plot, never exceeding its total capacity.
    async fn release(&self, plot_id: PlotId, amount: i64) -> Result<()>;
}

/// Persistence for the reservation side: catalog, intents, trees, and care logs.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn insert_species(&self, species: Species) -> Result<Species>;

    async fn get_species(&self, id: SpeciesId) -> Result<Option<Species>>;

    async fn insert_plot(&self, plot: Plot) -> Result<Plot>;

    async fn get_plot(&self, id: PlotId) -> Result<Option<Plot>>;

    async fn create_intent(&self, intent: AdoptionIntent) -> Result<AdoptionIntent>;

    async fn get_intent(&self, id: IntentId) -> Result<Option<AdoptionIntent>>;

    /// Moves an intent from `from` to `to` if its current status is still `from`.
    ///
    /// Fails with a domain error when the transition table forbids the move and
    /// with `NotFound` when the intent does not exist. Returns `false` when the
    /// intent has already moved on (another handler won the race).
    async fn transition_intent(
        &self,
        id: IntentId,
        from: IntentStatus,
        to: IntentStatus,
    ) -> Result<bool>;

    /// Inserts a tree unless one already exists for the same intent.
    ///
    /// Returns `true` if the tree was inserted.
    async fn create_tree(&self, tree: Tree) -> Result<bool>;

    async fn find_tree_by_intent(&self, intent_id: IntentId) -> Result<Option<Tree>>;

    async fn create_log(&self, entry: LogEntry) -> Result<LogEntry>;

    /// Returns a tree's log entries, oldest first.
    async fn logs_for_tree(&self, tree_id: TreeId) -> Result<Vec<LogEntry>>;
}
