use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{IntentId, LogEntryId, PlotId, SpeciesId, TransactionId, TreeId, UserId};
use domain::{
    AdoptionIntent, IntentStatus, LogEntry, PaymentStatus, Plot, Species, Transaction, Tree,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::ensure_positive;
use crate::{
    CapacityLedger, PaymentStore, Reservation, ReservationStore, Result, StoreError,
};

/// PostgreSQL-backed reservation store and capacity ledger.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Creates a new PostgreSQL reservation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn plot_exists(&self, plot_id: PlotId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM plots WHERE id = $1)")
            .bind(plot_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    fn row_to_species(row: PgRow) -> Result<Species> {
        Ok(Species {
            id: SpeciesId::from_uuid(row.try_get::<Uuid, _>("id")?),
            common_name: row.try_get("common_name")?,
            space_required: row.try_get("space_required")?,
            price: row.try_get("price")?,
        })
    }

    fn row_to_plot(row: PgRow) -> Result<Plot> {
        Ok(Plot {
            id: PlotId::from_uuid(row.try_get::<Uuid, _>("id")?),
            location_name: row.try_get("location_name")?,
            address: row.try_get("address")?,
            total_capacity: row.try_get("total_capacity")?,
            available_capacity: row.try_get("available_capacity")?,
        })
    }

    fn row_to_intent(row: PgRow) -> Result<AdoptionIntent> {
        let status: String = row.try_get("status")?;
        Ok(AdoptionIntent {
            id: IntentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sponsor_id: UserId::from_uuid(row.try_get::<Uuid, _>("sponsor_id")?),
            species_id: SpeciesId::from_uuid(row.try_get::<Uuid, _>("species_id")?),
            plot_id: PlotId::from_uuid(row.try_get::<Uuid, _>("plot_id")?),
            custom_name: row.try_get("custom_name")?,
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_tree(row: PgRow) -> Result<Tree> {
        Ok(Tree {
            id: TreeId::from_uuid(row.try_get::<Uuid, _>("id")?),
            intent_id: IntentId::from_uuid(row.try_get::<Uuid, _>("intent_id")?),
            sponsor_id: UserId::from_uuid(row.try_get::<Uuid, _>("sponsor_id")?),
            species_id: SpeciesId::from_uuid(row.try_get::<Uuid, _>("species_id")?),
            plot_id: PlotId::from_uuid(row.try_get::<Uuid, _>("plot_id")?),
            custom_name: row.try_get("custom_name")?,
            height_m: row.try_get("height_m")?,
            total_funded: row.try_get("total_funded")?,
            last_care_at: row.try_get("last_care_at")?,
            adopted_at: row.try_get("adopted_at")?,
        })
    }

    fn row_to_log(row: PgRow) -> Result<LogEntry> {
        Ok(LogEntry {
            id: LogEntryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            tree_id: TreeId::from_uuid(row.try_get::<Uuid, _>("tree_id")?),
            admin_id: row.try_get("admin_id")?,
            height_m: row.try_get("height_m")?,
            activity: row.try_get("activity")?,
            note: row.try_get("note")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }
}

#[async_trait]
impl CapacityLedger for PostgresReservationStore {
    async fn reserve(&self, plot_id: PlotId, amount: i64) -> Result<Reservation> {
        ensure_positive(amount)?;

        // Single conditional update: concurrent reservations can never overdraw.
        let result = sqlx::query(
            r#"
            UPDATE plots
            SET available_capacity = available_capacity - $1
            WHERE id = $2 AND available_capacity >= $1
            "#,
        )
        .bind(amount)
        .bind(plot_id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Reservation::Reserved);
        }
        if self.plot_exists(plot_id).await? {
            Ok(Reservation::Insufficient)
        } else {
            Err(StoreError::not_found("plot", plot_id))
        }
    }

    async fn release(&self, plot_id: PlotId, amount: i64) -> Result<()> {
        ensure_positive(amount)?;

        let result = sqlx::query(
            r#"
            UPDATE plots
            SET available_capacity = LEAST(total_capacity, available_capacity + $1)
            WHERE id = $2
            "#,
        )
        .bind(amount)
        .bind(plot_id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("plot", plot_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn insert_species(&self, species: Species) -> Result<Species> {
        sqlx::query(
            r#"
            INSERT INTO species (id, common_name, space_required, price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(species.id.as_uuid())
        .bind(&species.common_name)
        .bind(species.space_required)
        .bind(species.price)
        .execute(&self.pool)
        .await?;

        Ok(species)
    }

    async fn get_species(&self, id: SpeciesId) -> Result<Option<Species>> {
        let row = sqlx::query(
            "SELECT id, common_name, space_required, price FROM species WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_species).transpose()
    }

    async fn insert_plot(&self, plot: Plot) -> Result<Plot> {
        sqlx::query(
            r#"
            INSERT INTO plots (id, location_name, address, total_capacity, available_capacity)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(plot.id.as_uuid())
        .bind(&plot.location_name)
        .bind(&plot.address)
        .bind(plot.total_capacity)
        .bind(plot.available_capacity)
        .execute(&self.pool)
        .await?;

        Ok(plot)
    }

    async fn get_plot(&self, id: PlotId) -> Result<Option<Plot>> {
        let row = sqlx::query(
            r#"
            SELECT id, location_name, address, total_capacity, available_capacity
            FROM plots
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_plot).transpose()
    }

    async fn create_intent(&self, intent: AdoptionIntent) -> Result<AdoptionIntent> {
        sqlx::query(
            r#"
            INSERT INTO adoption_intents (id, sponsor_id, species_id, plot_id, custom_name, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.sponsor_id.as_uuid())
        .bind(intent.species_id.as_uuid())
        .bind(intent.plot_id.as_uuid())
        .bind(&intent.custom_name)
        .bind(intent.status.as_str())
        .bind(intent.created_at)
        .execute(&self.pool)
        .await?;

        Ok(intent)
    }

    async fn get_intent(&self, id: IntentId) -> Result<Option<AdoptionIntent>> {
        let row = sqlx::query(
            r#"
            SELECT id, sponsor_id, species_id, plot_id, custom_name, status, created_at
            FROM adoption_intents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_intent).transpose()
    }

    async fn transition_intent(
        &self,
        id: IntentId,
        from: IntentStatus,
        to: IntentStatus,
    ) -> Result<bool> {
        from.ensure_transition(to)?;

        let result = sqlx::query("UPDATE adoption_intents SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id.as_uuid())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM adoption_intents WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::not_found("adoption intent", id))
        }
    }

    async fn create_tree(&self, tree: Tree) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO trees (id, intent_id, sponsor_id, species_id, plot_id, custom_name,
                               height_m, total_funded, last_care_at, adopted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (intent_id) DO NOTHING
            "#,
        )
        .bind(tree.id.as_uuid())
        .bind(tree.intent_id.as_uuid())
        .bind(tree.sponsor_id.as_uuid())
        .bind(tree.species_id.as_uuid())
        .bind(tree.plot_id.as_uuid())
        .bind(&tree.custom_name)
        .bind(tree.height_m)
        .bind(tree.total_funded)
        .bind(tree.last_care_at)
        .bind(tree.adopted_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_tree_by_intent(&self, intent_id: IntentId) -> Result<Option<Tree>> {
        let row = sqlx::query(
            r#"
            SELECT id, intent_id, sponsor_id, species_id, plot_id, custom_name,
                   height_m, total_funded, last_care_at, adopted_at
            FROM trees
            WHERE intent_id = $1
            "#,
        )
        .bind(intent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_tree).transpose()
    }

    async fn create_log(&self, entry: LogEntry) -> Result<LogEntry> {
        sqlx::query(
            r#"
            INSERT INTO log_entries (id, tree_id, admin_id, height_m, activity, note, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.tree_id.as_uuid())
        .bind(entry.admin_id.as_deref())
        .bind(entry.height_m)
        .bind(&entry.activity)
        .bind(&entry.note)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn logs_for_tree(&self, tree_id: TreeId) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tree_id, admin_id, height_m, activity, note, recorded_at
            FROM log_entries
            WHERE tree_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(tree_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_log).collect()
    }
}

/// PostgreSQL-backed payment store.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    /// Creates a new PostgreSQL payment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_transaction(row: PgRow) -> Result<Transaction> {
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;
        Ok(Transaction {
            id: TransactionId::from_uuid(row.try_get::<Uuid, _>("id")?),
            owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            amount: row.try_get("amount")?,
            kind: kind.parse()?,
            reference_id: row.try_get("reference_id")?,
            status: status.parse()?,
            payment_url: row.try_get("payment_url")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

const TRANSACTION_COLUMNS: &str =
    "id, owner_id, amount, kind, reference_id, status, payment_url, expires_at, created_at";

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction> {
        ensure_positive(tx.amount)?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, owner_id, amount, kind, reference_id, status,
                                      payment_url, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(tx.id.as_uuid())
        .bind(tx.owner_id.as_uuid())
        .bind(tx.amount)
        .bind(tx.kind.as_str())
        .bind(tx.reference_id.as_deref())
        .bind(tx.status.as_str())
        .bind(tx.payment_url.as_deref())
        .bind(tx.expires_at)
        .bind(tx.created_at)
        .execute(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_transaction).transpose()
    }

    async fn transition_payment(
        &self,
        id: TransactionId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        from.ensure_transition(to)?;

        let result = sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(id.as_uuid())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::not_found("transaction", id))
        }
    }

    async fn update_invoice_details(
        &self,
        id: TransactionId,
        payment_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE transactions SET payment_url = $1, expires_at = $2 WHERE id = $3")
                .bind(payment_url)
                .bind(expires_at)
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("transaction", id));
        }
        Ok(())
    }

    async fn pending_before(&self, before: DateTime<Utc>) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE status = $1 AND expires_at < $2
            ORDER BY expires_at ASC
            "#
        ))
        .bind(PaymentStatus::Pending.as_str())
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_transaction).collect()
    }

    async fn transactions_for(&self, owner_id: UserId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_transaction).collect()
    }

    async fn balance(&self, owner_id: UserId) -> Result<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE owner_id = $1")
                .bind(owner_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    async fn credit(&self, owner_id: UserId, amount: i64) -> Result<i64> {
        ensure_positive(amount)?;

        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO wallets (owner_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (owner_id) DO UPDATE SET balance = wallets.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    async fn try_debit(&self, owner_id: UserId, amount: i64) -> Result<bool> {
        ensure_positive(amount)?;

        let result = sqlx::query(
            "UPDATE wallets SET balance = balance - $1 WHERE owner_id = $2 AND balance >= $1",
        )
        .bind(amount)
        .bind(owner_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
