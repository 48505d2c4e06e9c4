use crate::entities::LedgerActivity;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::{Date, OffsetDateTime};

/// One row of `inventory_ledger`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub tenant_id: String,
    /// Event time, not insertion time.
    pub occurred_at: OffsetDateTime,
    pub calendar_date: Date,
    pub inventory_item_id: String,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub location_id: String,
    pub location_name: Option<String>,
    pub activity: LedgerActivity,
    pub delta: Option<i64>,
    pub quantity_after: Option<i64>,
    pub source_type: String,
    pub source_id: String,
    pub adjustment_group_id: Option<String>,
    pub idempotency_key: String,
    /// Key of the provisional row this row upgraded, kept so a redelivery
    /// of that signal still deduplicates.
    pub superseded_key: Option<String>,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl LedgerEntry {
    /// Whether a write with `key` is a redelivery of this row.
    pub fn answers_to(&self, key: &str) -> bool {
        self.idempotency_key == key || self.superseded_key.as_deref() == Some(key)
    }
}

/// Data for inserting a new ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryInsert {
    pub tenant_id: String,
    pub occurred_at: OffsetDateTime,
    pub calendar_date: Date,
    pub inventory_item_id: String,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub location_id: String,
    pub location_name: Option<String>,
    pub activity: LedgerActivity,
    pub delta: Option<i64>,
    pub quantity_after: Option<i64>,
    pub source_type: String,
    pub source_id: String,
    pub adjustment_group_id: Option<String>,
    pub idempotency_key: String,
    pub note: Option<String>,
}

/// Fields an authoritative observation writes over a provisional row.
///
/// `activity`, `source_type`, `source_id`, `idempotency_key` and `note` are
/// always replaced. `delta` and `quantity_after` are replaced only when
/// present. The display fields and `adjustment_group_id` are filled in only
/// when the provisional row lacks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpgrade {
    pub activity: LedgerActivity,
    pub source_type: String,
    pub source_id: String,
    pub idempotency_key: String,
    pub note: Option<String>,
    pub delta: Option<i64>,
    pub quantity_after: Option<i64>,
    pub variant_id: Option<String>,
    pub sku: Option<String>,
    pub location_name: Option<String>,
    pub adjustment_group_id: Option<String>,
}

impl From<&LedgerEntryInsert> for LedgerUpgrade {
    fn from(entry: &LedgerEntryInsert) -> Self {
        Self {
            activity: entry.activity,
            source_type: entry.source_type.clone(),
            source_id: entry.source_id.clone(),
            idempotency_key: entry.idempotency_key.clone(),
            note: entry.note.clone(),
            delta: entry.delta,
            quantity_after: entry.quantity_after,
            variant_id: entry.variant_id.clone(),
            sku: entry.sku.clone(),
            location_name: entry.location_name.clone(),
            adjustment_group_id: entry.adjustment_group_id.clone(),
        }
    }
}

impl LedgerUpgrade {
    /// Apply the upgrade to an in-memory row with the same rules as
    /// [`UpgradeLedgerEntry`].
    pub fn apply_to(&self, row: &mut LedgerEntry, now: OffsetDateTime) {
        row.activity = self.activity;
        row.source_type.clone_from(&self.source_type);
        row.source_id.clone_from(&self.source_id);
        let previous = std::mem::replace(&mut row.idempotency_key, self.idempotency_key.clone());
        row.superseded_key.get_or_insert(previous);
        row.note.clone_from(&self.note);
        if self.delta.is_some() {
            row.delta = self.delta;
        }
        if self.quantity_after.is_some() {
            row.quantity_after = self.quantity_after;
        }
        if row.variant_id.is_none() {
            row.variant_id.clone_from(&self.variant_id);
        }
        if row.sku.is_none() {
            row.sku.clone_from(&self.sku);
        }
        if row.location_name.is_none() {
            row.location_name.clone_from(&self.location_name);
        }
        if row.adjustment_group_id.is_none() {
            row.adjustment_group_id.clone_from(&self.adjustment_group_id);
        }
        row.updated_at = now;
    }
}

const LEDGER_COLUMNS: &str = "id, tenant_id, occurred_at, calendar_date, inventory_item_id, \
    variant_id, sku, location_id, location_name, activity, delta, quantity_after, \
    source_type, source_id, adjustment_group_id, idempotency_key, superseded_key, note, \
    created_at, updated_at";

#[derive(Debug, Clone)]
/// Look up a row by its per-tenant idempotency key.
pub struct FindLedgerEntryByKey {
    pub tenant_id: String,
    pub idempotency_key: String,
}

impl Processor<FindLedgerEntryByKey> for DatabaseProcessor {
    type Output = Option<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindLedgerEntryByKey")]
    async fn process(&self, query: FindLedgerEntryByKey) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM inventory_ledger \
             WHERE tenant_id = $1 AND (idempotency_key = $2 OR superseded_key = $2) \
             ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(query.tenant_id)
            .bind(query.idempotency_key)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Get the most recent row for an item at a location, across every activity.
///
/// Item and location are matched on every spelling given, so rows stored
/// with either the bare or the resource-path form are found.
/// `exclude_id` skips one row (the provisional row about to be upgraded).
pub struct GetLatestLedgerEntry {
    pub tenant_id: String,
    pub item_ids: Vec<String>,
    pub location_ids: Vec<String>,
    pub exclude_id: Option<i64>,
}

impl Processor<GetLatestLedgerEntry> for DatabaseProcessor {
    type Output = Option<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLatestLedgerEntry")]
    async fn process(&self, query: GetLatestLedgerEntry) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM inventory_ledger \
             WHERE tenant_id = $1 \
               AND inventory_item_id = ANY($2) \
               AND location_id = ANY($3) \
               AND ($4::BIGINT IS NULL OR id <> $4) \
             ORDER BY occurred_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(query.tenant_id)
            .bind(query.item_ids)
            .bind(query.location_ids)
            .bind(query.exclude_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Find the latest provisional row for an item at a location whose event
/// time falls in `[from, to]`.
pub struct FindProvisionalLedgerEntry {
    pub tenant_id: String,
    pub item_ids: Vec<String>,
    pub location_ids: Vec<String>,
    pub from: OffsetDateTime,
    pub to: OffsetDateTime,
}

impl Processor<FindProvisionalLedgerEntry> for DatabaseProcessor {
    type Output = Option<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindProvisionalLedgerEntry")]
    async fn process(
        &self,
        query: FindProvisionalLedgerEntry,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM inventory_ledger \
             WHERE tenant_id = $1 \
               AND inventory_item_id = ANY($2) \
               AND location_id = ANY($3) \
               AND activity = 'generic_webhook' \
               AND occurred_at BETWEEN $4 AND $5 \
             ORDER BY occurred_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(query.tenant_id)
            .bind(query.item_ids)
            .bind(query.location_ids)
            .bind(query.from)
            .bind(query.to)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Insert a row, doing nothing if the idempotency key is already taken.
///
/// Returns `None` when the insert lost to an existing key.
pub struct InsertLedgerEntry {
    pub entry: LedgerEntryInsert,
}

impl Processor<InsertLedgerEntry> for DatabaseProcessor {
    type Output = Option<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertLedgerEntry")]
    async fn process(&self, insert: InsertLedgerEntry) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let e = insert.entry;
        let sql = format!(
            "INSERT INTO inventory_ledger \
             (tenant_id, occurred_at, calendar_date, inventory_item_id, variant_id, sku, \
              location_id, location_name, activity, delta, quantity_after, source_type, \
              source_id, adjustment_group_id, idempotency_key, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (tenant_id, idempotency_key) DO NOTHING \
             RETURNING {LEDGER_COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(e.tenant_id)
            .bind(e.occurred_at)
            .bind(e.calendar_date)
            .bind(e.inventory_item_id)
            .bind(e.variant_id)
            .bind(e.sku)
            .bind(e.location_id)
            .bind(e.location_name)
            .bind(e.activity)
            .bind(e.delta)
            .bind(e.quantity_after)
            .bind(e.source_type)
            .bind(e.source_id)
            .bind(e.adjustment_group_id)
            .bind(e.idempotency_key)
            .bind(e.note)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Upgrade a provisional row in place.
///
/// The update only applies while the row is still `generic_webhook`; `None`
/// means another writer got there first. A unique violation on the new key
/// surfaces as a database error.
pub struct UpgradeLedgerEntry {
    pub id: i64,
    pub tenant_id: String,
    pub upgrade: LedgerUpgrade,
}

impl Processor<UpgradeLedgerEntry> for DatabaseProcessor {
    type Output = Option<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpgradeLedgerEntry")]
    async fn process(&self, cmd: UpgradeLedgerEntry) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let u = cmd.upgrade;
        let sql = format!(
            "UPDATE inventory_ledger SET \
               activity = $3, \
               source_type = $4, \
               source_id = $5, \
               superseded_key = COALESCE(superseded_key, idempotency_key), \
               idempotency_key = $6, \
               note = $7, \
               delta = COALESCE($8, delta), \
               quantity_after = COALESCE($9, quantity_after), \
               variant_id = COALESCE(variant_id, $10), \
               sku = COALESCE(sku, $11), \
               location_name = COALESCE(location_name, $12), \
               adjustment_group_id = COALESCE(adjustment_group_id, $13), \
               updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 AND activity = 'generic_webhook' \
             RETURNING {LEDGER_COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntry>(&sql)
            .bind(cmd.id)
            .bind(cmd.tenant_id)
            .bind(u.activity)
            .bind(u.source_type)
            .bind(u.source_id)
            .bind(u.idempotency_key)
            .bind(u.note)
            .bind(u.delta)
            .bind(u.quantity_after)
            .bind(u.variant_id)
            .bind(u.sku)
            .bind(u.location_name)
            .bind(u.adjustment_group_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone, Default)]
/// List ledger rows with pagination and optional filters, newest first.
pub struct ListLedgerEntries {
    pub tenant_id: String,
    pub item_ids: Option<Vec<String>>,
    pub location_ids: Option<Vec<String>>,
    pub activity: Option<LedgerActivity>,
    pub from: Option<OffsetDateTime>,
    pub to: Option<OffsetDateTime>,
    pub limit: i64,
    pub offset: i64,
}

impl ListLedgerEntries {
    /// Whether a row passes every filter. Pagination is not applied.
    pub fn matches(&self, row: &LedgerEntry) -> bool {
        row.tenant_id == self.tenant_id
            && self
                .item_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&row.inventory_item_id))
            && self
                .location_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&row.location_id))
            && self.activity.is_none_or(|a| a == row.activity)
            && self.from.is_none_or(|from| row.occurred_at >= from)
            && self.to.is_none_or(|to| row.occurred_at <= to)
    }
}

impl Processor<ListLedgerEntries> for DatabaseProcessor {
    type Output = Vec<LedgerEntry>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListLedgerEntries")]
    async fn process(&self, query: ListLedgerEntries) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {LEDGER_COLUMNS} FROM inventory_ledger WHERE tenant_id = "
        ));
        qb.push_bind(query.tenant_id);
        if let Some(items) = query.item_ids {
            qb.push(" AND inventory_item_id = ANY(").push_bind(items).push(")");
        }
        if let Some(locations) = query.location_ids {
            qb.push(" AND location_id = ANY(").push_bind(locations).push(")");
        }
        if let Some(activity) = query.activity {
            qb.push(" AND activity = ").push_bind(activity);
        }
        if let Some(from) = query.from {
            qb.push(" AND occurred_at >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            qb.push(" AND occurred_at <= ").push_bind(to);
        }
        qb.push(" ORDER BY occurred_at DESC, id DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        qb.build_query_as::<LedgerEntry>()
            .fetch_all(&self.pool)
            .await
    }
}
