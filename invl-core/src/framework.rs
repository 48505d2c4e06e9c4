use sqlx::PgPool;

/// Executes the SQL query structs declared under [`crate::entities`].
///
/// Each query is a plain struct with a
/// `kanau::processor::Processor<Query> for DatabaseProcessor` impl. The same
/// processor also backs the [`LedgerStore`](crate::ledger::LedgerStore) and
/// [`ReceiptBook`](crate::orchestrator::ReceiptBook) seams in production.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
