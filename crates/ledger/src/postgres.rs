use async_trait::async_trait;
use common::{EntryId, Money};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Account, EntryPair, EntryQuery, LedgerEntry, Posting, Result,
    entry::build_pair,
    store::LedgerStore,
};

/// PostgreSQL-backed journal.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new PostgreSQL journal over the given pool.
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

    fn row_to_entry(row: PgRow) -> Result<LedgerEntry> {
        let account: String = row.try_get("account")?;
        let side: String = row.try_get("side")?;
        let reference_type: String = row.try_get("reference_type")?;

        Ok(LedgerEntry {
            id: EntryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            account: account.parse()?,
            side: side.parse()?,
            amount_minor: Money::from_minor(row.try_get("amount_minor")?),
            balance_before_minor: Money::from_minor(row.try_get("balance_before_minor")?),
            balance_after_minor: Money::from_minor(row.try_get("balance_after_minor")?),
            reference_type: reference_type.parse()?,
            reference_id: row.try_get("reference_id")?,
            description: row.try_get("description")?,
            paired_entry_id: row
                .try_get::<Option<Uuid>, _>("paired_entry_id")?
                .map(EntryId::from_uuid),
            created_at: row.try_get("created_at")?,
        })
    }

    /// Serializes writers on one account for the transaction's lifetime
    /// and returns the account's closing balance.
    ///
    /// A row lock on the latest entry is not enough: an account with no
    /// entries yet has no row to lock, so two writers racing to record
    /// its first entry would both read a zero balance. The
    /// transaction-scoped advisory lock is keyed per account and held
    /// until commit; writers on other accounts proceed independently.
    async fn lock_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        account: Account,
    ) -> Result<Money> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('ledger_account'), hashtext($1))")
            .bind(account.as_str())
            .execute(&mut **tx)
            .await?;

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT balance_after_minor
            FROM ledger_entries
            WHERE account = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(account.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(Money::from_minor(balance.unwrap_or(0)))
    }

    async fn insert_entry(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        entry: &LedgerEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, account, side, amount_minor,
                balance_before_minor, balance_after_minor,
                reference_type, reference_id, description,
                paired_entry_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.account.as_str())
        .bind(entry.side.as_str())
        .bind(entry.amount_minor.minor())
        .bind(entry.balance_before_minor.minor())
        .bind(entry.balance_after_minor.minor())
        .bind(entry.reference_type.as_str())
        .bind(&entry.reference_id)
        .bind(&entry.description)
        .bind(entry.paired_entry_id.map(|id| id.as_uuid()))
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn record_pair(&self, posting: &Posting) -> Result<EntryPair> {
        let mut tx = self.pool.begin().await?;

        // Lock in canonical account order so two concurrent postings
        // touching the same two accounts cannot deadlock.
        let mut accounts = [posting.debit_account, posting.credit_account];
        accounts.sort();

        let mut first = Money::zero();
        let mut second = Money::zero();
        for (i, account) in accounts.iter().enumerate() {
            let balance = Self::lock_balance(&mut tx, *account).await?;
            if i == 0 {
                first = balance;
            } else {
                second = balance;
            }
        }

        let (debit_before, credit_before) = if accounts[0] == posting.debit_account {
            (first, second)
        } else {
            (second, first)
        };

        let pair = build_pair(posting, debit_before, credit_before);
        Self::insert_entry(&mut tx, &pair.debit).await?;
        Self::insert_entry(&mut tx, &pair.credit).await?;

        tx.commit().await?;
        Ok(pair)
    }

    async fn account_balance(&self, account: Account) -> Result<Money> {
        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT balance_after_minor
            FROM ledger_entries
            WHERE account = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(account.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(Money::from_minor(balance.unwrap_or(0)))
    }

    async fn entries(&self, query: &EntryQuery) -> Result<Vec<LedgerEntry>> {
        let mut sql = String::from(
            "SELECT id, account, side, amount_minor, balance_before_minor, \
             balance_after_minor, reference_type, reference_id, description, \
             paired_entry_id, created_at FROM ledger_entries WHERE 1=1",
        );
        let mut param_count = 0;

        if query.account.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND account = ${param_count}"));
        }
        if query.reference_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND reference_type = ${param_count}"));
        }
        if query.reference_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND reference_id = ${param_count}"));
        }

        sql.push_str(" ORDER BY seq DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(account) = query.account {
            sqlx_query = sqlx_query.bind(account.as_str());
        }
        if let Some(reference_type) = query.reference_type {
            sqlx_query = sqlx_query.bind(reference_type.as_str());
        }
        if let Some(ref reference_id) = query.reference_id {
            sqlx_query = sqlx_query.bind(reference_id);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_entry).collect()
    }
}
