//! SQLite price cache implementation.
//!
//! Provides persistent storage for cached prices using SQLite and Diesel
//! ORM. Upserts use `REPLACE INTO`, so the one-row-per-symbol invariant is
//! enforced by the primary key rather than a read-modify-write cycle.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::adapter::sqlite::database::connection::{DbConn, DbPool};
use crate::adapter::sqlite::database::model::PriceCacheRow;
use crate::adapter::sqlite::database::schema::price_cache;
use crate::domain::{PriceCacheEntry, Symbol};
use crate::error::{CacheError, Result};
use crate::port::store::QuoteStore;

/// SQLite-backed price cache.
pub struct SqliteQuoteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteQuoteStore {
    /// Create a new SQLite quote store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(entry: &PriceCacheEntry) -> PriceCacheRow {
        PriceCacheRow {
            symbol: entry.symbol.as_str().to_string(),
            price: entry.price.to_string(),
            fetched_at: entry.fetched_at.to_rfc3339(),
            source: entry.source.clone(),
        }
    }

    fn from_row(row: PriceCacheRow) -> Result<PriceCacheEntry> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| CacheError::Corrupt(format!("price for {}: {e}", row.symbol)))?;
        let fetched_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.fetched_at)
            .map_err(|e| CacheError::Corrupt(format!("fetched_at for {}: {e}", row.symbol)))?
            .with_timezone(&Utc);

        Ok(PriceCacheEntry {
            symbol: Symbol::new(&row.symbol),
            price,
            fetched_at,
            source: row.source,
        })
    }

    fn conn(&self) -> Result<DbConn> {
        self.pool
            .get()
            .map_err(|e| CacheError::Connection(e.to_string()).into())
    }
}

impl QuoteStore for SqliteQuoteStore {
    async fn get(&self, symbol: &Symbol) -> Result<Option<PriceCacheEntry>> {
        let mut conn = self.conn()?;

        let row: Option<PriceCacheRow> = price_cache::table
            .find(symbol.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| CacheError::Query(e.to_string()))?;

        row.map(Self::from_row).transpose()
    }

    async fn get_many(&self, symbols: &[Symbol]) -> Result<Vec<PriceCacheEntry>> {
        let mut conn = self.conn()?;

        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        let rows: Vec<PriceCacheRow> = price_cache::table
            .filter(price_cache::symbol.eq_any(names))
            .load(&mut conn)
            .map_err(|e| CacheError::Query(e.to_string()))?;

        rows.into_iter().map(Self::from_row).collect()
    }

    async fn upsert(&self, entry: &PriceCacheEntry) -> Result<()> {
        let row = Self::to_row(entry);
        let mut conn = self.conn()?;

        diesel::replace_into(price_cache::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| CacheError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, symbols: &[Symbol]) -> Result<usize> {
        let mut conn = self.conn()?;

        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        let deleted = diesel::delete(price_cache::table.filter(price_cache::symbol.eq_any(names)))
            .execute(&mut conn)
            .map_err(|e| CacheError::Query(e.to_string()))?;

        Ok(deleted)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            price_cache::table.filter(price_cache::fetched_at.lt(cutoff.to_rfc3339())),
        )
        .execute(&mut conn)
        .map_err(|e| CacheError::Query(e.to_string()))?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::sqlite::database::connection::{run_migrations, test_pool};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn setup_store() -> (tempfile::TempDir, SqliteQuoteStore) {
        let (dir, pool) = test_pool();
        run_migrations(&pool).expect("Failed to run migrations");
        (dir, SqliteQuoteStore::new(pool))
    }

    fn entry(symbol: &str, price: Decimal, age: Duration) -> PriceCacheEntry {
        PriceCacheEntry {
            symbol: Symbol::new(symbol),
            price,
            fetched_at: Utc::now() - age,
            source: "alpaca".to_string(),
        }
    }

    #[tokio::test]
    async fn roundtrip_preserves_decimal_precision() {
        let (_dir, store) = setup_store();
        let original = entry("AAPL", dec!(187.2301), Duration::zero());

        store.upsert(&original).await.unwrap();
        let loaded = store.get(&Symbol::new("AAPL")).await.unwrap().unwrap();

        assert_eq!(loaded.price, dec!(187.2301));
        assert_eq!(loaded.source, "alpaca");
        assert!((loaded.fetched_at - original.fetched_at).num_seconds().abs() < 1);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let (_dir, store) = setup_store();
        assert!(store.get(&Symbol::new("NOPE")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let (_dir, store) = setup_store();
        store
            .upsert(&entry("MSFT", dec!(100), Duration::minutes(45)))
            .await
            .unwrap();
        store
            .upsert(&entry("MSFT", dec!(105.5), Duration::zero()))
            .await
            .unwrap();

        let loaded = store.get(&Symbol::new("MSFT")).await.unwrap().unwrap();
        assert_eq!(loaded.price, dec!(105.5));

        let all = store
            .get_many(&[Symbol::new("MSFT")])
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn get_many_returns_only_existing_rows() {
        let (_dir, store) = setup_store();
        store
            .upsert(&entry("AAPL", dec!(187), Duration::zero()))
            .await
            .unwrap();
        store
            .upsert(&entry("MSFT", dec!(420), Duration::zero()))
            .await
            .unwrap();

        let rows = store
            .get_many(&[Symbol::new("AAPL"), Symbol::new("MSFT"), Symbol::new("GONE")])
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_rows_and_reports_count() {
        let (_dir, store) = setup_store();
        store
            .upsert(&entry("AAPL", dec!(187), Duration::zero()))
            .await
            .unwrap();
        store
            .upsert(&entry("MSFT", dec!(420), Duration::zero()))
            .await
            .unwrap();

        let deleted = store
            .delete(&[Symbol::new("AAPL"), Symbol::new("GONE")])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get(&Symbol::new("AAPL")).await.unwrap().is_none());
        assert!(store.get(&Symbol::new("MSFT")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purge_removes_only_rows_older_than_cutoff() {
        let (_dir, store) = setup_store();
        store
            .upsert(&entry("OLD", dec!(1), Duration::minutes(90)))
            .await
            .unwrap();
        store
            .upsert(&entry("STALE", dec!(2), Duration::minutes(45)))
            .await
            .unwrap();
        store
            .upsert(&entry("FRESH", dec!(3), Duration::minutes(5)))
            .await
            .unwrap();

        let purged = store
            .purge_older_than(Utc::now() - Duration::minutes(60))
            .await
            .unwrap();

        assert_eq!(purged, 1);
        assert!(store.get(&Symbol::new("OLD")).await.unwrap().is_none());
        assert!(store.get(&Symbol::new("STALE")).await.unwrap().is_some());
        assert!(store.get(&Symbol::new("FRESH")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn purge_empty_database_returns_zero() {
        let (_dir, store) = setup_store();
        let purged = store.purge_older_than(Utc::now()).await.unwrap();
        assert_eq!(purged, 0);
    }

    #[tokio::test]
    async fn corrupt_price_surfaces_as_cache_error() {
        let (_dir, store) = setup_store();
        let mut conn = store.pool.get().unwrap();
        diesel::insert_into(price_cache::table)
            .values(&PriceCacheRow {
                symbol: "BAD".to_string(),
                price: "not-a-number".to_string(),
                fetched_at: Utc::now().to_rfc3339(),
                source: "alpaca".to_string(),
            })
            .execute(&mut conn)
            .unwrap();
        drop(conn);

        let result = store.get(&Symbol::new("BAD")).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::Cache(CacheError::Corrupt(_)))
        ));
    }

    #[tokio::test]
    async fn concurrent_upserts_do_not_corrupt_data() {
        use std::sync::Arc;

        let (_dir, store) = setup_store();
        let store = Arc::new(store);
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let e = PriceCacheEntry {
                    symbol: Symbol::new(&format!("SYM{i}")),
                    price: Decimal::from(i),
                    fetched_at: Utc::now(),
                    source: "alpaca".to_string(),
                };
                store.upsert(&e).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let symbols: Vec<Symbol> = (0..10).map(|i| Symbol::new(&format!("SYM{i}"))).collect();
        let rows = store.get_many(&symbols).await.unwrap();
        assert_eq!(rows.len(), 10);
    }
}
