//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::price_cache;

/// Database row for a cached price. Prices and timestamps are stored as
/// text: decimals keep their exact representation, RFC 3339 timestamps sort
/// lexicographically.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = price_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceCacheRow {
    pub symbol: String,
    pub price: String,
    pub fetched_at: String,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::sqlite::database::connection::{run_migrations, test_pool};

    #[test]
    fn row_roundtrips_through_db() {
        let (_dir, pool) = test_pool();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        let row = PriceCacheRow {
            symbol: "AAPL".to_string(),
            price: "187.23".to_string(),
            fetched_at: "2026-06-01T14:30:00+00:00".to_string(),
            source: "alpaca".to_string(),
        };

        diesel::insert_into(price_cache::table)
            .values(&row)
            .execute(&mut conn)
            .unwrap();

        let loaded: PriceCacheRow = price_cache::table.find("AAPL").first(&mut conn).unwrap();
        assert_eq!(loaded.price, "187.23");
        assert_eq!(loaded.source, "alpaca");
    }

    #[test]
    fn replace_into_keeps_one_row_per_symbol() {
        let (_dir, pool) = test_pool();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        for price in ["100.0", "101.5"] {
            let row = PriceCacheRow {
                symbol: "MSFT".to_string(),
                price: price.to_string(),
                fetched_at: "2026-06-01T14:30:00+00:00".to_string(),
                source: "alpaca".to_string(),
            };
            diesel::replace_into(price_cache::table)
                .values(&row)
                .execute(&mut conn)
                .unwrap();
        }

        let rows: Vec<PriceCacheRow> = price_cache::table.load(&mut conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, "101.5");
    }
}
