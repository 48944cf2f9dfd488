//! Database plumbing: connection pool, migrations, schema, row models.

pub mod connection;
pub mod model;
pub mod schema;

pub use connection::{create_pool, run_migrations, DbConn, DbPool};
