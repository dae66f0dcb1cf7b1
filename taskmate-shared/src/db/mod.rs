/// Database layer for TaskMate
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
///
/// Row-level queries live on the models; transactions are managed by
/// [`crate::store::postgres::PgStore`].

pub mod migrations;
pub mod pool;
