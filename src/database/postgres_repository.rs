use sqlx::PgPool;

/// Thin handle over the connection pool. Repository methods live in `impl`
/// blocks spread across the sibling modules, grouped by table.
#[derive(Clone)]
pub struct PostgresRepository {
    pub pool: PgPool,
}
