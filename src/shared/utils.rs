use diesel::r2d2::{ConnectionManager, Pool, PoolError};

/// Backend picked once at startup from the database URL; query code never
/// branches on the variant.
#[derive(diesel::MultiConnection)]
pub enum AnyConnection {
    Postgresql(diesel::PgConnection),
    Sqlite(diesel::SqliteConnection),
}

pub type DbPool = Pool<ConnectionManager<AnyConnection>>;

pub fn create_conn(database_url: &str, max_connections: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<AnyConnection>::new(database_url);
    Pool::builder().max_size(max_connections).build(manager)
}
