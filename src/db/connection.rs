//! Connection and pool helpers for database access.

use cfg_if::cfg_if;
use diesel_async::pooled_connection::{
    AsyncDieselConnectionManager, ManagerConfig, PoolError, bb8::Pool,
};
#[cfg(feature = "sqlite")]
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

cfg_if! {
    if #[cfg(all(feature = "sqlite", feature = "postgres"))] {
        compile_error!("Either feature 'sqlite' or 'postgres' must be enabled, not both");
    } else if #[cfg(feature = "sqlite")] {
        use diesel::sqlite::{Sqlite, SqliteConnection};
        /// Database backend type for `SQLite`.
        pub type Backend = Sqlite;
        /// Embedded database migrations for `SQLite`.
        pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");
        /// Connection type for `SQLite` database access.
        pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;
        /// Connection pool type for `SQLite`.
        pub type DbPool = Pool<DbConnection>;
    } else if #[cfg(all(feature = "postgres", not(feature = "sqlite")))] {
        use diesel::pg::Pg;
        use diesel_async::AsyncPgConnection;
        /// Database backend type for PostgreSQL.
        pub type Backend = Pg;
        /// Embedded database migrations for PostgreSQL.
        pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");
        /// Connection type for PostgreSQL database access.
        pub type DbConnection = AsyncPgConnection;
        /// Connection pool type for PostgreSQL.
        pub type DbPool = Pool<DbConnection>;
    } else {
        compile_error!("Either feature 'sqlite' or 'postgres' must be enabled");
    }
}

/// Open a single connection with backend session setup applied.
///
/// On `SQLite` this enables `PRAGMA foreign_keys`, which the schema's
/// cascade and set-null referential actions depend on. PostgreSQL needs no
/// per-session setup.
///
/// # Errors
/// Returns any connection establishment or setup failure.
pub fn establish_connection(
    database_url: &str,
) -> futures_util::future::BoxFuture<'_, diesel::ConnectionResult<DbConnection>> {
    use diesel_async::AsyncConnection;
    use futures_util::FutureExt;

    async move {
        #[allow(unused_mut)]
        let mut conn = DbConnection::establish(database_url).await?;
        #[cfg(feature = "sqlite")]
        {
            use diesel_async::RunQueryDsl;
            diesel::sql_query("PRAGMA foreign_keys = ON")
                .execute(&mut conn)
                .await
                .map_err(diesel::ConnectionError::CouldntSetupConfiguration)?;
        }
        Ok(conn)
    }
    .boxed()
}

/// Create a pooled connection to the configured database.
///
/// Every pooled connection goes through [`establish_connection`], so
/// backend session setup is applied uniformly.
///
/// # Errors
/// Returns any error reported by the underlying connection pool builder.
pub async fn establish_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(establish_connection);
    let config =
        AsyncDieselConnectionManager::<DbConnection>::new_with_config(database_url, manager_config);
    Pool::builder().build(config).await
}
