//! Embedded migration utilities.

use cfg_if::cfg_if;
use diesel::result::{Error as DieselError, QueryResult};
use diesel_migrations::MigrationHarness;

use super::connection::MIGRATIONS;

fn harness_error(e: Box<dyn std::error::Error + Send + Sync>) -> DieselError {
    DieselError::QueryBuilderError(Box::new(std::io::Error::other(e.to_string())))
}

cfg_if! {
    if #[cfg(feature = "sqlite")] {
        use super::connection::DbConnection;

        /// Apply pending migrations on an open `SQLite` connection.
        ///
        /// The sync wrapper runs the harness on a blocking thread.
        ///
        /// # Errors
        /// Returns any error raised by the migration harness.
        pub async fn apply_migrations(conn: &mut DbConnection) -> QueryResult<()> {
            conn.spawn_blocking(|c| {
                c.run_pending_migrations(MIGRATIONS)
                    .map(|_| ())
                    .map_err(harness_error)
            })
            .await?;
            Ok(())
        }

        /// Apply pending migrations against the configured database.
        ///
        /// # Errors
        /// Returns any error raised obtaining a connection or by the
        /// migration harness.
        pub async fn run_migrations(
            pool: &super::connection::DbPool,
            _database_url: &str,
        ) -> QueryResult<()> {
            let mut conn = pool
                .get()
                .await
                .map_err(|e| harness_error(e.to_string().into()))?;
            apply_migrations(&mut conn).await
        }
    } else if #[cfg(feature = "postgres")] {
        use diesel::{Connection, PgConnection};

        /// Apply pending migrations against the configured database.
        ///
        /// The harness needs a synchronous connection, so a dedicated one is
        /// established on a blocking thread directly from the URL.
        ///
        /// # Errors
        /// Returns any error raised connecting or by the migration harness.
        pub async fn run_migrations(
            _pool: &super::connection::DbPool,
            database_url: &str,
        ) -> QueryResult<()> {
            let url = database_url.to_owned();
            tokio::task::spawn_blocking(move || {
                let mut conn = PgConnection::establish(&url)
                    .map_err(|e| harness_error(e.to_string().into()))?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map(|_| ())
                    .map_err(harness_error)
            })
            .await
            .map_err(|e| harness_error(e.to_string().into()))?
        }
    }
}
