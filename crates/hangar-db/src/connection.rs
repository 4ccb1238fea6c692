//! Database connection management.

use std::path::Path;

use diesel::{sql_query, Connection, ConnectionError, RunQueryDsl, SqliteConnection};

use crate::migration::apply_migrations;

/// Database connection wrapper with migration support.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens the registry database and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConnectionError> {
        let path_str = path.as_ref().to_string_lossy();
        let mut conn = SqliteConnection::establish(&path_str)?;

        // WAL mode for better concurrent access
        sql_query("PRAGMA journal_mode = WAL;")
            .execute(&mut conn)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        Self::prepare(conn)
    }

    /// Opens a private in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        let conn = SqliteConnection::establish(":memory:")?;
        Self::prepare(conn)
    }

    fn prepare(mut conn: SqliteConnection) -> Result<Self, ConnectionError> {
        // LIKE is case-sensitive, like `=` on property values.
        for pragma in [
            "PRAGMA foreign_keys = ON;",
            "PRAGMA busy_timeout = 5000;",
            "PRAGMA case_sensitive_like = ON;",
        ] {
            sql_query(pragma)
                .execute(&mut conn)
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        }

        apply_migrations(&mut conn).map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        Ok(Self { conn })
    }

    /// Gets a mutable reference to the underlying connection.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for DbConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use diesel::{dsl::count_star, QueryDsl};
    use tempfile::tempdir;

    use super::*;
    use crate::schema::packages;

    #[test]
    fn test_open_runs_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.db");

        let mut db = DbConnection::open(&path).unwrap();
        let count: i64 = packages::table
            .select(count_star())
            .first(db.conn())
            .unwrap();
        assert_eq!(count, 0);
        drop(db);

        // Reopening an already migrated database is a no-op.
        assert!(DbConnection::open(&path).is_ok());
    }

    #[test]
    fn test_open_in_memory() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let count: i64 = packages::table
            .select(count_star())
            .first(db.conn())
            .unwrap();
        assert_eq!(count, 0);
    }
}
