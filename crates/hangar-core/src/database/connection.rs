//! Database connection management.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use diesel::{Connection as DieselConnection, SqliteConnection};
use hangar_db::{connection::DbConnection, error::DbError};
use hangar_utils::fs::ensure_dir_exists;

use crate::{error::RegistryError, RegistryResult};

/// Thread-safe handle to the registry database.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct RegistryDatabase {
    conn: Arc<Mutex<DbConnection>>,
}

impl RegistryDatabase {
    /// Opens the registry database, creating the parent directory and applying migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir_exists(parent)?;
        }

        let conn = DbConnection::open(path).map_err(DbError::from)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RegistryResult<Self> {
        let conn = DbConnection::open_in_memory().map_err(DbError::from)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Locks the connection.
    pub fn conn(&self) -> RegistryResult<MutexGuard<'_, DbConnection>> {
        self.conn.lock().map_err(|_| RegistryError::PoisonError)
    }

    /// Executes a function with the connection outside of any transaction.
    pub fn with_conn<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> RegistryResult<T>,
    {
        let mut conn = self.conn()?;
        f(conn.conn())
    }

    /// Executes a function within a transaction. Any error rolls back every write made
    /// by the closure.
    pub fn transaction<F, T>(&self, f: F) -> RegistryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> RegistryResult<T>,
    {
        let mut conn = self.conn()?;
        conn.conn().transaction(f)
    }
}

#[cfg(test)]
mod tests {
    use diesel::{dsl::count_star, prelude::*};
    use hangar_db::schema::packages;
    use tempfile::tempdir;

    use super::*;

    fn insert_package(conn: &mut SqliteConnection, name: &str) -> RegistryResult<usize> {
        Ok(diesel::insert_into(packages::table)
            .values((
                packages::owner_id.eq(1_i64),
                packages::package_type.eq("conan"),
                packages::name.eq(name),
                packages::lower_name.eq(name),
                packages::created_unix.eq(0_i64),
            ))
            .execute(conn)?)
    }

    fn count(db: &RegistryDatabase) -> i64 {
        db.with_conn(|conn| Ok(packages::table.select(count_star()).first(conn)?))
            .unwrap()
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.db");

        let db = RegistryDatabase::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_transaction_commits() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        db.transaction(|conn| insert_package(conn, "zlib")).unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = RegistryDatabase::open_in_memory().unwrap();

        let result: RegistryResult<()> = db.transaction(|conn| {
            insert_package(conn, "zlib")?;
            Err(RegistryError::Custom("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn test_clones_share_connection() {
        let db = RegistryDatabase::open_in_memory().unwrap();
        let other = db.clone();
        other
            .with_conn(|conn| insert_package(conn, "zlib"))
            .unwrap();
        assert_eq!(count(&db), 1);
    }
}
