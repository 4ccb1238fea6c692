use std::error::Error;

use diesel::{sql_query, RunQueryDsl, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

pub const REGISTRY_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/registry");

/// Runs all pending migrations.
///
/// A migration failing with "already exists" is recorded as applied and the loop moves on,
/// so databases whose tables were created outside of diesel can be adopted.
pub fn apply_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    loop {
        match conn.run_pending_migrations(REGISTRY_MIGRATIONS) {
            Ok(applied) => {
                if !applied.is_empty() {
                    debug!("applied {} registry migration(s)", applied.len());
                }
                break;
            }
            Err(e) if e.to_string().contains("already exists") => {
                mark_first_pending(conn)?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

fn mark_first_pending(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let pending = conn.pending_migrations(REGISTRY_MIGRATIONS)?;
    if let Some(first) = pending.first() {
        debug!("marking migration {} as applied", first.name());
        sql_query("INSERT INTO __diesel_schema_migrations (version) VALUES (?1)")
            .bind::<diesel::sql_types::Text, _>(first.name().version().to_string())
            .execute(conn)?;
    }

    Ok(())
}
