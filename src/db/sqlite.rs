//! SQLite connection setup and embedded schema migrations.

use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Numbered migrations, embedded at compile time and applied in order.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/001_initial.sql"),
)];

/// Open the submissions database at `path`, applying pending migrations.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    initialize(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    initialize(&conn)?;
    Ok(conn)
}

fn initialize(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    run_migrations(conn)
}

/// Apply every migration newer than the stored schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = schema_version(conn);
    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
        tracing::info!(version, "applying schema migration");
        conn.execute_batch(sql)
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

/// Highest applied migration version; 0 on a fresh database.
fn schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
    .unwrap_or(0)
}
