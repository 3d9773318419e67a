//! Movie schema migrations and the shape they guarantee.
//!
//! # Responsibility
//! - Register movie schema migrations and apply the pending ones in one
//!   transaction.
//! - Describe the tables and columns a fully migrated database must have, so
//!   repositories can refuse connections that were not opened through
//!   `open_db()`.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per migration.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - `MOVIES_TABLE` lists every column the latest migration leaves behind.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "rating",
        sql: include_str!("0002_rating.sql"),
    },
    Migration {
        version: 3,
        name: "row_version",
        sql: include_str!("0003_row_version.sql"),
    },
];

/// Table name plus the columns it must expose.
#[derive(Debug, Clone, Copy)]
struct TableShape {
    name: &'static str,
    columns: &'static [&'static str],
}

const MOVIES_TABLE: TableShape = TableShape {
    name: "movies",
    columns: &[
        "id",
        "title",
        "release_date",
        "genre",
        "price",
        "rating",
        "row_version",
    ],
};

const REQUIRED_TABLES: &[TableShape] = &[MOVIES_TABLE];

/// First way in which a connection falls short of the latest schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGap {
    Behind { expected: u32, actual: u32 },
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every migration newer than the connection's `user_version`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this binary.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        debug!("event=db_migrate module=db status=skipped version={from_version}");
        return Ok(());
    }

    info!("event=db_migrate module=db status=start from_version={from_version} to_version={latest}");
    let tx = conn.transaction()?;
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");

    Ok(())
}

/// Reads `PRAGMA user_version` from a connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Checks `conn` against the latest schema without modifying it.
///
/// Returns `None` when the version is current and every required table and
/// column is present.
pub fn find_schema_gap(conn: &Connection) -> DbResult<Option<SchemaGap>> {
    let expected = latest_version();
    let actual = current_user_version(conn)?;
    if actual < expected {
        return Ok(Some(SchemaGap::Behind { expected, actual }));
    }

    for table in REQUIRED_TABLES {
        let Some(columns) = table_columns(conn, table.name)? else {
            return Ok(Some(SchemaGap::MissingTable(table.name)));
        };
        if let Some(column) = table
            .columns
            .iter()
            .find(|required| !columns.iter().any(|column| column == *required))
        {
            return Ok(Some(SchemaGap::MissingColumn {
                table: table.name,
                column: *column,
            }));
        }
    }

    Ok(None)
}

/// Column names of `table`, or `None` when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> DbResult<Option<Vec<String>>> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !exists {
        return Ok(None);
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(columns))
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, find_schema_gap, latest_version, SchemaGap, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn versions_are_contiguous_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
    }

    #[test]
    fn migrated_connection_has_no_schema_gap() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(
            find_schema_gap(&conn).unwrap(),
            Some(SchemaGap::Behind {
                expected: latest_version(),
                actual: 0,
            })
        );

        apply_migrations(&mut conn).unwrap();
        assert_eq!(find_schema_gap(&conn).unwrap(), None);

        // A second run has nothing left to do.
        apply_migrations(&mut conn).unwrap();
        assert_eq!(find_schema_gap(&conn).unwrap(), None);
    }

    #[test]
    fn dropped_table_is_reported_even_when_version_is_current() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute_batch("DROP TABLE movies;").unwrap();

        assert_eq!(
            find_schema_gap(&conn).unwrap(),
            Some(SchemaGap::MissingTable("movies"))
        );
    }
}
