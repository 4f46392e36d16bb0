use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params_from_iter, types::Value as SqlValue};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use soulbridge_api::db::Built;
use soulbridge_api::db::migrations::MIGRATIONS;

use crate::error::ApiErr;

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        // An open transaction is rolled back when its guard unwinds, so the
        // connection is still consistent after a panic.
        self.conn.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'_, Connection>>| {
            tracing::warn!("database mutex was poisoned, recovering connection");
            poisoned.into_inner()
        })
    }
}

/// Run `f` atomically. When `conn` is already inside a transaction, `f` joins
/// it and the outermost caller commits.
pub fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, ApiErr>,
) -> Result<T, ApiErr> {
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let value = f(&tx)?;
    tx.commit().map_err(ApiErr::from_db("commit transaction"))?;
    Ok(value)
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("soulbridge.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("checking migration state")?;

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("applied migration: {name}");
        }
    }

    Ok(())
}

// ── sea-query bridge ───────────────────────────────────────────────────────

/// Convert sea-query bind values into rusqlite values.
fn to_sql_values(values: &sea_query::Values) -> Vec<SqlValue> {
    values
        .0
        .iter()
        .map(|v| match v {
            sea_query::Value::Bool(Some(b)) => SqlValue::Integer(i64::from(*b)),
            sea_query::Value::Int(Some(i)) => SqlValue::Integer(i64::from(*i)),
            sea_query::Value::BigInt(Some(i)) => SqlValue::Integer(*i),
            sea_query::Value::Unsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            sea_query::Value::BigUnsigned(Some(u)) => {
                SqlValue::Integer(i64::try_from(*u).unwrap_or(i64::MAX))
            }
            sea_query::Value::Double(Some(f)) => SqlValue::Real(*f),
            sea_query::Value::String(Some(s)) => SqlValue::Text(s.as_str().to_string()),
            sea_query::Value::Bytes(Some(b)) => SqlValue::Blob(b.to_vec()),
            _ => SqlValue::Null,
        })
        .collect()
}

/// Execute a built statement, returning the number of changed rows.
pub fn sq_execute(conn: &Connection, built: Built) -> rusqlite::Result<usize> {
    let (sql, values) = built;
    conn.execute(&sql, params_from_iter(to_sql_values(&values)))
}

pub fn sq_query_row<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let (sql, values) = built;
    conn.query_row(&sql, params_from_iter(to_sql_values(&values)), f)
}

pub fn sq_query_map<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let (sql, values) = built;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(to_sql_values(&values)), f)?;
    rows.collect()
}
