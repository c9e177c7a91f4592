//! Execution of generated SQL against the healthcare database.
//!
//! Every call to [`Database::run_query`] opens its own connection and releases it before
//! returning, whatever the outcome. Failures are logged and handed back inside [`Execution`]
//! rather than propagated, so a bad statement never aborts the caller.

use crate::error::QueryError;
use crate::CoreConfig;
use medquery_types::CellValue;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde::Serialize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Column names and rows returned by a statement that produced a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Outcome of running one statement.
#[derive(Debug)]
pub enum Execution {
    /// The statement had column metadata; all rows were fetched.
    Rows(ResultSet),
    /// The statement ran but produced no result set (DDL, INSERT, UPDATE, ...).
    NoResultSet { affected: usize },
    /// The statement could not be run. The error has already been logged.
    Failed(QueryError),
}

impl Execution {
    /// The fetched rows, if any. Failures and statements without a result set give `None`.
    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            Execution::Rows(rs) => Some(rs),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Execution::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Handle on the healthcare database file.
///
/// Holds no connection itself. `open_connections` counts connections currently held by
/// in-flight queries and is zero whenever no query is running.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
    live: Arc<AtomicUsize>,
}

impl Database {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::at(cfg.database_path())
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Executes `sql` verbatim on a fresh connection.
    ///
    /// No validation is applied: whatever statement is passed runs, including writes.
    pub fn run_query(&self, sql: &str) -> Execution {
        match self.execute(sql) {
            Ok(execution) => {
                match &execution {
                    Execution::Rows(rs) => tracing::info!(
                        "query returned {} row(s) in {} column(s)",
                        rs.rows.len(),
                        rs.columns.len()
                    ),
                    Execution::NoResultSet { affected } => {
                        tracing::info!("statement affected {} row(s)", affected)
                    }
                    Execution::Failed(_) => {}
                }
                execution
            }
            Err(e) => {
                tracing::error!("SQL Error: {}", e);
                Execution::Failed(e)
            }
        }
    }

    fn execute(&self, sql: &str) -> Result<Execution, QueryError> {
        let conn = self.connect()?;
        match count_statements(&conn, sql).map_err(QueryError::Execution)? {
            0 => return Err(QueryError::NoStatement),
            1 => {}
            n => return Err(QueryError::MultipleStatements(n)),
        }

        let mut stmt = conn.prepare(sql).map_err(QueryError::Execution)?;

        if stmt.column_count() == 0 {
            let affected = stmt.execute([]).map_err(QueryError::Execution)?;
            return Ok(Execution::NoResultSet { affected });
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(cell_from_ref))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(QueryError::Execution)?;

        Ok(Execution::Rows(ResultSet { columns, rows }))
    }

    fn connect(&self) -> Result<TrackedConnection, QueryError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(QueryError::Connection)?;
        enable_foreign_keys(&conn).map_err(QueryError::Connection)?;

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(TrackedConnection {
            conn,
            _lease: Lease(Arc::clone(&self.live)),
        })
    }
}

/// A connection counted in `Database::open_connections` until it is dropped.
///
/// Fields drop in declaration order: the connection is closed before the count goes down.
struct TrackedConnection {
    conn: Connection,
    _lease: Lease,
}

struct Lease(Arc<AtomicUsize>);

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Deref for TrackedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

/// Prepares every statement in `sql` without running any of them.
///
/// `Connection::prepare` only compiles the first statement and ignores the rest, so trailing
/// prose or a second statement would otherwise go unnoticed.
fn count_statements(conn: &Connection, sql: &str) -> rusqlite::Result<usize> {
    let mut batch = Batch::new(conn, sql);
    let mut count = 0;
    while batch.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

pub(crate) fn enable_foreign_keys(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(r) => CellValue::Real(r),
        ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => CellValue::Blob(b.len()),
    }
}
