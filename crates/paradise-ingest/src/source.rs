//! Relational row sources.
//!
//! A source yields one table at a time as a stream of untyped rows. The
//! SQLite reader runs on a blocking thread and hands rows over a bounded
//! channel, so at most `buffer` rows are held in memory and a slow graph
//! write applies back-pressure to the reader.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{IngestError, Result};

/// Rows kept in flight between the reader thread and the pipeline.
pub const DEFAULT_BUFFER: usize = 64;

/// One column value of a source row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// The value as a string attribute. NULL and empty strings are unset.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(i) => Some(i.to_string()),
            Self::Real(r) => Some(r.to_string()),
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// The value as an integer id. Numeric text is accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                Self::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

pub type Row = Vec<Cell>;

/// Rows of one table, in source order.
pub struct RowStream {
    rx: mpsc::Receiver<Result<Row>>,
    worker: Option<JoinHandle<()>>,
}

impl RowStream {
    /// Next row, `None` once the table is exhausted.
    pub async fn next(&mut self) -> Option<Result<Row>> {
        if let Some(item) = self.rx.recv().await {
            return Some(item);
        }
        let worker = self.worker.take()?;
        match worker.await {
            Ok(()) => None,
            Err(e) => Some(Err(IngestError::SourceWorker(e.to_string()))),
        }
    }
}

/// Anything that can stream the rows of a named table.
pub trait RowSource: Send + Sync {
    fn scan(&self, table: &str) -> RowStream;
}

/// Reads tables from a SQLite database file, opened read-only.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    buffer: usize,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            buffer: DEFAULT_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

impl RowSource for SqliteSource {
    fn scan(&self, table: &str) -> RowStream {
        let (tx, rx) = mpsc::channel(self.buffer);
        let path = self.path.clone();
        let table = table.to_string();

        let worker = tokio::task::spawn_blocking(move || {
            if let Err(e) = scan_blocking(&path, &table, &tx) {
                let _ = tx.blocking_send(Err(e.into()));
            }
        });

        RowStream {
            rx,
            worker: Some(worker),
        }
    }
}

fn select_all(table: &str) -> String {
    format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""))
}

fn scan_blocking(
    path: &Path,
    table: &str,
    tx: &mpsc::Sender<Result<Row>>,
) -> rusqlite::Result<()> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare(&select_all(table))?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(Cell::from(row.get_ref(idx)?));
        }
        if tx.blocking_send(Ok(cells)).is_err() {
            // Receiver dropped: the pipeline stopped reading this table.
            break;
        }
    }
    Ok(())
}
