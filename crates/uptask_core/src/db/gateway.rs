//! Persistence gateway: one lazily opened connection plus scoped transactions.
//!
//! # Responsibility
//! - Hold at most one SQLite connection per gateway, opened on first use.
//! - Run caller bodies inside a transaction that commits on `Ok` and rolls
//!   back on `Err` or unwind, exactly once per call.
//! - Provide the process-wide gateway used by host-facing entry points.
//!
//! # Invariants
//! - `connect()` is idempotent; an open connection is never reopened.
//! - Calls are serialized through the gateway mutex.

use super::open::{open_db, open_db_in_memory};
use super::{DbError, DbResult};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static PROCESS_GATEWAY: OnceCell<Database> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Memory,
}

/// Lazily connected SQLite gateway.
pub struct Database {
    target: Target,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Builds an unconnected gateway for a database file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
            conn: Mutex::new(None),
        }
    }

    /// Builds an unconnected gateway for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            target: Target::Memory,
            conn: Mutex::new(None),
        }
    }

    /// Returns the database file path, or `None` for in-memory gateways.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path.as_path()),
            Target::Memory => None,
        }
    }

    /// Opens the connection if it is not open yet.
    pub fn connect(&self) -> DbResult<()> {
        let mut slot = self.lock();
        ensure_open(&self.target, &mut slot)?;
        Ok(())
    }

    /// Returns whether a connection has been established.
    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Runs `body` inside an immediate write transaction.
    ///
    /// Commits when `body` returns `Ok`; rolls back and returns the error
    /// when it returns `Err`. An unwinding body drops the transaction, which
    /// rolls it back.
    pub fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let started_at = Instant::now();
        let mut slot = self.lock();
        let conn = ensure_open(&self.target, &mut slot)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;

        match body(&*tx) {
            Ok(value) => {
                tx.commit().map_err(DbError::from)?;
                debug!(
                    "event=db_tx module=db status=ok outcome=commit duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=db_tx module=db status=error outcome=rollback_failed error={}",
                        rollback_err
                    );
                }
                debug!(
                    "event=db_tx module=db status=ok outcome=rollback duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Runs a read-only `body` inside a deferred transaction.
    ///
    /// The transaction is always rolled back, so `body` sees one consistent
    /// snapshot and cannot leave writes behind.
    pub fn read<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut slot = self.lock();
        let conn = ensure_open(&self.target, &mut slot)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(DbError::from)?;
        let result = body(&*tx);
        tx.rollback().map_err(DbError::from)?;
        result
    }

    /// A body that panicked left the lock poisoned, but its transaction was
    /// already rolled back on unwind, so the connection is reused as is.
    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("event=db_lock module=db status=recovered reason=poisoned");
            self.conn.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }
}

/// Returns the process-wide gateway, connecting it on first use.
///
/// The first call decides the database path. Later calls are no-ops that
/// return the same gateway; a different path is ignored with a warning.
pub fn connect_to_db(path: impl AsRef<Path>) -> DbResult<&'static Database> {
    let path = path.as_ref();
    let gateway = PROCESS_GATEWAY.get_or_init(|| Database::file(path));
    if gateway.path() != Some(path) {
        warn!(
            "event=db_connect module=db status=ignored reason=already_connected active_path={} requested_path={}",
            gateway
                .path()
                .map_or_else(|| "memory".to_string(), |p| p.display().to_string()),
            path.display()
        );
    }
    gateway.connect()?;
    Ok(gateway)
}

fn ensure_open<'slot>(
    target: &Target,
    slot: &'slot mut Option<Connection>,
) -> DbResult<&'slot mut Connection> {
    let conn = match slot.take() {
        Some(conn) => conn,
        None => match target {
            Target::File(path) => open_db(path)?,
            Target::Memory => open_db_in_memory()?,
        },
    };
    Ok(slot.insert(conn))
}
