mod feed;
mod migrations;
pub mod queries;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::watch;

pub use feed::TaskFeed;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock poisoned")]
    LockPoisoned,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Handle to the task table.
///
/// Cheap to clone; clones share one connection and one revision channel, so
/// every mutation through any clone wakes every open [`TaskFeed`].
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        Self::from_conn(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_conn(conn)
    }

    pub fn open_default() -> Result<Self, DbError> {
        let dir = data_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open(&dir.join("snaptask.db"))
    }

    fn from_conn(conn: Connection) -> Result<Self, DbError> {
        let (revision, _) = watch::channel(0);
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            revision: Arc::new(revision),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Subscribe to the ordered task listing. The feed emits the current
    /// listing immediately and re-emits after every mutation.
    pub fn observe(&self) -> TaskFeed {
        TaskFeed::new(self.clone(), self.revision.subscribe())
    }

    /// Bump the revision so open feeds re-query. Called after every mutation.
    pub(crate) fn mark_changed(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            migrations::run(conn)?;
            Ok(())
        })
    }
}

/// Default data directory for the on-disk database.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("snaptask")
}
