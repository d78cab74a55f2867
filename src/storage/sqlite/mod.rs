use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};

mod migrations;

use super::{Storage, StorageError};

type StorageTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum StorageCommand {
    Execute(StorageTask),
    Shutdown,
}

struct SqliteInner {
    sender: mpsc::Sender<StorageCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SqliteInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StorageCommand::Shutdown) {
                error!("Failed to send shutdown to storage thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join storage thread: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed key-value storage.
///
/// The connection lives on a dedicated worker thread; every call is shipped
/// over a channel and the caller blocks until the worker replies, so the
/// [`Storage`] contract stays synchronous.
#[derive(Clone)]
pub struct SqliteStorage {
    inner: Arc<SqliteInner>,
    path: Option<Arc<PathBuf>>,
}

impl SqliteStorage {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create storage directory {}", parent.display())
            })?;
        }

        let path_for_thread = path.clone();
        let inner = spawn_worker(move || Connection::open(&path_for_thread))?;

        info!("Storage initialized at {}", path.display());

        Ok(Self {
            inner: Arc::new(inner),
            path: Some(Arc::new(path)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let inner = spawn_worker(Connection::open_in_memory)?;
        Ok(Self {
            inner: Arc::new(inner),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    fn execute<F, T>(&self, task: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();

        let command = StorageCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Storage caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| StorageError::Unavailable(format!("storage thread gone: {err}")))?;

        reply_rx
            .recv()
            .map_err(|_| StorageError::Unavailable("storage thread terminated unexpectedly".into()))?
            .map_err(|err| StorageError::Backend(err.to_string()))
    }
}

fn spawn_worker<F>(open: F) -> Result<SqliteInner>
where
    F: FnOnce() -> rusqlite::Result<Connection> + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel::<StorageCommand>();
    let (ready_tx, ready_rx) = mpsc::channel();

    let worker = thread::Builder::new()
        .name("parkwise-storage".into())
        .spawn(move || {
            let mut conn = match open() {
                Ok(connection) => connection,
                Err(err) => {
                    let _ = ready_tx.send(Err(
                        anyhow::Error::new(err).context("failed to open SQLite storage")
                    ));
                    return;
                }
            };

            if let Err(err) =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })
            {
                error!("Failed to enable WAL mode: {err}");
            }

            let init_result = migrations::migrate(&mut conn)
                .map(|version| info!("Storage schema at version {version}"))
                .context("failed to run storage migrations");
            if ready_tx.send(init_result).is_err() {
                error!("Storage initialization receiver dropped before ready signal");
                return;
            }

            while let Ok(command) = command_rx.recv() {
                match command {
                    StorageCommand::Execute(task) => task(&mut conn),
                    StorageCommand::Shutdown => break,
                }
            }

            info!("Storage thread shutting down");
        })
        .with_context(|| "failed to spawn storage worker thread")?;

    ready_rx
        .recv()
        .map_err(|_| anyhow!("storage worker exited before signaling readiness"))??;

    Ok(SqliteInner {
        sender: command_tx,
        worker: Mutex::new(Some(worker)),
    })
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let storage = SqliteStorage::open_in_memory().expect("open");
        assert_eq!(storage.get_item("missing").expect("get"), None);

        storage.set_item("k", "first").expect("insert");
        storage.set_item("k", "second").expect("upsert");
        assert_eq!(storage.get_item("k").expect("get"), Some("second".into()));

        storage.remove_item("k").expect("remove");
        assert_eq!(storage.get_item("k").expect("get"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.sqlite3");

        {
            let storage = SqliteStorage::open(path.clone()).expect("open");
            storage.set_item("plates", "[]").expect("set");
            assert_eq!(storage.path(), Some(path.as_path()));
        }

        let reopened = SqliteStorage::open(path).expect("reopen");
        assert_eq!(reopened.get_item("plates").expect("get"), Some("[]".into()));
    }
}
