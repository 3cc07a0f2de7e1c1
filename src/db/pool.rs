// src/db/pool.rs
// Async connection pool using deadpool-sqlite
//
// All database access goes through `interact()` (anyhow::Result) or `run()`
// (SymdexError, for MCP tool handlers). Closures execute on the blocking
// thread pool so SQLite work never stalls the async runtime. In-memory
// databases use a shared-cache URI so every pooled connection sees the same
// state — required for tests that write on one connection and read on another.

use crate::db::schema;
use crate::error::SymdexError;
use anyhow::{Context, Result};
use deadpool_sqlite::{Config, Hook, Pool, Runtime};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registers sqlite-vec extension globally (once per process).
/// Must be called before any SQLite connections are opened.
static SQLITE_VEC_INIT: Once = Once::new();

/// Monotonic counter so each in-memory database gets its own URI.
static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

#[allow(clippy::missing_transmute_annotations)]
pub(crate) fn ensure_sqlite_vec_registered() {
    SQLITE_VEC_INIT.call_once(|| {
        // SAFETY: sqlite3_vec_init has the signature expected by
        // sqlite3_auto_extension. The transmute converts the fn-pointer to the
        // Option<extern "C" fn()> that sqlite3_auto_extension accepts; the
        // pointer targets a statically-linked symbol so it stays valid for the
        // lifetime of the process.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite3_vec_init as *const (),
            )));
        }
        tracing::debug!("sqlite-vec extension registered globally");
    });
}

/// Database pool wrapper with sqlite-vec support and per-connection setup.
pub struct DatabasePool {
    pool: Pool,
    path: Option<PathBuf>,
    embedding_dimensions: usize,
}

enum DbStorage {
    File(PathBuf),
    InMemory,
}

impl DatabasePool {
    /// Open a pooled database at the given path and run schema setup.
    ///
    /// Fails if the on-disk database carries a foreign schema version or a
    /// vector table whose dimension disagrees with `embedding_dimensions`.
    pub async fn open(path: &Path, embedding_dimensions: usize) -> Result<Self> {
        Self::open_internal(DbStorage::File(path.to_path_buf()), embedding_dimensions).await
    }

    /// Open a pooled in-memory database (for tests).
    pub async fn open_in_memory(embedding_dimensions: usize) -> Result<Self> {
        Self::open_internal(DbStorage::InMemory, embedding_dimensions).await
    }

    async fn open_internal(storage: DbStorage, embedding_dimensions: usize) -> Result<Self> {
        ensure_sqlite_vec_registered();

        let (conn_str, path) = match storage {
            DbStorage::File(p) => {
                if let Some(parent) = p.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                (p.to_string_lossy().to_string(), Some(p))
            }
            DbStorage::InMemory => {
                let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
                (
                    format!("file:symdex_memdb_{n}?mode=memory&cache=shared"),
                    None,
                )
            }
        };

        let is_memory = path.is_none();
        let cfg = Config::new(&conn_str);
        let pool = cfg
            .builder(Runtime::Tokio1)
            .context("Failed to create pool builder")?
            .max_size(8)
            .post_create(make_post_create_hook(is_memory))
            .build()
            .context("Failed to build connection pool")?;

        let db_pool = Self {
            pool,
            path,
            embedding_dimensions,
        };

        db_pool
            .interact(move |conn| {
                schema::init_schema_sync(conn, embedding_dimensions).map_err(anyhow::Error::from)
            })
            .await?;

        Ok(db_pool)
    }

    /// Run a closure with a connection from the pool.
    ///
    /// This is the primary API for database access. The closure runs on a
    /// blocking thread pool, so it won't block the async runtime.
    pub async fn interact<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        conn.interact(move |conn| f(conn))
            .await
            .map_err(|e| anyhow::anyhow!("interact failed: {e}"))?
    }

    /// Run a closure and return `Result<T, SymdexError>` for tool handlers.
    pub async fn run<F, R, E>(&self, f: F) -> Result<R, SymdexError>
    where
        F: FnOnce(&Connection) -> Result<R, E> + Send + 'static,
        R: Send + 'static,
        E: Into<SymdexError> + Send + 'static,
    {
        self.pool
            .get()
            .await
            .map_err(|e| SymdexError::Other(format!("Failed to get connection: {e}")))?
            .interact(move |conn| f(conn).map_err(Into::into))
            .await
            .map_err(|e| SymdexError::Other(format!("Database error: {e}")))?
    }

    /// Get the database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The embedding dimension this pool's vector table was created with.
    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}

/// Configure each pooled connection after creation.
///
/// WAL is skipped for in-memory databases (not applicable); everything else
/// is shared: foreign-key enforcement, busy timeout, reduced fsync overhead.
fn make_post_create_hook(is_memory: bool) -> Hook {
    Hook::async_fn(move |conn, _metrics| {
        Box::pin(async move {
            conn.interact(move |conn| {
                let pragmas = if is_memory {
                    "PRAGMA foreign_keys=ON; \
                     PRAGMA busy_timeout=5000;"
                } else {
                    "PRAGMA journal_mode=WAL; \
                     PRAGMA foreign_keys=ON; \
                     PRAGMA busy_timeout=5000; \
                     PRAGMA synchronous=NORMAL;"
                };
                conn.execute_batch(pragmas)?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(|e| deadpool_sqlite::HookError::Message(format!("interact failed: {e}").into()))?
            .map_err(|e| {
                deadpool_sqlite::HookError::Message(format!("connection setup failed: {e}").into())
            })
        })
    })
}
