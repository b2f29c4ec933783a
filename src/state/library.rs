use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::data::{Photo, PhotoId};
use crate::error::{Error, Result};

/// Bump when the `photos` table changes shape. Databases carrying another
/// version are dropped and recreated.
pub const SCHEMA_VERSION: i32 = 1;

/// The PhotoLibrary manages the SQLite database of saved photos.
///
/// Every insert and delete re-reads the whole table and publishes it to
/// subscribers, so `subscribe()` is a live mirror of what is on disk.
#[derive(Clone)]
pub struct PhotoLibrary {
    inner: Arc<Inner>,
    db_path: Option<PathBuf>,
}

struct Inner {
    conn: Mutex<Connection>,
    changes: watch::Sender<Vec<Photo>>,
}

impl PhotoLibrary {
    /// Open (or create) the database at `db_path` and initialize the schema.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(&db_path)?;
        info!("📁 Database initialized at: {}", db_path.display());

        Self::with_connection(conn, Some(db_path))
    }

    /// A throwaway database, gone when the last clone is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        init_schema(&conn)?;
        let current = query_all(&conn)?;
        let (changes, _) = watch::channel(current);

        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                changes,
            }),
            db_path,
        })
    }

    /// Path of the database file, `None` for in-memory libraries
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Live view of every saved photo, ordered by id
    pub fn subscribe(&self) -> watch::Receiver<Vec<Photo>> {
        self.inner.changes.subscribe()
    }

    /// Save a photo. Fails with `Duplicate` if its id is already present.
    pub async fn insert(&self, photo: Photo) -> Result<()> {
        self.write(move |conn| {
            let result = conn.execute(
                "INSERT INTO photos (id, album_id, title, image_url, thumbnail_url, saved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    photo.id,
                    photo.album_id,
                    &photo.title,
                    &photo.image_url,
                    &photo.thumbnail_url,
                    Utc::now().timestamp(),
                ],
            );

            match result {
                Ok(_) => Ok(()),
                // UNIQUE / PRIMARY KEY violation means the photo is already saved
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(Error::Duplicate(photo.id))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Remove a saved photo. Fails with `NotFound` if nothing was removed.
    pub async fn delete(&self, id: PhotoId) -> Result<()> {
        self.write(move |conn| {
            let removed = conn.execute("DELETE FROM photos WHERE id = ?1", params![id])?;
            if removed == 0 {
                return Err(Error::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: PhotoId) -> Result<Option<Photo>> {
        self.read(move |conn| {
            conn.query_row(
                "SELECT id, album_id, title, image_url, thumbnail_url FROM photos WHERE id = ?1",
                params![id],
                photo_from_row,
            )
            .optional()
            .map_err(Error::from)
        })
        .await
    }

    pub async fn all(&self) -> Result<Vec<Photo>> {
        self.read(query_all).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
                .map_err(Error::from)
        })
        .await
    }

    /// Run a mutation on the blocking pool, then publish the new contents.
    /// Both happen under the connection lock so observers never see a torn set.
    async fn write<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&Connection) -> Result<()> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let conn = inner.lock();
            op(&conn)?;

            let current = query_all(&conn)?;
            debug!("saved set now holds {} photos", current.len());
            inner.changes.send_replace(current);
            Ok(())
        })
        .await?
    }

    async fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner.lock())).await?
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves SQLite itself consistent, keep going
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Initialize the database schema.
/// Drops the table first when the stored schema version is a different one.
fn init_schema(conn: &Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version != 0 && version != SCHEMA_VERSION {
        warn!(
            "🔄 Schema version {} does not match {}, recreating saved photos",
            version, SCHEMA_VERSION
        );
        conn.execute("DROP TABLE IF EXISTS photos", [])?;
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            id              INTEGER PRIMARY KEY,
            album_id        INTEGER NOT NULL,
            title           TEXT NOT NULL,
            image_url       TEXT NOT NULL,
            thumbnail_url   TEXT NOT NULL,
            saved_at        INTEGER NOT NULL
        )",
        [],
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    debug!("✅ Database schema initialized");

    Ok(())
}

fn query_all(conn: &Connection) -> Result<Vec<Photo>> {
    let mut stmt = conn.prepare(
        "SELECT id, album_id, title, image_url, thumbnail_url FROM photos ORDER BY id ASC",
    )?;

    let photos = stmt
        .query_map([], photo_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(photos)
}

fn photo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        album_id: row.get(1)?,
        title: row.get(2)?,
        image_url: row.get(3)?,
        thumbnail_url: row.get(4)?,
    })
}

impl std::fmt::Debug for PhotoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoLibrary")
            .field("db_path", &self.db_path)
            .finish()
    }
}
