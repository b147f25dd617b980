//! # Backup / Restore Manager
//!
//! Point-in-time snapshots of the store (database file + image assets)
//! and restore-from-latest with a safe handle lifecycle.
//!
//! ## Snapshot Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  <backups dir>/                                                 │
//! │  ├── backup_2026-08-25T12-30-45-123Z/   ← directory form        │
//! │  │   ├── stok.db                                                │
//! │  │   └── images/…                       ← recursive copy        │
//! │  ├── backup_2026-08-24T09-00-01-007Z/                           │
//! │  └── backup_2024-01-01T00-00-00.db      ← legacy: bare db file  │
//! │                                                                 │
//! │  Names embed a UTC timestamp with ':' and '.' replaced, so      │
//! │  lexicographic order IS chronological order. Retention keeps    │
//! │  the 10 newest entries and deletes the rest, either form.       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restore Sequence
//! ```text
//! restore_latest(reopen)
//!   1. pick lexicographically-last backup_* entry (else NotFound)
//!   2. force-close the store (open files are locked on Windows)
//!   3. delete the stale -wal/-shm sidecars: closing the pool does
//!      not remove them, and SQLite recovery would replay their
//!      frames (the pre-restore mutations) over the restored file
//!   4. copy snapshot db over the live db file
//!   5. merge-copy the snapshot images over the live images tree
//!      (files only present live are left untouched)
//!   6. reopen the store only if `reopen` - otherwise the host
//!      decides whether to restart instead of running half-restored
//! ```
//!
//! Every filesystem failure surfaces as a structured [`DbError`];
//! nothing here may take the process down.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::store::{Store, DB_FILE_NAME};
use stok_core::BACKUP_RETENTION;

/// Prefix shared by every snapshot entry, directory or legacy file.
const SNAPSHOT_PREFIX: &str = "backup_";

/// Name of the image subtree inside a directory-form snapshot.
const SNAPSHOT_IMAGES_DIR: &str = "images";

/// Snapshot and restore operations over one store.
///
/// Borrowed from [`Store::backup`]; deliberately usable while the
/// store is closed, since restore works on the raw files.
#[derive(Debug)]
pub struct BackupManager<'a> {
    store: &'a Store,
}

impl<'a> BackupManager<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        BackupManager { store }
    }

    /// Creates a new snapshot directory and prunes old snapshots.
    ///
    /// The database is copied with SQLite's `VACUUM INTO` while the
    /// store is open (a consistent live backup); a raw file copy is
    /// used when it is closed. Returns the snapshot path.
    pub async fn create_snapshot(&self) -> DbResult<PathBuf> {
        let options = self.store.options();
        fs::create_dir_all(&options.backups_dir)?;

        let name = format!(
            "{SNAPSHOT_PREFIX}{}",
            Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ")
        );
        let snapshot_dir = options.backups_dir.join(&name);
        fs::create_dir_all(&snapshot_dir)?;

        info!(path = %snapshot_dir.display(), "creating backup snapshot");

        // 1. The database file.
        let db_dest = snapshot_dir.join(DB_FILE_NAME);
        match self.store.pool() {
            Ok(pool) => {
                // Live backup: VACUUM INTO writes a compact, consistent
                // copy without closing the handle.
                let dest = db_dest.display().to_string().replace('\'', "''");
                sqlx::query(&format!("VACUUM INTO '{dest}'"))
                    .execute(&pool)
                    .await?;
            }
            Err(DbError::Closed) => {
                if options.database_path.exists() {
                    // A closed store may still carry uncheckpointed WAL
                    // frames next to the main file; a raw copy of just
                    // stok.db would miss them. A short-lived connection
                    // folds the WAL into the copy.
                    let mut conn = SqliteConnectOptions::new()
                        .filename(&options.database_path)
                        .connect()
                        .await?;
                    let dest = db_dest.display().to_string().replace('\'', "''");
                    sqlx::query(&format!("VACUUM INTO '{dest}'"))
                        .execute(&mut conn)
                        .await?;
                    conn.close().await?;
                } else {
                    // No database at all; still snapshot the images.
                    warn!("no live database file; snapshot will hold images only");
                }
            }
            Err(other) => return Err(other),
        }

        // 2. The image assets, recursively.
        if options.images_dir.exists() {
            copy_dir_recursive(&options.images_dir, &snapshot_dir.join(SNAPSHOT_IMAGES_DIR))?;
        }

        // 3. Retention.
        self.prune_old_snapshots()?;

        Ok(snapshot_dir)
    }

    /// Restores the most recent snapshot over the live store.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when no backups root or no snapshot
    /// exists. The store is left closed when `reopen` is false.
    pub async fn restore_latest(&self, reopen: bool) -> DbResult<PathBuf> {
        let options = self.store.options();

        if !options.backups_dir.exists() {
            return Err(DbError::not_found(
                "backups directory",
                options.backups_dir.display().to_string(),
            ));
        }

        let mut snapshots = list_snapshots(&options.backups_dir)?;
        let latest = snapshots.pop().ok_or_else(|| {
            DbError::not_found("backup snapshot", options.backups_dir.display().to_string())
        })?;

        info!(path = %latest.display(), reopen, "restoring latest snapshot");

        // Open file handles would block the copy on some platforms.
        self.store.close().await;

        // Closing the pool leaves the -wal/-shm sidecars behind. They
        // hold the pre-restore mutations; left in place, SQLite
        // recovery would replay them over the restored file on reopen.
        remove_wal_sidecars(&options.database_path)?;

        if latest.is_dir() {
            // Directory form: database plus image subtree.
            let db_source = latest.join(DB_FILE_NAME);
            if db_source.exists() {
                fs::copy(&db_source, &options.database_path)?;
            }

            let images_source = latest.join(SNAPSHOT_IMAGES_DIR);
            if images_source.exists() {
                fs::create_dir_all(&options.images_dir)?;
                // Merge/overwrite: files only present live stay.
                copy_dir_recursive(&images_source, &options.images_dir)?;
            }
        } else {
            // Legacy form: the snapshot is a bare database file.
            fs::copy(&latest, &options.database_path)?;
        }

        if reopen {
            self.store.reopen().await?;
        }

        Ok(latest)
    }

    /// Keeps the [`BACKUP_RETENTION`] newest snapshots, deleting older
    /// entries whether they are directories or legacy files.
    fn prune_old_snapshots(&self) -> DbResult<()> {
        let mut snapshots = list_snapshots(&self.store.options().backups_dir)?;
        if snapshots.len() <= BACKUP_RETENTION {
            return Ok(());
        }

        // Ascending name order == chronological; everything before the
        // retention window goes.
        let excess = snapshots.len() - BACKUP_RETENTION;
        for old in snapshots.drain(..excess) {
            debug!(path = %old.display(), "pruning old snapshot");
            if old.is_dir() {
                fs::remove_dir_all(&old)?;
            } else {
                fs::remove_file(&old)?;
            }
        }
        Ok(())
    }
}

/// Deletes the `-wal` and `-shm` sidecar files next to a database
/// file, if present. Must only run while no connection is open.
fn remove_wal_sidecars(db_path: &Path) -> std::io::Result<()> {
    for suffix in ["-wal", "-shm"] {
        let mut name = db_path.as_os_str().to_os_string();
        name.push(suffix);
        let sidecar = PathBuf::from(name);
        if sidecar.exists() {
            fs::remove_file(&sidecar)?;
        }
    }
    Ok(())
}

/// Lists `backup_*` entries under the backups root, sorted ascending
/// by name (oldest first).
fn list_snapshots(backups_dir: &Path) -> DbResult<Vec<PathBuf>> {
    let mut snapshots = Vec::new();
    for entry in fs::read_dir(backups_dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(SNAPSHOT_PREFIX) {
            snapshots.push(entry.path());
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

/// Copies a directory tree, creating destination directories and
/// overwriting existing files. Files only present in the destination
/// are left alone.
fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
