//! Process-wide database handle.
//!
//! `init` opens the database once, `shared` hands out the handle, and
//! `close` tears it down. Nothing is opened lazily.

use std::sync::{Arc, Mutex, MutexGuard};

use docqa_core::error::StoreError;
use tracing::{debug, warn};

use crate::sqlite::Database;

static SHARED: Mutex<Option<Arc<Database>>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Arc<Database>>> {
    SHARED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open the process-wide database at `path`.
///
/// Calling `init` again while a handle is live returns the existing handle;
/// a different path is logged and ignored until [`close`] is called.
pub async fn init(path: &str) -> Result<Arc<Database>, StoreError> {
    let current = slot().clone();
    if let Some(db) = current {
        if db.path() != path {
            warn!(open = db.path(), requested = path, "Database already initialized");
        }
        return Ok(db);
    }

    let db = Arc::new(Database::connect(path).await?);

    let existing = {
        let mut guard = slot();
        match guard.as_ref() {
            Some(existing) => Some(existing.clone()),
            None => {
                *guard = Some(db.clone());
                None
            }
        }
    };

    // Lost a race with another init; keep the first handle.
    if let Some(existing) = existing {
        db.close().await;
        return Ok(existing);
    }

    debug!(path, "Process-wide database initialized");
    Ok(db)
}

/// The handle opened by [`init`].
pub fn shared() -> Result<Arc<Database>, StoreError> {
    slot().clone().ok_or(StoreError::NotInitialized)
}

/// Close the process-wide database. A no-op when nothing is open.
pub async fn close() {
    let db = slot().take();
    if let Some(db) = db {
        db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::HashEmbedder;

    // One test touches the global slot so parallel tests cannot interfere.
    #[tokio::test]
    async fn init_shared_close_lifecycle() {
        assert!(matches!(shared(), Err(StoreError::NotInitialized)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.sqlite");
        let path = path.to_str().unwrap();

        let db = init(path).await.unwrap();
        let again = init(path).await.unwrap();
        assert!(Arc::ptr_eq(&db, &again));
        assert!(Arc::ptr_eq(&db, &shared().unwrap()));

        shared()
            .unwrap()
            .create_table("docling", Arc::new(HashEmbedder::new(8)))
            .await
            .unwrap();

        close().await;
        assert!(matches!(shared(), Err(StoreError::NotInitialized)));
        close().await;

        let reopened = init(path).await.unwrap();
        assert!(reopened.table_exists("docling").await.unwrap());
        close().await;
    }
}
