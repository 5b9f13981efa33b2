//! Asynchronous boundary around the database.
//!
//! Callers hand work to [`Dispatcher::submit`] as a closure over a
//! [`Database`] handle and await the result; the closure itself runs on a
//! blocking worker so the async runtime is never stalled by SQLite. No
//! cancellation, timeout, or retry is layered on top.

use crate::db::Database;
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Dispatcher {
    db: Database,
}

impl Dispatcher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Runs `op` against the database on a blocking worker and returns its
    /// result. A worker that panics or is torn down surfaces as
    /// [`Error::Worker`] rather than poisoning the caller.
    pub async fn submit<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|err| Error::Worker(err.to_string()))?
    }
}
