use crate::error::ApiError;
use crate::identity::IdentityProvider;
use log::error;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Shared SQLite connection.
///
/// Each closure runs on the blocking pool while holding the connection
/// lock, so one request at a time talks to SQLite.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` against the connection off the async executor.
    pub async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                error!("event=store_lock module=http status=error error_code=lock_poisoned");
                ApiError::Internal("store lock poisoned".to_string())
            })?;
            work(&*guard)
        })
        .await
        .map_err(|err| {
            error!("event=store_task module=http status=error error_code=join_failed error={err}");
            ApiError::Internal("store task failed".to_string())
        })?
    }
}

/// State shared by every route and filter.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub identity: Arc<dyn IdentityProvider>,
    /// Whether `/register` is open.
    pub registration_enabled: bool,
}

impl AppState {
    pub fn new(
        conn: Connection,
        identity: Arc<dyn IdentityProvider>,
        registration_enabled: bool,
    ) -> Self {
        Self {
            store: Store::new(conn),
            identity,
            registration_enabled,
        }
    }
}
