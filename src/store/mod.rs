//! Persistence backends for the board.
//!
//! Every backend speaks the same [`Store`] trait so the board controller never
//! knows whether it is talking to process memory, a JSON document on disk, a
//! SQLite file or the hosted REST service.

pub mod hosted;
pub mod local;
pub mod memory;
pub mod sqlite;
#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

use crate::config::{Backend, Config};
use crate::models::{Comment, NewComment, NewTask, NewUser, Task, User};

pub use hosted::HostedStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Postgres error code for a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A user with this email already exists")]
    DuplicateEmail,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Hosted service error ({status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store configuration error: {0}")]
    Config(String),
}

pub trait Store {
    /// Which backend this is, for logging and the status bar.
    fn backend(&self) -> Backend;

    /// All users ordered by id.
    fn list_users(&self) -> Result<Vec<User>, StoreError>;
    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError>;

    /// Tasks owned by `user_id`, ordered by id.
    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError>;
    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError>;
    /// Sets the completion flag and returns the stored row.
    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError>;
    /// Deletes the task together with its comments.
    fn delete_task(&mut self, id: i64) -> Result<(), StoreError>;

    /// Comments attached to any of `task_ids`, ordered by id.
    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError>;
    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError>;

    /// The persisted current-user pointer.
    fn load_session(&self) -> Result<Option<i64>, StoreError>;
    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError>;
}

/// Open the backend selected in `config`.
pub fn open(config: &Config) -> Result<Box<dyn Store>, StoreError> {
    let store: Box<dyn Store> = match config.backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::Local => Box::new(LocalStore::open(config.get_local_path())?),
        Backend::Sqlite => {
            let path = config.get_database_path();
            let path = path
                .to_str()
                .ok_or_else(|| StoreError::Config("Database path contains invalid UTF-8".to_string()))?;
            Box::new(SqliteStore::new(path)?)
        }
        Backend::Hosted => Box::new(HostedStore::from_config(&config.hosted, config.get_session_path())?),
    };
    tracing::info!(backend = %store.backend(), "Opened store");
    Ok(store)
}
