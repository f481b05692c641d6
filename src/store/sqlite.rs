use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;

use crate::config::Backend;
use crate::models::{now_timestamp, Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::{Store, StoreError};

/// Relational backend on a local SQLite file.
///
/// The schema mirrors the hosted service: unique `users.email`, and
/// `ON DELETE CASCADE` from tasks to comments.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = SqliteStore { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text            TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS comments (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id         INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                user_name       TEXT NOT NULL,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        // Single-row table holding the current-user pointer
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                id              INTEGER PRIMARY KEY CHECK (id = 1),
                user_id         INTEGER REFERENCES users(id) ON DELETE SET NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_comments_task_id ON comments(task_id)",
            [],
        )?;

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task {
            id: row.get(0)?,
            user_id: row.get(1)?,
            text: row.get(2)?,
            completed: row.get::<_, i64>(3)? != 0,
            created_at: row.get(4)?,
        })
    }

    fn row_to_comment(row: &rusqlite::Row) -> Result<Comment, rusqlite::Error> {
        Ok(Comment {
            id: row.get(0)?,
            task_id: row.get(1)?,
            user_id: row.get(2)?,
            user_name: row.get(3)?,
            content: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn get_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let task = self
            .conn
            .query_row(
                "SELECT id, user_id, text, completed, created_at FROM tasks WHERE id = ?1",
                rusqlite::params![id],
                Self::row_to_task,
            )
            .optional()?;
        Ok(task)
    }
}

/// Map a UNIQUE violation to [`StoreError::DuplicateEmail`]; users.email is
/// the only unique column besides primary keys.
fn map_insert_user_error(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Sqlite(err)
}

impl Store for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, created_at FROM users ORDER BY id ASC")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                rusqlite::params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let created_at = now_timestamp();
        self.conn
            .execute(
                "INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user.name, user.email, created_at],
            )
            .map_err(map_insert_user_error)?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: user.name,
            email: user.email,
            created_at: Some(created_at),
        })
    }

    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, text, completed, created_at
             FROM tasks WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let tasks = stmt
            .query_map(rusqlite::params![user_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        let created_at = now_timestamp();
        self.conn.execute(
            "INSERT INTO tasks (user_id, text, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![task.user_id, task.text, task.completed, created_at],
        )?;
        Ok(Task {
            id: self.conn.last_insert_rowid(),
            user_id: task.user_id,
            text: task.text,
            completed: task.completed,
            created_at: Some(created_at),
        })
    }

    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2",
            rusqlite::params![completed, id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound { entity: "Task", id });
        }
        self.get_task(id)?
            .ok_or(StoreError::NotFound { entity: "Task", id })
    }

    fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        // comments go with it via ON DELETE CASCADE
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
    }

    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; task_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, task_id, user_id, user_name, content, created_at
             FROM comments WHERE task_id IN ({}) ORDER BY id ASC",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments = stmt
            .query_map(rusqlite::params_from_iter(task_ids.iter()), Self::row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError> {
        let created_at = now_timestamp();
        self.conn.execute(
            "INSERT INTO comments (task_id, user_id, user_name, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                comment.task_id,
                comment.user_id,
                comment.user_name,
                comment.content,
                created_at
            ],
        )?;
        Ok(Comment {
            id: self.conn.last_insert_rowid(),
            task_id: comment.task_id,
            user_id: comment.user_id,
            user_name: comment.user_name,
            content: comment.content,
            created_at: Some(created_at),
        })
    }

    fn load_session(&self) -> Result<Option<i64>, StoreError> {
        let user_id: Option<Option<i64>> = self
            .conn
            .query_row("SELECT user_id FROM session WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        Ok(user_id.flatten())
    }

    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO session (id, user_id) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id",
            rusqlite::params![user_id],
        )?;
        Ok(())
    }
}
