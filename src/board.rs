//! The board controller.
//!
//! [`Board`] holds the client-side view of users, the current user, that
//! user's tasks and the comments on them, and keeps the view in step with
//! the [`Store`] after every operation. Each operation makes its store call
//! first and only touches the view once the call succeeds, so a failed call
//! leaves the view exactly as it was.

use thiserror::Error;

use crate::models::{Column, Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0}")]
    Validation(String),
    #[error("Please select a user")]
    NoUserSelected,
    #[error("User {0} does not exist")]
    UnknownUser(i64),
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("This email address is already registered")]
    DuplicateEmail,
    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => BoardError::DuplicateEmail,
            other => BoardError::Store(other),
        }
    }
}

/// Which screen the front end should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Loading,
    Board,
}

pub struct Board {
    store: Box<dyn Store>,
    users: Vec<User>,
    current_user: Option<User>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    loaded: bool,
}

impl Board {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            users: Vec::new(),
            current_user: None,
            tasks: Vec::new(),
            comments: Vec::new(),
            loaded: false,
        }
    }

    /// Initial fetch: the user list, then the saved session if it still
    /// points at an existing user.
    ///
    /// The fetch is attempted once. On failure the board still leaves the
    /// loading screen, logged out with whatever it managed to read, and the
    /// error goes to the caller to surface.
    pub fn start(&mut self) -> Result<(), BoardError> {
        self.loaded = true;
        if let Err(err) = self.initial_fetch() {
            self.current_user = None;
            self.tasks.clear();
            self.comments.clear();
            tracing::error!(error = %err, "Initial load failed");
            return Err(err);
        }
        tracing::info!(
            backend = %self.store.backend(),
            users = self.users.len(),
            logged_in = self.current_user.is_some(),
            "Board loaded"
        );
        Ok(())
    }

    fn initial_fetch(&mut self) -> Result<(), BoardError> {
        self.users = self.store.list_users()?;
        self.restore_session()
    }

    pub fn restore_session(&mut self) -> Result<(), BoardError> {
        let Some(user_id) = self.store.load_session()? else {
            return Ok(());
        };
        match self.store.get_user(user_id)? {
            Some(user) => {
                self.current_user = Some(user);
                self.load_user_data()?;
            }
            None => {
                tracing::warn!(user_id, "Saved session points at a missing user, clearing it");
                self.store.save_session(None)?;
            }
        }
        Ok(())
    }

    pub fn screen(&self) -> Screen {
        if !self.loaded {
            Screen::Loading
        } else if self.current_user.is_some() {
            Screen::Board
        } else {
            Screen::Login
        }
    }

    pub fn backend_name(&self) -> String {
        self.store.backend().to_string()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tasks_in(&self, column: Column) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| Column::of(t) == column)
            .collect()
    }

    pub fn comments_for(&self, task_id: i64) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .collect()
    }

    /// Create a user and log in as them
    pub fn register(&mut self, name: &str, email: &str) -> Result<User, BoardError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(BoardError::Validation("Please enter both a name and an email".to_string()));
        }

        let user = self.store.insert_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
        })?;
        tracing::info!(user_id = user.id, "Registered user");

        self.users.push(user.clone());
        self.set_current_user(user.clone())?;
        Ok(user)
    }

    /// Log in as an existing user, fetched fresh from the store
    pub fn login(&mut self, user_id: Option<i64>) -> Result<User, BoardError> {
        let user_id = user_id.ok_or(BoardError::NoUserSelected)?;
        let user = self
            .store
            .get_user(user_id)?
            .ok_or(BoardError::UnknownUser(user_id))?;
        tracing::info!(user_id, "Logged in");
        self.set_current_user(user.clone())?;
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<(), BoardError> {
        self.store.save_session(None)?;
        if let Some(user) = self.current_user.take() {
            tracing::info!(user_id = user.id, "Logged out");
        }
        self.tasks.clear();
        self.comments.clear();
        Ok(())
    }

    /// Reload everything from the store
    pub fn refresh(&mut self) -> Result<(), BoardError> {
        self.users = self.store.list_users()?;
        if self.current_user.is_some() {
            self.load_user_data()?;
        }
        Ok(())
    }

    /// Returns `Ok(None)` without touching the store when nobody is logged in
    /// or the text is blank.
    pub fn add_task(&mut self, text: &str) -> Result<Option<Task>, BoardError> {
        let Some(user) = self.current_user.as_ref() else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let task = self.store.insert_task(NewTask {
            user_id: user.id,
            text: text.to_string(),
            completed: false,
        })?;
        tracing::debug!(task_id = task.id, "Added task");
        self.tasks.push(task.clone());
        Ok(Some(task))
    }

    pub fn toggle_task(&mut self, id: i64) -> Result<Task, BoardError> {
        let completed = self
            .task(id)
            .map(|t| t.completed)
            .ok_or(StoreError::NotFound { entity: "Task", id })?;
        self.write_completed(id, !completed)
    }

    /// Move a task to the column for `target_completed`. Dropping a task on
    /// the column it is already in does nothing and returns `Ok(false)`.
    pub fn drop_task(&mut self, id: i64, target_completed: bool) -> Result<bool, BoardError> {
        let completed = self
            .task(id)
            .map(|t| t.completed)
            .ok_or(StoreError::NotFound { entity: "Task", id })?;
        if completed == target_completed {
            return Ok(false);
        }
        self.write_completed(id, target_completed)?;
        Ok(true)
    }

    fn write_completed(&mut self, id: i64, completed: bool) -> Result<Task, BoardError> {
        let updated = self.store.set_task_completed(id, completed)?;
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            *task = updated.clone();
        }
        tracing::debug!(task_id = id, completed, "Updated task");
        Ok(updated)
    }

    /// Delete a task and drop its comments from the view. Relational stores
    /// cascade on their own; the view is pruned either way.
    pub fn delete_task(&mut self, id: i64) -> Result<(), BoardError> {
        self.store.delete_task(id)?;
        self.tasks.retain(|t| t.id != id);
        self.comments.retain(|c| c.task_id != id);
        tracing::debug!(task_id = id, "Deleted task");
        Ok(())
    }

    /// Same no-op rules as [`Board::add_task`].
    pub fn add_comment(&mut self, task_id: i64, text: &str) -> Result<Option<Comment>, BoardError> {
        let Some(user) = self.current_user.as_ref() else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let comment = self.store.insert_comment(NewComment {
            task_id,
            user_id: user.id,
            user_name: user.name.clone(),
            content: text.to_string(),
        })?;
        tracing::debug!(comment_id = comment.id, task_id, "Added comment");
        self.comments.push(comment.clone());
        Ok(Some(comment))
    }

    fn set_current_user(&mut self, user: User) -> Result<(), BoardError> {
        self.store.save_session(Some(user.id))?;
        self.current_user = Some(user);
        self.load_user_data()
    }

    fn load_user_data(&mut self) -> Result<(), BoardError> {
        let Some(user) = self.current_user.as_ref() else {
            return Err(BoardError::NotLoggedIn);
        };
        let tasks = self.store.list_tasks(user.id)?;
        let task_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let comments = self.store.list_comments(&task_ids)?;
        self.tasks = tasks;
        self.comments = comments;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;
    use crate::store::{LocalStore, MemoryStore, SqliteStore};

    fn board_with_user() -> Board {
        let mut board = Board::new(Box::new(MemoryStore::new()));
        board.start().unwrap();
        board.register("Ann", "ann@example.com").unwrap();
        board
    }

    #[test]
    fn test_starts_on_login_screen() {
        let mut board = Board::new(Box::new(MemoryStore::new()));
        assert_eq!(board.screen(), Screen::Loading);
        board.start().unwrap();
        assert_eq!(board.screen(), Screen::Login);
    }

    #[test]
    fn test_register_requires_name_and_email() {
        let mut board = Board::new(Box::new(MemoryStore::new()));
        board.start().unwrap();
        assert!(matches!(board.register("  ", "a@b.c"), Err(BoardError::Validation(_))));
        assert!(matches!(board.register("Ann", ""), Err(BoardError::Validation(_))));
        assert!(board.users().is_empty());
        assert!(board.current_user().is_none());
    }

    #[test]
    fn test_register_logs_in() {
        let board = board_with_user();
        assert_eq!(board.screen(), Screen::Board);
        assert_eq!(board.current_user().map(|u| u.name.as_str()), Some("Ann"));
        assert_eq!(board.users().len(), 1);
    }

    #[test]
    fn test_login_without_selection_fails() {
        let mut board = board_with_user();
        board.logout().unwrap();
        assert!(matches!(board.login(None), Err(BoardError::NoUserSelected)));
        assert!(matches!(board.login(Some(99)), Err(BoardError::UnknownUser(99))));
        assert_eq!(board.screen(), Screen::Login);
    }

    #[test]
    fn test_blank_task_is_ignored() {
        let mut board = board_with_user();
        assert!(board.add_task("   ").unwrap().is_none());
        assert!(board.add_task("").unwrap().is_none());
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn test_add_task_while_logged_out_is_ignored() {
        let mut board = board_with_user();
        board.logout().unwrap();
        assert!(board.add_task("x").unwrap().is_none());
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn test_add_task_owned_by_current_user() {
        let mut board = board_with_user();
        let owner = board.current_user().unwrap().id;
        let task = board.add_task("  x  ").unwrap().unwrap();
        assert_eq!(task.text, "x");
        assert!(!task.completed);
        assert_eq!(task.user_id, owner);
        assert_eq!(board.tasks_in(Column::Todo).len(), 1);
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut board = board_with_user();
        let task = board.add_task("flip").unwrap().unwrap();
        assert!(board.toggle_task(task.id).unwrap().completed);
        assert!(!board.toggle_task(task.id).unwrap().completed);
        assert!(!board.task(task.id).unwrap().completed);
    }

    #[test]
    fn test_drop_on_same_column_is_noop() {
        let mut board = board_with_user();
        let task = board.add_task("move me").unwrap().unwrap();
        assert!(!board.drop_task(task.id, false).unwrap());
        assert!(board.drop_task(task.id, true).unwrap());
        assert!(!board.drop_task(task.id, true).unwrap());
        assert_eq!(board.tasks_in(Column::Done).len(), 1);
    }

    #[test]
    fn test_delete_task_leaves_no_orphan_comments() {
        let mut board = board_with_user();
        let keep = board.add_task("keep").unwrap().unwrap();
        let gone = board.add_task("gone").unwrap().unwrap();
        board.add_comment(keep.id, "stays").unwrap();
        board.add_comment(gone.id, "goes").unwrap();
        board.add_comment(gone.id, "goes too").unwrap();

        board.delete_task(gone.id).unwrap();

        assert!(board.task(gone.id).is_none());
        assert!(board.comments().iter().all(|c| c.task_id != gone.id));
        assert_eq!(board.comments_for(keep.id).len(), 1);
    }

    #[test]
    fn test_comment_attributed_to_current_user() {
        let mut board = board_with_user();
        let task = board.add_task("discuss").unwrap().unwrap();
        let comment = board.add_comment(task.id, "looks good").unwrap().unwrap();
        assert_eq!(comment.user_name, "Ann");
        assert_eq!(comment.user_id, board.current_user().unwrap().id);
        assert!(board.add_comment(task.id, "  ").unwrap().is_none());
        assert_eq!(board.comments_for(task.id).len(), 1);
    }

    #[test]
    fn test_duplicate_email_keeps_first_user() {
        let mut board = Board::new(Box::new(SqliteStore::in_memory().unwrap()));
        board.start().unwrap();
        let first = board.register("Ann", "ann@example.com").unwrap();
        board.logout().unwrap();

        let err = board.register("Other", "ann@example.com").unwrap_err();
        assert!(matches!(err, BoardError::DuplicateEmail));
        assert_eq!(board.users(), &[first]);
        assert!(board.current_user().is_none());
    }

    #[test]
    fn test_toggle_unknown_task() {
        let mut board = board_with_user();
        assert!(matches!(
            board.toggle_task(1234),
            Err(BoardError::Store(StoreError::NotFound { id: 1234, .. }))
        ));
    }

    #[test]
    fn test_failed_start_leaves_loading_screen() {
        let (store, offline) = FlakyStore::new();
        offline.set(true);
        let mut board = Board::new(Box::new(store));

        assert!(matches!(board.start(), Err(BoardError::Store(_))));
        assert_eq!(board.screen(), Screen::Login);
        assert!(board.users().is_empty());
    }

    #[test]
    fn test_stale_session_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(
            &path,
            r#"{"users": [{"id": 1, "name": "Ann", "email": "ann@example.com"}], "currentUserId": 9, "tasks": [], "comments": []}"#,
        )
        .unwrap();

        let mut board = Board::new(Box::new(LocalStore::open(&path).unwrap()));
        board.start().unwrap();
        assert_eq!(board.screen(), Screen::Login);
        assert!(board.current_user().is_none());
        assert_eq!(board.users().len(), 1);

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.load_session().unwrap(), None);
    }

    #[test]
    fn test_failed_writes_change_nothing() {
        let (store, offline) = FlakyStore::new();
        let mut board = Board::new(Box::new(store));
        board.start().unwrap();
        board.register("Ann", "ann@example.com").unwrap();
        let task = board.add_task("keep").unwrap().unwrap();
        board.add_comment(task.id, "note").unwrap();

        offline.set(true);
        assert!(board.add_task("lost").is_err());
        assert!(board.toggle_task(task.id).is_err());
        assert!(board.drop_task(task.id, true).is_err());
        assert!(board.add_comment(task.id, "lost").is_err());
        assert!(board.delete_task(task.id).is_err());
        assert!(board.register("Bob", "bob@example.com").is_err());

        assert_eq!(board.tasks().len(), 1);
        assert!(!board.task(task.id).unwrap().completed);
        assert_eq!(board.comments_for(task.id).len(), 1);
        assert_eq!(board.users().len(), 1);
        assert_eq!(board.current_user().map(|u| u.name.as_str()), Some("Ann"));

        offline.set(false);
        board.refresh().unwrap();
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.comments().len(), 1);
    }
}
