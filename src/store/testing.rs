use std::cell::Cell;
use std::rc::Rc;

use crate::config::Backend;
use crate::models::{Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::{MemoryStore, Store, StoreError};

/// Memory store that fails every call while its switch is on
pub struct FlakyStore {
    inner: MemoryStore,
    offline: Rc<Cell<bool>>,
}

impl FlakyStore {
    /// The store plus the switch that takes it offline
    pub fn new() -> (Self, Rc<Cell<bool>>) {
        let offline = Rc::new(Cell::new(false));
        let store = Self {
            inner: MemoryStore::new(),
            offline: Rc::clone(&offline),
        };
        (store, offline)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.get() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "service unreachable",
            )));
        }
        Ok(())
    }
}

impl Store for FlakyStore {
    fn backend(&self) -> Backend {
        Backend::Hosted
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        self.inner.list_users()
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.check()?;
        self.inner.get_user(id)
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        self.inner.insert_user(user)
    }

    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        self.check()?;
        self.inner.list_tasks(user_id)
    }

    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        self.check()?;
        self.inner.insert_task(task)
    }

    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        self.check()?;
        self.inner.set_task_completed(id, completed)
    }

    fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_task(id)
    }

    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError> {
        self.check()?;
        self.inner.list_comments(task_ids)
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError> {
        self.check()?;
        self.inner.insert_comment(comment)
    }

    fn load_session(&self) -> Result<Option<i64>, StoreError> {
        self.check()?;
        self.inner.load_session()
    }

    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError> {
        self.check()?;
        self.inner.save_session(user_id)
    }
}
