use serde::{Deserialize, Serialize};

use crate::config::Backend;
use crate::models::{Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::{Store, StoreError};

/// The four slices of board state kept by the local backends.
///
/// Field names match the keys the browser-storage variant wrote, so an
/// exported document loads unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default, rename = "currentUserId")]
    pub current_user_id: Option<i64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl BoardData {
    // Ids are one past the largest id in use, so two inserts in the same
    // instant never collide.
    fn next_user_id(&self) -> i64 {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    fn next_task_id(&self) -> i64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn next_comment_id(&self) -> i64 {
        self.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    pub fn list_users(&self) -> Vec<User> {
        let mut users = self.users.clone();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn get_user(&self, id: i64) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    pub fn insert_user(&mut self, user: NewUser) -> User {
        let user = User::from_new(self.next_user_id(), user);
        self.users.push(user.clone());
        user
    }

    pub fn list_tasks(&self, user_id: i64) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    pub fn insert_task(&mut self, task: NewTask) -> Task {
        let task = Task::from_new(self.next_task_id(), task);
        self.tasks.push(task.clone());
        task
    }

    pub fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { entity: "Task", id })?;
        task.completed = completed;
        Ok(task.clone())
    }

    /// Removes the task and its comments. Nothing cascades here, so the
    /// comments go explicitly.
    pub fn delete_task(&mut self, id: i64) {
        self.tasks.retain(|t| t.id != id);
        self.comments.retain(|c| c.task_id != id);
    }

    pub fn list_comments(&self, task_ids: &[i64]) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| task_ids.contains(&c.task_id))
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.id);
        comments
    }

    pub fn insert_comment(&mut self, comment: NewComment) -> Comment {
        let comment = Comment::from_new(self.next_comment_id(), comment);
        self.comments.push(comment.clone());
        comment
    }
}

/// Board state held only in process memory; everything is gone on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: BoardData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: BoardData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &BoardData {
        &self.data
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.data.list_users())
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.data.get_user(id))
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        Ok(self.data.insert_user(user))
    }

    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        Ok(self.data.list_tasks(user_id))
    }

    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        Ok(self.data.insert_task(task))
    }

    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        self.data.set_task_completed(id, completed)
    }

    fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        self.data.delete_task(id);
        Ok(())
    }

    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError> {
        Ok(self.data.list_comments(task_ids))
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError> {
        Ok(self.data.insert_comment(comment))
    }

    fn load_session(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.data.current_user_id)
    }

    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError> {
        self.data.current_user_id = user_id;
        Ok(())
    }
}
