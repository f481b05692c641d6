use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Backend;
use crate::models::{Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::memory::BoardData;
use crate::store::{Store, StoreError};

/// Board state persisted as one JSON document with the four keys
/// `users`, `currentUserId`, `tasks` and `comments`.
///
/// The whole document is rewritten after every mutation.
pub struct LocalStore {
    path: PathBuf,
    data: BoardData,
}

impl LocalStore {
    /// Open the document at `path`, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BoardData::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BoardData::default()
        };

        tracing::debug!(
            path = %path.display(),
            users = data.users.len(),
            tasks = data.tasks.len(),
            comments = data.comments.len(),
            "Loaded local board document"
        );

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the document and keep the copy only once
    /// it is on disk. A failed write leaves both the file and `self` as they were.
    fn commit<T>(&mut self, change: impl FnOnce(&mut BoardData) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut next = self.data.clone();
        let out = change(&mut next)?;
        write_document(&self.path, &next)?;
        self.data = next;
        Ok(out)
    }
}

/// Write the document to a sibling temp file, then rename over the original
fn write_document(path: &Path, data: &BoardData) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl Store for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.data.list_users())
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.data.get_user(id))
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.commit(|data| Ok(data.insert_user(user)))
    }

    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        Ok(self.data.list_tasks(user_id))
    }

    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        self.commit(|data| Ok(data.insert_task(task)))
    }

    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        self.commit(|data| data.set_task_completed(id, completed))
    }

    fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        self.commit(|data| {
            data.delete_task(id);
            Ok(())
        })
    }

    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError> {
        Ok(self.data.list_comments(task_ids))
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError> {
        self.commit(|data| Ok(data.insert_comment(comment)))
    }

    fn load_session(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.data.current_user_id)
    }

    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError> {
        self.commit(|data| {
            data.current_user_id = user_id;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");

        let (user_id, task_id) = {
            let mut store = LocalStore::open(&path).unwrap();
            let user = store
                .insert_user(NewUser { name: "Ann".into(), email: "ann@example.com".into() })
                .unwrap();
            let task = store
                .insert_task(NewTask { user_id: user.id, text: "write report".into(), completed: false })
                .unwrap();
            store.set_task_completed(task.id, true).unwrap();
            store.save_session(Some(user.id)).unwrap();
            (user.id, task.id)
        };

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(user_id));
        let tasks = store.list_tasks(user_id).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task_id);
        assert!(tasks[0].completed);
    }

    #[test]
    fn test_document_uses_browser_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let mut store = LocalStore::open(&path).unwrap();
        store.save_session(Some(7)).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        for key in ["users", "currentUserId", "tasks", "comments"] {
            assert!(raw.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(raw["currentUserId"], 7);
    }

    #[test]
    fn test_loads_camel_case_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        fs::write(
            &path,
            r#"{
                "users": [{"id": 1, "name": "Ann", "email": "ann@example.com"}],
                "currentUserId": 1,
                "tasks": [{"id": 10, "userId": 1, "text": "old task", "completed": false}],
                "comments": [{"id": 5, "taskId": 10, "userId": 1, "userName": "Ann", "content": "hi"}]
            }"#,
        )
        .unwrap();

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.list_tasks(1).unwrap()[0].text, "old task");
        assert_eq!(store.list_comments(&[10]).unwrap()[0].user_name, "Ann");
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.json");
        let mut store = LocalStore::open(&path).unwrap();
        store
            .insert_user(NewUser { name: "Bo".into(), email: "bo@example.com".into() })
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_write_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let mut store = LocalStore::open(&path).unwrap();
        let user = store
            .insert_user(NewUser { name: "Ann".into(), email: "ann@example.com".into() })
            .unwrap();

        // A directory where the temp file goes makes every write fail
        fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let result = store.insert_task(NewTask { user_id: user.id, text: "lost".into(), completed: false });
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.list_tasks(user.id).unwrap().is_empty());
        assert!(store.save_session(Some(user.id)).is_err());
        assert_eq!(store.load_session().unwrap(), None);

        let reopened = LocalStore::open(&path).unwrap();
        assert!(reopened.list_tasks(user.id).unwrap().is_empty());
        assert_eq!(reopened.list_users().unwrap().len(), 1);
    }
}
