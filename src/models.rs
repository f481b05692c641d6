use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(alias = "userId")]
    pub user_id: i64,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(alias = "taskId")]
    pub task_id: i64,
    #[serde(alias = "userId")]
    pub user_id: i64,
    #[serde(alias = "userName")]
    pub user_name: String,
    pub content: String,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Insert payload for a user; the store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub user_id: i64,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub task_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub content: String,
}

/// The two board columns. A task lives in exactly one, picked by `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Todo,
    Done,
}

impl Column {
    pub fn of(task: &Task) -> Self {
        if task.completed { Column::Done } else { Column::Todo }
    }

    pub fn is_completed(self) -> bool {
        self == Column::Done
    }

    pub fn other(self) -> Self {
        match self {
            Column::Todo => Column::Done,
            Column::Done => Column::Todo,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::Todo => "To Do",
            Column::Done => "Done",
        }
    }
}

impl User {
    pub fn from_new(id: i64, new: NewUser) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            created_at: Some(now_timestamp()),
        }
    }
}

impl Task {
    pub fn from_new(id: i64, new: NewTask) -> Self {
        Self {
            id,
            user_id: new.user_id,
            text: new.text,
            completed: new.completed,
            created_at: Some(now_timestamp()),
        }
    }
}

impl Comment {
    pub fn from_new(id: i64, new: NewComment) -> Self {
        Self {
            id,
            task_id: new.task_id,
            user_id: new.user_id,
            user_name: new.user_name,
            content: new.content,
            created_at: Some(now_timestamp()),
        }
    }
}

/// RFC 3339, the shape the hosted `timestamptz` columns return
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_of_task() {
        let mut task = Task::from_new(1, NewTask { user_id: 1, text: "a".into(), completed: false });
        assert_eq!(Column::of(&task), Column::Todo);
        task.completed = true;
        assert_eq!(Column::of(&task), Column::Done);
        assert_eq!(Column::Done.other(), Column::Todo);
    }

    #[test]
    fn test_comment_accepts_camel_case_fields() {
        let json = r#"{"id":3,"taskId":1,"userId":2,"userName":"Ann","content":"hi","timestamp":"2024-01-01"}"#;
        let comment: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.task_id, 1);
        assert_eq!(comment.user_name, "Ann");
        assert_eq!(comment.created_at.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_new_rows_carry_rfc3339_timestamps() {
        let task = Task::from_new(1, NewTask { user_id: 1, text: "a".into(), completed: false });
        let stamp = task.created_at.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok(), "{}", stamp);
    }
}
