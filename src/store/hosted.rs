use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Backend, HostedConfig};
use crate::models::{Comment, NewComment, NewTask, NewUser, Task, User};
use crate::store::{Store, StoreError, UNIQUE_VIOLATION};

/// Client for the hosted relational data service, spoken through its
/// PostgREST endpoint at `<url>/rest/v1/<table>`.
///
/// The service owns the three tables; this side only issues one request per
/// operation. The current-user pointer never leaves the machine and lives in
/// a small session file.
pub struct HostedStore {
    client: Client,
    base_url: String,
    api_key: String,
    session: SessionFile,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl HostedStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        session_path: PathBuf,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: SessionFile::new(session_path),
        })
    }

    pub fn from_config(config: &HostedConfig, session_path: PathBuf) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StoreError::Config("hosted.url is not set (TASKBOARD_HOSTED_URL)".to_string()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| StoreError::Config("hosted.api_key is not set (TASKBOARD_HOSTED_KEY)".to_string()))?;
        Self::new(url, api_key, Duration::from_secs(config.timeout_secs), session_path)
    }

    fn table_url(&self, table: &str) -> String {
        table_url(&self.base_url, table)
    }

    fn request(&self, method: Method, table: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(query)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        let res = request.send()?;
        let res = check_status(res)?;
        Ok(res.json::<T>()?)
    }

    fn send_empty(&self, request: RequestBuilder) -> Result<(), StoreError> {
        let res = request.send()?;
        check_status(res)?;
        Ok(())
    }

    /// Insert one row and return the stored representation
    fn insert<B: Serialize, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T, StoreError> {
        tracing::debug!(table, "Hosted insert");
        let request = self
            .request(Method::POST, table, &[])
            .header("Prefer", "return=representation")
            .json(body);
        let mut rows: Vec<T> = self.send(request)?;
        if rows.is_empty() {
            return Err(StoreError::Api {
                status: 200,
                code: String::new(),
                message: format!("insert into {} returned no rows", table),
            });
        }
        Ok(rows.remove(0))
    }
}

fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

fn check_status(res: Response) -> Result<Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text()?;
    let err = classify_error(status.as_u16(), &body);
    tracing::warn!(status = status.as_u16(), error = %err, "Hosted request failed");
    Err(err)
}

/// Turn a non-success response into a [`StoreError`]
fn classify_error(status: u16, body: &str) -> StoreError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => {
            let code = parsed.code.unwrap_or_default();
            if code == UNIQUE_VIOLATION {
                return StoreError::DuplicateEmail;
            }
            let mut message = parsed.message.unwrap_or_else(|| body.to_string());
            if let Some(details) = parsed.details {
                message = format!("{} ({})", message, details);
            }
            StoreError::Api { status, code, message }
        }
        Err(_) => StoreError::Api {
            status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}

fn eq(value: i64) -> String {
    format!("eq.{}", value)
}

/// PostgREST `in` filter: `in.(1,2,3)`
fn in_list(values: &[i64]) -> String {
    let joined = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({})", joined)
}

/// Comments first, so the task delete never trips the foreign key on a
/// schema without a cascade
fn delete_task_requests(id: i64) -> [(&'static str, (&'static str, String)); 2] {
    [("comments", ("task_id", eq(id))), ("tasks", ("id", eq(id)))]
}

fn select_all() -> (&'static str, String) {
    ("select", "*".to_string())
}

fn order_by_id() -> (&'static str, String) {
    ("order", "id.asc".to_string())
}

impl Store for HostedStore {
    fn backend(&self) -> Backend {
        Backend::Hosted
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.send(self.request(Method::GET, "users", &[select_all(), order_by_id()]))
    }

    fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let mut users: Vec<User> = self.send(self.request(
            Method::GET,
            "users",
            &[select_all(), ("id", eq(id))],
        ))?;
        Ok(if users.is_empty() { None } else { Some(users.remove(0)) })
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        self.insert("users", &user)
    }

    fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        self.send(self.request(
            Method::GET,
            "tasks",
            &[select_all(), ("user_id", eq(user_id)), order_by_id()],
        ))
    }

    fn insert_task(&mut self, task: NewTask) -> Result<Task, StoreError> {
        self.insert("tasks", &task)
    }

    fn set_task_completed(&mut self, id: i64, completed: bool) -> Result<Task, StoreError> {
        let request = self
            .request(Method::PATCH, "tasks", &[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "completed": completed }));
        let mut rows: Vec<Task> = self.send(request)?;
        if rows.is_empty() {
            return Err(StoreError::NotFound { entity: "Task", id });
        }
        Ok(rows.remove(0))
    }

    fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        tracing::debug!(task_id = id, "Hosted delete");
        for (table, filter) in delete_task_requests(id) {
            self.send_empty(self.request(Method::DELETE, table, &[filter]))?;
        }
        Ok(())
    }

    fn list_comments(&self, task_ids: &[i64]) -> Result<Vec<Comment>, StoreError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.send(self.request(
            Method::GET,
            "comments",
            &[select_all(), ("task_id", in_list(task_ids)), order_by_id()],
        ))
    }

    fn insert_comment(&mut self, comment: NewComment) -> Result<Comment, StoreError> {
        self.insert("comments", &comment)
    }

    fn load_session(&self) -> Result<Option<i64>, StoreError> {
        self.session.load()
    }

    fn save_session(&mut self, user_id: Option<i64>) -> Result<(), StoreError> {
        self.session.save(user_id)
    }
}

/// `{"currentUserId": N}` on disk
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default, rename = "currentUserId")]
    current_user_id: Option<i64>,
}

#[derive(Debug)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<i64>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let doc: SessionDocument = serde_json::from_str(&contents)?;
        Ok(doc.current_user_id)
    }

    pub fn save(&self, user_id: Option<i64>) -> Result<(), StoreError> {
        if user_id.is_none() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let doc = SessionDocument { current_user_id: user_id };
        fs::write(&self.path, serde_json::to_string(&doc)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        assert_eq!(
            table_url("https://abc.supabase.co/", "tasks"),
            "https://abc.supabase.co/rest/v1/tasks"
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(eq(5), "eq.5");
        assert_eq!(in_list(&[1, 2, 3]), "in.(1,2,3)");
    }

    #[test]
    fn test_delete_task_removes_comments_before_the_task() {
        let requests = delete_task_requests(4);
        assert_eq!(requests[0], ("comments", ("task_id", "eq.4".to_string())));
        assert_eq!(requests[1], ("tasks", ("id", "eq.4".to_string())));
    }

    #[test]
    fn test_unique_violation_maps_to_duplicate_email() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.c) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"users_email_key\""}"#;
        assert!(matches!(classify_error(409, body), StoreError::DuplicateEmail));
    }

    #[test]
    fn test_other_api_errors_keep_code_and_message() {
        let body = r#"{"code":"42501","details":null,"hint":null,"message":"permission denied for table tasks"}"#;
        match classify_error(401, body) {
            StoreError::Api { status, code, message } => {
                assert_eq!(status, 401);
                assert_eq!(code, "42501");
                assert_eq!(message, "permission denied for table tasks");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_json_error_body() {
        match classify_error(502, "Bad Gateway") {
            StoreError::Api { status, message, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");

        let missing_url = HostedConfig { url: None, api_key: Some("k".into()), timeout_secs: 5 };
        assert!(matches!(
            HostedStore::from_config(&missing_url, session.clone()),
            Err(StoreError::Config(_))
        ));

        let missing_key = HostedConfig { url: Some("https://x".into()), api_key: Some("  ".into()), timeout_secs: 5 };
        assert!(matches!(
            HostedStore::from_config(&missing_key, session),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_session_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(session.load().unwrap(), None);
        session.save(Some(3)).unwrap();
        assert_eq!(session.load().unwrap(), Some(3));
        session.save(None).unwrap();
        assert_eq!(session.load().unwrap(), None);
    }
}
