use taskboard::store::{self, LocalStore, MemoryStore, SqliteStore};
use taskboard::{Backend, Board, BoardError, Column, Config, Screen, Store};
use tempfile::TempDir;

fn started(store: Box<dyn Store>) -> Board {
    let mut board = Board::new(store);
    board.start().unwrap();
    board
}

/// Register, fill both columns, comment, log out and back in.
fn exercise(mut board: Board) {
    assert_eq!(board.screen(), Screen::Login);

    let ann = board.register("Ann", "ann@example.com").unwrap();
    assert_eq!(board.screen(), Screen::Board);

    let first = board.add_task("write report").unwrap().unwrap();
    let second = board.add_task("review notes").unwrap().unwrap();
    assert!(second.id > first.id);

    assert!(board.drop_task(first.id, true).unwrap());
    assert!(!board.drop_task(first.id, true).unwrap());
    board.add_comment(first.id, "nearly there").unwrap();
    board.add_comment(second.id, "start tomorrow").unwrap();

    let todo: Vec<i64> = board.tasks_in(Column::Todo).iter().map(|t| t.id).collect();
    let done: Vec<i64> = board.tasks_in(Column::Done).iter().map(|t| t.id).collect();
    assert_eq!(todo, vec![second.id]);
    assert_eq!(done, vec![first.id]);

    board.logout().unwrap();
    assert_eq!(board.screen(), Screen::Login);
    assert!(board.tasks().is_empty());
    assert!(board.comments().is_empty());

    board.login(Some(ann.id)).unwrap();
    assert_eq!(board.tasks().len(), 2);
    assert_eq!(board.comments_for(first.id).len(), 1);
    assert_eq!(board.comments_for(first.id)[0].user_name, "Ann");
    assert!(board.task(first.id).unwrap().completed);

    board.delete_task(first.id).unwrap();
    assert!(board.task(first.id).is_none());
    assert!(board.comments_for(first.id).is_empty());
    assert_eq!(board.comments().len(), 1);
}

#[test]
fn memory_backend_full_flow() {
    exercise(started(Box::new(MemoryStore::new())));
}

#[test]
fn local_backend_full_flow() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::open(dir.path().join("board.json")).unwrap();
    exercise(started(Box::new(store)));
}

#[test]
fn sqlite_backend_full_flow() {
    exercise(started(Box::new(SqliteStore::in_memory().unwrap())));
}

#[test]
fn users_only_see_their_own_tasks() {
    let mut board = started(Box::new(SqliteStore::in_memory().unwrap()));
    let ann = board.register("Ann", "ann@example.com").unwrap();
    board.add_task("ann's task").unwrap();

    let bob = board.register("Bob", "bob@example.com").unwrap();
    assert!(board.tasks().is_empty());
    board.add_task("bob's task").unwrap();

    board.login(Some(ann.id)).unwrap();
    assert_eq!(board.tasks().len(), 1);
    assert!(board.tasks().iter().all(|t| t.user_id == ann.id));

    board.login(Some(bob.id)).unwrap();
    assert!(board.tasks().iter().all(|t| t.user_id == bob.id));
}

#[test]
fn local_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.json");

    let task_id = {
        let mut board = started(Box::new(LocalStore::open(&path).unwrap()));
        board.register("Ann", "ann@example.com").unwrap();
        let task = board.add_task("persist me").unwrap().unwrap();
        board.add_comment(task.id, "still here").unwrap();
        task.id
    };

    let board = started(Box::new(LocalStore::open(&path).unwrap()));
    assert_eq!(board.screen(), Screen::Board);
    assert_eq!(board.current_user().map(|u| u.name.as_str()), Some("Ann"));
    assert_eq!(board.task(task_id).map(|t| t.text.as_str()), Some("persist me"));
    assert_eq!(board.comments_for(task_id).len(), 1);
}

#[test]
fn sqlite_logout_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.db");
    let path = path.to_str().unwrap();

    {
        let mut board = started(Box::new(SqliteStore::new(path).unwrap()));
        board.register("Ann", "ann@example.com").unwrap();
        board.logout().unwrap();
    }

    let board = started(Box::new(SqliteStore::new(path).unwrap()));
    assert_eq!(board.screen(), Screen::Login);
    assert_eq!(board.users().len(), 1);
}

#[test]
fn sqlite_rejects_duplicate_email() {
    let mut board = started(Box::new(SqliteStore::in_memory().unwrap()));
    board.register("Ann", "ann@example.com").unwrap();
    let err = board.register("Another Ann", "ann@example.com").unwrap_err();
    assert!(matches!(err, BoardError::DuplicateEmail));
    assert_eq!(board.users().len(), 1);
}

#[test]
fn open_uses_configured_paths() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.backend = Backend::Local;
    config.local_path = dir.path().join("nested").join("board.json").to_string_lossy().into_owned();

    let mut board = started(store::open(&config).unwrap());
    assert_eq!(board.backend_name(), "local");
    board.register("Ann", "ann@example.com").unwrap();
    assert!(dir.path().join("nested").join("board.json").exists());

    config.backend = Backend::Sqlite;
    config.database_path = dir.path().join("board.db").to_string_lossy().into_owned();
    let board = started(store::open(&config).unwrap());
    assert_eq!(board.backend_name(), "sqlite");
    assert!(dir.path().join("board.db").exists());
}

#[test]
fn hosted_backend_without_credentials_fails_to_open() {
    let mut config = Config::default();
    config.backend = Backend::Hosted;
    config.hosted.url = None;
    config.hosted.api_key = None;
    assert!(store::open(&config).is_err());
}
