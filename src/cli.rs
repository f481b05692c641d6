use clap::{ArgGroup, Parser, Subcommand};
use std::io::Write;
use thiserror::Error;

use crate::board::{Board, BoardError};
use crate::config::Backend;
use crate::models::{Column, Task};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "A terminal kanban board with users, tasks and comments")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/storage)
    #[arg(long)]
    pub dev: bool,

    /// Override the storage backend from the config file
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Register a new user and log in as them
    Register {
        name: String,
        email: String,
    },
    /// List registered users
    Users,
    /// Log in as an existing user
    Login {
        user_id: i64,
    },
    /// Clear the current user
    Logout,
    /// Show the current user
    Whoami,
    /// Add a task for the current user
    Add {
        text: String,
    },
    /// Show both columns for the current user
    List,
    /// Flip a task between the two columns
    Toggle {
        task_id: i64,
    },
    /// Move a task to a specific column
    #[command(group(ArgGroup::new("column").required(true).args(["done", "todo"])))]
    Move {
        task_id: i64,
        #[arg(long)]
        done: bool,
        #[arg(long)]
        todo: bool,
    },
    /// Delete a task and its comments
    Delete {
        task_id: i64,
    },
    /// Comment on a task
    Comment {
        task_id: i64,
        text: String,
    },
    /// Show the comments on a task
    Comments {
        task_id: i64,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task {0} is not on your board")]
    UnknownTask(i64),
}

/// Run one non-interactive command against an already started board
pub fn run_command(command: Commands, board: &mut Board, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Commands::Tui => Ok(()),
        Commands::Register { name, email } => handle_register(&name, &email, board, out),
        Commands::Users => handle_users(board, out),
        Commands::Login { user_id } => handle_login(user_id, board, out),
        Commands::Logout => {
            board.logout()?;
            writeln!(out, "Logged out")?;
            Ok(())
        }
        Commands::Whoami => handle_whoami(board, out),
        Commands::Add { text } => handle_add(&text, board, out),
        Commands::List => handle_list(board, out),
        Commands::Toggle { task_id } => {
            require_task(board, task_id)?;
            let task = board.toggle_task(task_id)?;
            writeln!(out, "Task {} moved to {}", task.id, Column::of(&task).title())?;
            Ok(())
        }
        Commands::Move { task_id, done, todo: _ } => {
            require_task(board, task_id)?;
            let target = if done { Column::Done } else { Column::Todo };
            if board.drop_task(task_id, target.is_completed())? {
                writeln!(out, "Task {} moved to {}", task_id, target.title())?;
            } else {
                writeln!(out, "Task {} is already in {}", task_id, target.title())?;
            }
            Ok(())
        }
        Commands::Delete { task_id } => {
            require_task(board, task_id)?;
            board.delete_task(task_id)?;
            writeln!(out, "Task {} deleted", task_id)?;
            Ok(())
        }
        Commands::Comment { task_id, text } => handle_comment(task_id, &text, board, out),
        Commands::Comments { task_id } => handle_comments(task_id, board, out),
    }
}

fn require_login(board: &Board) -> Result<(), CliError> {
    if board.current_user().is_none() {
        return Err(BoardError::NotLoggedIn.into());
    }
    Ok(())
}

fn require_task(board: &Board, task_id: i64) -> Result<(), CliError> {
    require_login(board)?;
    if board.task(task_id).is_none() {
        return Err(CliError::UnknownTask(task_id));
    }
    Ok(())
}

fn handle_register(name: &str, email: &str, board: &mut Board, out: &mut dyn Write) -> Result<(), CliError> {
    let user = board.register(name, email)?;
    writeln!(out, "Registered {} <{}> (ID: {})", user.name, user.email, user.id)?;
    Ok(())
}

fn handle_users(board: &Board, out: &mut dyn Write) -> Result<(), CliError> {
    if board.users().is_empty() {
        writeln!(out, "No users yet. Register with `taskboard register <name> <email>`")?;
        return Ok(());
    }
    let current = board.current_user().map(|u| u.id);
    for user in board.users() {
        let marker = if Some(user.id) == current { "*" } else { " " };
        writeln!(out, "{} {:>4}  {} <{}>", marker, user.id, user.name, user.email)?;
    }
    Ok(())
}

fn handle_login(user_id: i64, board: &mut Board, out: &mut dyn Write) -> Result<(), CliError> {
    let user = board.login(Some(user_id))?;
    writeln!(out, "Logged in as {}", user.name)?;
    Ok(())
}

fn handle_whoami(board: &Board, out: &mut dyn Write) -> Result<(), CliError> {
    match board.current_user() {
        Some(user) => writeln!(out, "{} <{}> (ID: {})", user.name, user.email, user.id)?,
        None => writeln!(out, "Not logged in")?,
    }
    Ok(())
}

fn handle_add(text: &str, board: &mut Board, out: &mut dyn Write) -> Result<(), CliError> {
    require_login(board)?;
    match board.add_task(text)? {
        Some(task) => writeln!(out, "Task created successfully (ID: {})", task.id)?,
        None => writeln!(out, "Nothing to add")?,
    }
    Ok(())
}

fn write_column(out: &mut dyn Write, column: Column, tasks: &[&Task], board: &Board) -> std::io::Result<()> {
    writeln!(out, "{} ({})", column.title(), tasks.len())?;
    for task in tasks {
        let marker = if task.completed { "✓" } else { "○" };
        let comments = board.comments_for(task.id).len();
        if comments > 0 {
            writeln!(out, "  {} {:>4}  {}  [{} comments]", marker, task.id, task.text, comments)?;
        } else {
            writeln!(out, "  {} {:>4}  {}", marker, task.id, task.text)?;
        }
    }
    Ok(())
}

fn handle_list(board: &Board, out: &mut dyn Write) -> Result<(), CliError> {
    require_login(board)?;
    for column in [Column::Todo, Column::Done] {
        write_column(out, column, &board.tasks_in(column), board)?;
    }
    Ok(())
}

fn handle_comment(task_id: i64, text: &str, board: &mut Board, out: &mut dyn Write) -> Result<(), CliError> {
    require_task(board, task_id)?;
    match board.add_comment(task_id, text)? {
        Some(comment) => writeln!(out, "Comment added (ID: {})", comment.id)?,
        None => writeln!(out, "Nothing to add")?,
    }
    Ok(())
}

fn handle_comments(task_id: i64, board: &Board, out: &mut dyn Write) -> Result<(), CliError> {
    require_task(board, task_id)?;
    let comments = board.comments_for(task_id);
    if comments.is_empty() {
        writeln!(out, "No comments on task {}", task_id)?;
    }
    for comment in comments {
        let when = comment.created_at.as_deref().unwrap_or("");
        writeln!(out, "{} {}: {}", when, comment.user_name, comment.content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn started_board() -> Board {
        let mut board = Board::new(Box::new(MemoryStore::new()));
        board.start().unwrap();
        board
    }

    fn run(board: &mut Board, command: Commands) -> Result<String, CliError> {
        let mut out = Vec::new();
        run_command(command, board, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_register_then_list() {
        let mut board = started_board();
        let output = run(&mut board, Commands::Register { name: "Ann".into(), email: "ann@example.com".into() }).unwrap();
        assert!(output.contains("Registered Ann"));

        run(&mut board, Commands::Add { text: "write docs".into() }).unwrap();
        let output = run(&mut board, Commands::List).unwrap();
        assert!(output.contains("To Do (1)"));
        assert!(output.contains("write docs"));
        assert!(output.contains("Done (0)"));
    }

    #[test]
    fn test_add_requires_login() {
        let mut board = started_board();
        let err = run(&mut board, Commands::Add { text: "x".into() }).unwrap_err();
        assert!(matches!(err, CliError::Board(BoardError::NotLoggedIn)));
    }

    #[test]
    fn test_move_reports_noop() {
        let mut board = started_board();
        board.register("Ann", "ann@example.com").unwrap();
        let task = board.add_task("ship").unwrap().unwrap();

        let output = run(&mut board, Commands::Move { task_id: task.id, done: false, todo: true }).unwrap();
        assert!(output.contains("already in To Do"));

        let output = run(&mut board, Commands::Move { task_id: task.id, done: true, todo: false }).unwrap();
        assert!(output.contains("moved to Done"));
    }

    #[test]
    fn test_unknown_task() {
        let mut board = started_board();
        board.register("Ann", "ann@example.com").unwrap();
        let err = run(&mut board, Commands::Delete { task_id: 7 }).unwrap_err();
        assert!(matches!(err, CliError::UnknownTask(7)));
    }

    #[test]
    fn test_cli_parses_move_flags() {
        let cli = Cli::try_parse_from(["taskboard", "--backend", "sqlite", "move", "3", "--done"]).unwrap();
        assert_eq!(cli.backend, Some(Backend::Sqlite));
        match cli.command {
            Some(Commands::Move { task_id, done, todo }) => {
                assert_eq!(task_id, 3);
                assert!(done);
                assert!(!todo);
            }
            _ => panic!("expected move command"),
        }
        assert!(Cli::try_parse_from(["taskboard", "move", "3"]).is_err());
        assert!(Cli::try_parse_from(["taskboard", "move", "3", "--done", "--todo"]).is_err());
    }
}
