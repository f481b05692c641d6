use ratatui::widgets::ListState;
use std::time::Instant;

use crate::board::{Board, BoardError, Screen};
use crate::models::{Column, Comment, Task};
use crate::tui::widgets::input::InputField;
use crate::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Picking an existing user
    Login,
    /// Filling in the registration form
    Register,
    Board,
    AddTask,
    Comment,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Name,
    Email,
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub list_state: ListState,
    pub name: InputField,
    pub email: InputField,
    pub field: RegisterField,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            list_state: ListState::default(),
            name: InputField::new(),
            email: InputField::new(),
            field: RegisterField::Name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardUiState {
    pub focus: Column,
    pub todo_state: ListState,
    pub done_state: ListState,
    /// Task picked up with the grab key and not yet dropped
    pub grabbed: Option<i64>,
}

impl Default for BoardUiState {
    fn default() -> Self {
        Self {
            focus: Column::Todo,
            todo_state: ListState::default(),
            done_state: ListState::default(),
            grabbed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    /// Blocking message; every key dismisses it first
    pub alert: Option<String>,
    /// Task id awaiting delete confirmation
    pub delete_confirmation: Option<i64>,
    pub delete_modal_selection: usize, // 0 = Delete, 1 = Cancel
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub board: Board,
    pub mode: Mode,
    pub login: LoginState,
    pub ui: BoardUiState,
    /// Shared buffer for the add-task and comment inputs
    pub input: InputField,
    pub modals: ModalState,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, board: Board) -> Self {
        Self {
            config,
            board,
            mode: Mode::Login,
            login: LoginState::default(),
            ui: BoardUiState::default(),
            input: InputField::new(),
            modals: ModalState::default(),
            status: StatusState::default(),
        }
    }

    /// Initial fetch, run after the loading screen has been drawn once
    pub fn start(&mut self) {
        if let Err(err) = self.board.start() {
            self.report(err);
        }
        self.sync_mode();
    }

    /// Match the mode to the board's screen after login/logout
    fn sync_mode(&mut self) {
        match self.board.screen() {
            Screen::Board => {
                if matches!(self.mode, Mode::Login | Mode::Register) {
                    self.mode = Mode::Board;
                }
                self.sync_list_states();
            }
            Screen::Login | Screen::Loading => {
                if !matches!(self.mode, Mode::Login | Mode::Register) {
                    self.mode = Mode::Login;
                }
                let selected = if self.board.users().is_empty() { None } else { Some(0) };
                if self.login.list_state.selected().is_none() {
                    self.login.list_state.select(selected);
                }
            }
        }
    }

    /// Surface a failed operation. Validation problems get their own message;
    /// anything else is logged and shown generically.
    pub fn report(&mut self, err: BoardError) {
        let message = match &err {
            BoardError::Validation(_)
            | BoardError::NoUserSelected
            | BoardError::UnknownUser(_)
            | BoardError::NotLoggedIn
            | BoardError::DuplicateEmail => err.to_string(),
            BoardError::Store(store_err) => {
                tracing::error!(error = %store_err, "Store operation failed");
                format!("Something went wrong: {}", store_err)
            }
        };
        self.modals.alert = Some(message);
    }

    pub fn dismiss_alert(&mut self) {
        self.modals.alert = None;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    // ----- login screen -----

    pub fn move_user_selection(&mut self, down: bool) {
        let len = self.board.users().len();
        if len == 0 {
            self.login.list_state.select(None);
            return;
        }
        let i = match self.login.list_state.selected() {
            Some(i) if down => if i + 1 >= len { 0 } else { i + 1 },
            Some(i) => if i == 0 { len - 1 } else { i - 1 },
            None => 0,
        };
        self.login.list_state.select(Some(i));
    }

    pub fn selected_user_id(&self) -> Option<i64> {
        self.login
            .list_state
            .selected()
            .and_then(|i| self.board.users().get(i))
            .map(|u| u.id)
    }

    pub fn login_selected(&mut self) {
        let user_id = self.selected_user_id();
        match self.board.login(user_id) {
            Ok(user) => {
                self.ui = BoardUiState::default();
                self.sync_mode();
                self.set_status_message(format!("Welcome back, {}", user.name));
            }
            Err(err) => self.report(err),
        }
    }

    pub fn enter_register_mode(&mut self) {
        self.mode = Mode::Register;
        self.login.field = RegisterField::Name;
    }

    pub fn exit_register_mode(&mut self) {
        self.mode = Mode::Login;
    }

    pub fn next_register_field(&mut self) {
        self.login.field = match self.login.field {
            RegisterField::Name => RegisterField::Email,
            RegisterField::Email => RegisterField::Name,
        };
    }

    pub fn current_register_input(&mut self) -> &mut InputField {
        match self.login.field {
            RegisterField::Name => &mut self.login.name,
            RegisterField::Email => &mut self.login.email,
        }
    }

    pub fn submit_registration(&mut self) {
        let name = self.login.name.value().to_string();
        let email = self.login.email.value().to_string();
        match self.board.register(&name, &email) {
            Ok(user) => {
                self.login.name.clear();
                self.login.email.clear();
                self.login.list_state.select(Some(self.board.users().len() - 1));
                self.ui = BoardUiState::default();
                self.sync_mode();
                self.set_status_message(format!("Registered {}", user.name));
            }
            Err(err) => self.report(err),
        }
    }

    pub fn logout(&mut self) {
        match self.board.logout() {
            Ok(()) => {
                self.ui = BoardUiState::default();
                self.input.clear();
                self.sync_mode();
            }
            Err(err) => self.report(err),
        }
    }

    // ----- board -----

    fn column_state(&mut self, column: Column) -> &mut ListState {
        match column {
            Column::Todo => &mut self.ui.todo_state,
            Column::Done => &mut self.ui.done_state,
        }
    }

    /// Keep both list selections inside their columns
    pub fn sync_list_states(&mut self) {
        for column in [Column::Todo, Column::Done] {
            let len = self.board.tasks_in(column).len();
            let state = self.column_state(column);
            let selected = match (len, state.selected()) {
                (0, _) => None,
                (_, None) => Some(0),
                (len, Some(i)) => Some(i.min(len - 1)),
            };
            state.select(selected);
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let state = match self.ui.focus {
            Column::Todo => &self.ui.todo_state,
            Column::Done => &self.ui.done_state,
        };
        let tasks = self.board.tasks_in(self.ui.focus);
        state.selected().and_then(|i| tasks.get(i).copied())
    }

    pub fn selected_task_id(&self) -> Option<i64> {
        self.selected_task().map(|t| t.id)
    }

    pub fn selected_comments(&self) -> Vec<&Comment> {
        match self.selected_task_id() {
            Some(id) => self.board.comments_for(id),
            None => Vec::new(),
        }
    }

    pub fn move_selection(&mut self, down: bool) {
        // A grabbed task stays put until dropped
        if self.ui.grabbed.is_some() {
            return;
        }
        let focus = self.ui.focus;
        let len = self.board.tasks_in(focus).len();
        if len == 0 {
            return;
        }
        let state = self.column_state(focus);
        let i = match state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn focus_column(&mut self, column: Column) {
        self.ui.focus = column;
        self.sync_list_states();
    }

    pub fn enter_add_task_mode(&mut self) {
        self.input.clear();
        self.mode = Mode::AddTask;
    }

    pub fn submit_new_task(&mut self) {
        let text = self.input.take();
        self.mode = Mode::Board;
        match self.board.add_task(&text) {
            Ok(Some(task)) => {
                self.ui.focus = Column::Todo;
                let index = self.board.tasks_in(Column::Todo).len().saturating_sub(1);
                self.ui.todo_state.select(Some(index));
                self.set_status_message(format!("Added \"{}\"", task.text));
            }
            Ok(None) => {}
            Err(err) => self.report(err),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        match self.board.toggle_task(id) {
            Ok(task) => {
                self.sync_list_states();
                self.set_status_message(format!("Moved to {}", Column::of(&task).title()));
            }
            Err(err) => self.report(err),
        }
    }

    /// Pick up the selected task, or drop the held one into the focused column
    pub fn grab_or_drop(&mut self) {
        match self.ui.grabbed {
            Some(id) => self.drop_grabbed(id),
            None => {
                if let Some(id) = self.selected_task_id() {
                    self.ui.grabbed = Some(id);
                    self.set_status_message("Moving task: choose a column and drop it".to_string());
                }
            }
        }
    }

    fn drop_grabbed(&mut self, id: i64) {
        self.ui.grabbed = None;
        let target = self.ui.focus;
        match self.board.drop_task(id, target.is_completed()) {
            Ok(true) => {
                let index = self
                    .board
                    .tasks_in(target)
                    .iter()
                    .position(|t| t.id == id);
                self.sync_list_states();
                self.column_state(target).select(index);
                self.set_status_message(format!("Moved to {}", target.title()));
            }
            Ok(false) => {
                self.sync_list_states();
                self.set_status_message(format!("Already in {}", target.title()));
            }
            Err(err) => self.report(err),
        }
    }

    pub fn cancel_grab(&mut self) {
        if self.ui.grabbed.take().is_some() {
            self.sync_list_states();
            self.clear_status_message();
        }
    }

    pub fn request_delete(&mut self) {
        if let Some(id) = self.selected_task_id() {
            self.modals.delete_confirmation = Some(id);
            self.modals.delete_modal_selection = 0;
        }
    }

    pub fn confirm_delete(&mut self) {
        let Some(id) = self.modals.delete_confirmation.take() else {
            return;
        };
        if self.modals.delete_modal_selection != 0 {
            return;
        }
        match self.board.delete_task(id) {
            Ok(()) => {
                self.sync_list_states();
                self.set_status_message("Task deleted".to_string());
            }
            Err(err) => self.report(err),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.modals.delete_confirmation = None;
    }

    pub fn enter_comment_mode(&mut self) {
        if self.selected_task_id().is_some() {
            self.input.clear();
            self.mode = Mode::Comment;
        }
    }

    pub fn submit_comment(&mut self) {
        let Some(task_id) = self.selected_task_id() else {
            self.mode = Mode::Board;
            return;
        };
        let text = self.input.take();
        match self.board.add_comment(task_id, &text) {
            Ok(Some(_)) => self.set_status_message("Comment added".to_string()),
            Ok(None) => {}
            Err(err) => self.report(err),
        }
    }

    pub fn refresh(&mut self) {
        match self.board.refresh() {
            Ok(()) => {
                self.sync_list_states();
                self.set_status_message("Refreshed".to_string());
            }
            Err(err) => self.report(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;

    #[test]
    fn test_failed_start_shows_alert_over_login() {
        let (store, offline) = FlakyStore::new();
        offline.set(true);
        let mut app = App::new(Config::default(), Board::new(Box::new(store)));

        app.start();

        assert_eq!(app.board.screen(), Screen::Login);
        assert_eq!(app.mode, Mode::Login);
        let alert = app.modals.alert.clone().unwrap();
        assert!(alert.starts_with("Something went wrong:"), "{}", alert);
    }

    #[test]
    fn test_failed_add_keeps_board_and_alerts() {
        let (store, offline) = FlakyStore::new();
        let mut app = App::new(Config::default(), Board::new(Box::new(store)));
        app.start();
        app.board.register("Ann", "ann@example.com").unwrap();
        app.mode = Mode::Board;

        offline.set(true);
        app.enter_add_task_mode();
        app.input.insert_char('x');
        app.submit_new_task();

        assert_eq!(app.mode, Mode::Board);
        assert!(app.board.tasks().is_empty());
        assert!(app.modals.alert.is_some());
        assert!(app.status.message.is_none());
    }
}
