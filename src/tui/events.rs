use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;

use crate::board::Screen;
use crate::models::Column;
use crate::tui::app::{App, Mode, RegisterField};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::input::InputField;
use crate::utils::{parse_key_binding, ParsedKeyBinding};

/// Guard that restores the terminal even on panic; a terminal left in raw
/// mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore on normal exit; the drop afterwards is a no-op
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // already cleaning up, errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check before entering the alternate screen so the message stays readable
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // The loading screen is on screen now; do the initial fetch
        if app.board.screen() == Screen::Loading {
            app.start();
            continue;
        }

        // Only Press events, or Windows delivers every key twice
        if event::poll(std::time::Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    tracing::info!("Exiting taskboard");
    Ok(())
}

/// Handle one key press. Returns `Ok(true)` when the app should quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    // Alerts block everything until dismissed
    if app.modals.alert.is_some() {
        if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return Ok(false);
    }

    if app.modals.delete_confirmation.is_some() {
        return handle_delete_confirmation_modal(app, key_event);
    }

    match app.mode {
        Mode::Help => handle_help_mode(app, key_event),
        Mode::Login => handle_login_mode(app, key_event),
        Mode::Register => handle_register_mode(app, key_event),
        Mode::Board => handle_board_mode(app, key_event),
        Mode::AddTask => handle_add_task_mode(app, key_event),
        Mode::Comment => handle_comment_mode(app, key_event),
    }
}

fn binding(key_str: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key_str).map_err(TuiError::KeyBindingError)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    let has_primary_mod = crate::utils::has_primary_modifier(key_event.modifiers);
    if binding.requires_ctrl != has_primary_mod {
        return false;
    }
    binding.key_code == key_event.code
}

fn is(key_event: KeyEvent, key_str: &str) -> Result<bool, TuiError> {
    Ok(matches_key_event(key_event, &binding(key_str)?))
}

/// Apply a text-editing key to `field`. Returns false if the key is not an edit.
fn apply_edit_key(field: &mut InputField, key_event: KeyEvent) -> bool {
    if crate::utils::has_primary_modifier(key_event.modifiers) {
        return false;
    }
    match key_event.code {
        KeyCode::Char(c) => field.insert_char(c),
        KeyCode::Backspace => field.delete_char(),
        KeyCode::Delete => field.delete_forward(),
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Home => field.move_home(),
        KeyCode::End => field.move_end(),
        _ => return false,
    }
    true
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc || is(key_event, &app.config.key_bindings.help)? {
        app.mode = if app.board.current_user().is_some() {
            Mode::Board
        } else {
            Mode::Login
        };
    }
    Ok(false)
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Left => {
            app.modals.delete_modal_selection = 0;
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Tab => {
            app.modals.delete_modal_selection = 1;
        }
        KeyCode::Char('y') => {
            app.modals.delete_modal_selection = 0;
            app.confirm_delete();
        }
        KeyCode::Char('n') | KeyCode::Esc => app.cancel_delete(),
        KeyCode::Enter => app.confirm_delete(),
        _ => {}
    }
    Ok(false)
}

fn handle_login_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();
    if is(key_event, &keys.quit)? {
        return Ok(true);
    }
    if is(key_event, &keys.help)? {
        app.mode = Mode::Help;
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Up => app.move_user_selection(false),
        KeyCode::Down => app.move_user_selection(true),
        KeyCode::Enter => app.login_selected(),
        KeyCode::Tab => app.enter_register_mode(),
        _ => {
            if is(key_event, &keys.list_up)? {
                app.move_user_selection(false);
            } else if is(key_event, &keys.list_down)? {
                app.move_user_selection(true);
            } else if is(key_event, &keys.new)? {
                app.enter_register_mode();
            }
        }
    }
    Ok(false)
}

fn handle_register_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.exit_register_mode(),
        KeyCode::Tab | KeyCode::BackTab => app.next_register_field(),
        KeyCode::Enter => {
            if app.login.field == RegisterField::Name {
                app.next_register_field();
            } else {
                app.submit_registration();
            }
        }
        _ => {
            apply_edit_key(app.current_register_input(), key_event);
        }
    }
    Ok(false)
}

fn handle_board_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();

    if is(key_event, &keys.quit)? {
        return Ok(true);
    }
    if is(key_event, &keys.help)? {
        app.mode = Mode::Help;
        return Ok(false);
    }

    if app.ui.grabbed.is_some() {
        // While holding a task only column moves, drop and cancel apply
        match key_event.code {
            KeyCode::Esc => app.cancel_grab(),
            KeyCode::Enter => app.grab_or_drop(),
            KeyCode::Left => app.focus_column(Column::Todo),
            KeyCode::Right => app.focus_column(Column::Done),
            _ => {
                if is(key_event, &keys.grab)? {
                    app.grab_or_drop();
                } else if is(key_event, &keys.column_left)? {
                    app.focus_column(Column::Todo);
                } else if is(key_event, &keys.column_right)? {
                    app.focus_column(Column::Done);
                }
            }
        }
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Up => app.move_selection(false),
        KeyCode::Down => app.move_selection(true),
        KeyCode::Left => app.focus_column(Column::Todo),
        KeyCode::Right => app.focus_column(Column::Done),
        _ => {
            if is(key_event, &keys.list_up)? {
                app.move_selection(false);
            } else if is(key_event, &keys.list_down)? {
                app.move_selection(true);
            } else if is(key_event, &keys.column_left)? {
                app.focus_column(Column::Todo);
            } else if is(key_event, &keys.column_right)? {
                app.focus_column(Column::Done);
            } else if is(key_event, &keys.new)? {
                app.enter_add_task_mode();
            } else if is(key_event, &keys.toggle)? {
                app.toggle_selected();
            } else if is(key_event, &keys.delete)? {
                app.request_delete();
            } else if is(key_event, &keys.comments)? {
                app.enter_comment_mode();
            } else if is(key_event, &keys.grab)? {
                app.grab_or_drop();
            } else if is(key_event, &keys.refresh)? {
                app.refresh();
            } else if is(key_event, &keys.logout)? {
                app.logout();
            }
        }
    }
    Ok(false)
}

fn handle_add_task_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => {
            app.input.clear();
            app.mode = Mode::Board;
        }
        KeyCode::Enter => app.submit_new_task(),
        _ => {
            apply_edit_key(&mut app.input, key_event);
        }
    }
    Ok(false)
}

fn handle_comment_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => {
            app.input.clear();
            app.mode = Mode::Board;
        }
        KeyCode::Enter => app.submit_comment(),
        _ => {
            apply_edit_key(&mut app.input, key_event);
        }
    }
    Ok(false)
}
