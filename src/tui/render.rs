use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::board::Screen;
use crate::models::Column;
use crate::tui::app::Mode;
use crate::tui::widgets::{
    alert::render_alert,
    color::parse_color,
    column::{render_column, ColumnView},
    comments::render_comments,
    confirm_delete::render_confirm_delete,
    help::render_help,
    input::render_input,
    login::render_login,
    popup_area_fixed_height,
    status_bar::render_status_bar,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Taskboard")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    match app.board.screen() {
        Screen::Loading => render_loading(f, layout.inner_area, app),
        Screen::Login => {
            let users = app.board.users().to_vec();
            let registering = app.mode == Mode::Register;
            render_login(f, content_area(layout), &users, &mut app.login, registering, &app.config);
        }
        Screen::Board => render_board(f, app, layout),
    }

    // Overlays, after normal content
    if app.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
    }

    if let Some(id) = app.modals.delete_confirmation {
        if let Some(task) = app.board.task(id) {
            let comment_count = app.board.comments_for(id).len();
            render_confirm_delete(f, f.area(), task, comment_count, app.modals.delete_modal_selection, &app.config);
        }
    }

    if let Some(message) = app.modals.alert.clone() {
        render_alert(f, f.area(), &message, &app.config);
    }

    if app.board.screen() != Screen::Loading {
        let key_hints = get_key_hints(app);
        render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
    }
}

/// Everything between the header and the status line
fn content_area(layout: &Layout) -> Rect {
    let top = layout.todo_area.y;
    let bottom = layout.comments_area.y + layout.comments_area.height;
    Rect::new(layout.inner_area.x, top, layout.inner_area.width, bottom.saturating_sub(top))
}

fn render_loading(f: &mut Frame, area: Rect, app: &App) {
    let fg_color = parse_color(&app.config.get_active_theme().fg);
    let text = format!("Loading {} storage...", app.board.backend_name());
    let middle = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(fg_color)).alignment(Alignment::Center),
        middle,
    );
}

fn render_board(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let accent = parse_color(&active_theme.accent);

    // Header: who is logged in and where the data lives
    let user = app
        .board
        .current_user()
        .map(|u| format!("{} <{}>", u.name, u.email))
        .unwrap_or_default();
    let header = Line::from(vec![
        Span::styled(format!(" {}", user), Style::default().fg(accent).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  [{}]", app.board.backend_name())),
    ]);
    f.render_widget(Paragraph::new(header), layout.header_area);

    for (column, area) in [(Column::Todo, layout.todo_area), (Column::Done, layout.done_area)] {
        let tasks = app.board.tasks_in(column);
        let comment_counts: Vec<usize> = tasks.iter().map(|t| app.board.comments_for(t.id).len()).collect();
        let view = ColumnView {
            column,
            tasks: &tasks,
            comment_counts: &comment_counts,
            focused: app.ui.focus == column,
            grabbed: app.ui.grabbed,
        };
        let state = match column {
            Column::Todo => &mut app.ui.todo_state,
            Column::Done => &mut app.ui.done_state,
        };
        render_column(f, area, &view, state, &app.config);
    }

    let comment_input = (app.mode == Mode::Comment).then_some(&app.input);
    render_comments(
        f,
        layout.comments_area,
        app.selected_task(),
        &app.selected_comments(),
        comment_input,
        &app.config,
    );

    if app.mode == Mode::AddTask {
        let popup = popup_area_fixed_height(f.area(), 60, 3);
        f.render_widget(ratatui::widgets::Clear, popup);
        render_input(f, popup, "New task (Enter to add, Esc to cancel)", &app.input, true, &app.config);
    }
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    if app.modals.alert.is_some() {
        return vec!["Enter: OK".to_string()];
    }
    if app.modals.delete_confirmation.is_some() {
        return vec!["Enter: Confirm".to_string(), "Esc: Cancel".to_string()];
    }
    match app.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::Login => vec![
            "Enter: Log in".to_string(),
            "Tab: Register".to_string(),
            format!("{}: Quit", key(&kb.quit)),
            format!("{}: Help", key(&kb.help)),
        ],
        Mode::Register => vec![
            "Tab: Next field".to_string(),
            "Enter: Submit".to_string(),
            "Esc: Back".to_string(),
        ],
        Mode::AddTask => vec!["Enter: Add".to_string(), "Esc: Cancel".to_string()],
        Mode::Comment => vec!["Enter: Post".to_string(), "Esc: Close".to_string()],
        Mode::Board if app.ui.grabbed.is_some() => vec![
            format!("{}/{}: Choose column", key(&kb.column_left), key(&kb.column_right)),
            format!("{} or Enter: Drop", key(&kb.grab)),
            "Esc: Cancel".to_string(),
        ],
        Mode::Board => vec![
            format!("{}: Quit", key(&kb.quit)),
            format!("{}: New", key(&kb.new)),
            format!("{}: Toggle", key(&kb.toggle)),
            format!("{}: Move", key(&kb.grab)),
            format!("{}: Delete", key(&kb.delete)),
            format!("{}: Comment", key(&kb.comments)),
            format!("{}: Refresh", key(&kb.refresh)),
            format!("{}: Log out", key(&kb.logout)),
            format!("{}: Help", key(&kb.help)),
        ],
    }
}
