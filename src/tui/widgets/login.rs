use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, StatefulWidget};
use ratatui::Frame;

use crate::models::User;
use crate::tui::app::{LoginState, RegisterField};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::input::render_input;
use crate::tui::widgets::truncate;
use crate::Config;

/// Login screen: existing users on the left, registration form on the right
pub fn render_login(
    f: &mut Frame,
    area: Rect,
    users: &[User],
    login: &mut LoginState,
    registering: bool,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    let [users_area, form_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let max_width = users_area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = if users.is_empty() {
        vec![ListItem::new("No users yet, register one")]
    } else {
        users
            .iter()
            .map(|u| ListItem::new(truncate(&format!("{} <{}>", u.name, u.email), max_width)))
            .collect()
    };

    let list_border = if registering { fg_color } else { accent };
    let list = List::new(items)
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Log in as")
            .border_style(Style::default().fg(list_border)))
        .style(Style::default().fg(fg_color))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));
    StatefulWidget::render(list, users_area, f.buffer_mut(), &mut login.list_state);

    let [title_area, name_area, email_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(form_area);

    f.render_widget(
        Paragraph::new(" Register").style(Style::default().fg(if registering { accent } else { fg_color })),
        title_area,
    );
    render_input(f, name_area, "Name", &login.name, registering && login.field == RegisterField::Name, config);
    render_input(f, email_area, "Email", &login.email, registering && login.field == RegisterField::Email, config);

    let hint = if registering {
        " Tab: switch field  Enter: next/submit  Esc: back"
    } else {
        " Tab: register a new user"
    };
    f.render_widget(Paragraph::new(hint).style(Style::default().fg(fg_color)), hint_area);
}
