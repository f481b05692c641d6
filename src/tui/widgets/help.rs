use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;
use crate::Config;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Login:\n");
    text.push_str(&format!("  ↑/↓ or {} / {}: Choose user\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str("  Enter: Log in\n");
    text.push_str(&format!("  Tab or {}: Register a new user\n", key(&kb.new)));
    text.push('\n');

    text.push_str("Board:\n");
    text.push_str(&format!("  {} / {}: Move within a column\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} / {}: Switch column\n", key(&kb.column_left), key(&kb.column_right)));
    text.push_str(&format!("  {}: Add task\n", key(&kb.new)));
    text.push_str(&format!("  {}: Move task to the other column\n", key(&kb.toggle)));
    text.push_str(&format!("  {}: Pick up / drop task\n", key(&kb.grab)));
    text.push_str(&format!("  {}: Delete task\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Comment on task\n", key(&kb.comments)));
    text.push_str(&format!("  {}: Reload from storage\n", key(&kb.refresh)));
    text.push_str(&format!("  {}: Log out\n", key(&kb.logout)));
    text.push('\n');

    text.push_str("Moving a task:\n");
    text.push_str(&format!("  {} picks it up, {} / {} carry it,\n", key(&kb.grab), key(&kb.column_left), key(&kb.column_right)));
    text.push_str(&format!("  {} or Enter drops it, Esc puts it back\n", key(&kb.grab)));
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));

    text
}
