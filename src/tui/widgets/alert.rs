use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area_fixed_height;
use crate::Config;

/// Blocking message box, dismissed with Enter, Esc or Space
pub fn render_alert(f: &mut Frame, area: Rect, message: &str, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let accent = parse_color(&active_theme.accent);

    let popup = popup_area_fixed_height(area, 50, 7);
    f.render_widget(Clear, popup);

    let lines = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from("[ OK ]").style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Notice")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(accent))
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup);
}
