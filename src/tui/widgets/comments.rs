use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::models::{Comment, Task};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::input::{render_input, InputField};
use crate::Config;

/// Comment thread for the selected task. With `input` set, a text box for a
/// new comment is drawn along the bottom.
pub fn render_comments(
    f: &mut Frame,
    area: Rect,
    task: Option<&Task>,
    comments: &[&Comment],
    input: Option<&InputField>,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);

    // The input always gets its three rows; the thread takes what is left
    let (thread_area, input_area) = match input {
        Some(_) => {
            let [thread, input] = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);
            (thread, Some(input))
        }
        None => (area, None),
    };

    let title = match task {
        Some(task) => format!("Comments: {} ({})", task.text, comments.len()),
        None => "Comments".to_string(),
    };

    let lines: Vec<Line> = match task {
        None => vec![Line::from("Select a task to see its comments")],
        Some(_) if comments.is_empty() => vec![Line::from(Span::styled(
            "No comments yet",
            Style::default().fg(fg_color).add_modifier(Modifier::ITALIC),
        ))],
        Some(_) => comments.iter().map(|c| comment_line(c, accent)).collect(),
    };

    // Keep the newest comments in view
    let inner_height = thread_area.height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(inner_height) as u16;

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));
    f.render_widget(paragraph, thread_area);

    if let (Some(input), Some(input_area)) = (input, input_area) {
        render_input(f, input_area, "New comment (Enter to post, Esc to close)", input, true, config);
    }
}

fn comment_line(comment: &Comment, accent: ratatui::style::Color) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(when) = comment.created_at.as_deref() {
        spans.push(Span::raw(format!("{} ", short_timestamp(when))));
    }
    spans.push(Span::styled(
        format!("{}: ", comment.user_name),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(comment.content.clone()));
    Line::from(spans)
}

/// "2024-05-01T12:34:56.789Z" -> "2024-05-01 12:34"
fn short_timestamp(ts: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn draw_comments(height: u16, input: Option<&InputField>) -> String {
        let task = Task { id: 1, user_id: 1, text: "plan".into(), completed: false, created_at: None };
        let mut terminal = Terminal::new(TestBackend::new(60, height)).unwrap();
        terminal
            .draw(|f| render_comments(f, f.area(), Some(&task), &[], input, &Config::default()))
            .unwrap();
        terminal.backend().buffer().content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_input_is_drawn_in_a_short_panel() {
        let mut input = InputField::new();
        input.insert_char('h');
        let screen = draw_comments(4, Some(&input));
        assert!(screen.contains("New comment"));
    }

    #[test]
    fn test_thread_without_input() {
        let screen = draw_comments(6, None);
        assert!(screen.contains("No comments yet"));
        assert!(!screen.contains("New comment"));
    }

    #[test]
    fn test_short_timestamp_passes_through_unparseable() {
        assert_eq!(short_timestamp("yesterday"), "yesterday");
        assert_eq!(short_timestamp("2024-05-01T12:34:56Z").len(), "2024-05-01 12:34".len());
    }
}
