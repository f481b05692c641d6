use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::truncate;
use crate::Config;

const SEPARATOR: &str = " • ";

/// Join as many hints as fit in `max_width`, ending with "..." when some were dropped
fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for hint in key_hints {
        let candidate = if text.is_empty() {
            hint.clone()
        } else {
            format!("{}{}{}", text, SEPARATOR, hint)
        };
        if candidate.chars().count() > max_width {
            if text.is_empty() {
                return truncate(hint, max_width);
            }
            if text.chars().count() + 3 > max_width {
                text = text.chars().take(max_width.saturating_sub(3)).collect();
            }
            text.push_str("...");
            return text;
        }
        text = candidate;
    }
    text
}

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&String>, key_hints: &[String], config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => (
            truncate(msg, max_width),
            Style::default()
                .fg(get_contrast_text_color(highlight_bg))
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD),
        ),
        None => (fit_hints(key_hints, max_width), Style::default().fg(fg_color).bg(bg_color)),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".to_string(), "n: New".to_string(), "d: Delete".to_string()]
    }

    #[test]
    fn test_all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • n: New • d: Delete");
    }

    #[test]
    fn test_overflow_gets_ellipsis() {
        assert_eq!(fit_hints(&hints(), 20), "q: Quit • n: New...");
    }

    #[test]
    fn test_single_long_hint_is_truncated() {
        assert_eq!(fit_hints(&hints(), 5), "q:...");
    }
}
