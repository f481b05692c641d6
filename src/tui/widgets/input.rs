use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::tui::widgets::color::parse_color;

/// Single-line text buffer with a cursor, counted in chars so multi-byte
/// input edits cleanly.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    value: String,
    cursor: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, ch: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, ch);
        self.cursor += 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let idx = self.byte_index(self.cursor - 1);
        self.value.remove(idx);
        self.cursor -= 1;
    }

    /// Delete the char under the cursor
    pub fn delete_forward(&mut self) {
        if self.cursor >= self.char_count() {
            return;
        }
        let idx = self.byte_index(self.cursor);
        self.value.remove(idx);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Return the contents and reset the field
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    /// Visible slice and cursor column for a field `width` chars wide
    fn visible(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        let start = self.cursor.saturating_sub(width.saturating_sub(1));
        let text: String = self.value.chars().skip(start).take(width).collect();
        (text, self.cursor - start)
    }
}

/// Render a bordered input box; when `focused` the terminal cursor is placed in it
pub fn render_input(f: &mut Frame, area: Rect, title: &str, field: &InputField, focused: bool, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let border_color = if focused {
        parse_color(&active_theme.accent)
    } else {
        fg_color
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let (text, cursor_col) = field.visible(inner_width);

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(fg_color))
        .block(Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(border_color)));
    f.render_widget(paragraph, area);

    if focused && area.width > 2 && area.height > 2 {
        f.set_cursor_position((area.x + 1 + cursor_col as u16, area.y + 1));
    }
}
