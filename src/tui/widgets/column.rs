use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
};
use ratatui::Frame;

use crate::models::{Column, Task};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};
use crate::tui::widgets::truncate;
use crate::Config;

/// How a column should look this frame
pub struct ColumnView<'a> {
    pub column: Column,
    pub tasks: &'a [&'a Task],
    /// Comment count for each entry of `tasks`
    pub comment_counts: &'a [usize],
    pub focused: bool,
    /// Task currently being carried, if any
    pub grabbed: Option<i64>,
}

fn task_line(task: &Task, comments: usize, grabbed: bool, max_width: usize) -> String {
    let marker = if grabbed {
        "»"
    } else if task.completed {
        "✓"
    } else {
        "○"
    };
    let suffix = if comments > 0 { format!(" [{}]", comments) } else { String::new() };
    let text_width = max_width.saturating_sub(2 + suffix.chars().count());
    format!("{} {}{}", marker, truncate(&task.text, text_width), suffix)
}

pub fn render_column(f: &mut Frame, area: Rect, view: &ColumnView, list_state: &mut ListState, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let accent = parse_color(&active_theme.accent);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };

    // 2 for borders, 1 for the scrollbar
    let max_width = area.width.saturating_sub(3) as usize;

    let items: Vec<ListItem> = view
        .tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let comments = view.comment_counts.get(i).copied().unwrap_or(0);
            let is_grabbed = view.grabbed == Some(task.id);
            let item = ListItem::new(task_line(task, comments, is_grabbed, max_width));
            if is_grabbed {
                item.style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            } else if task.completed {
                item.style(Style::default().fg(fg_color).add_modifier(Modifier::DIM))
            } else {
                item
            }
        })
        .collect();

    let carrying = view.grabbed.is_some();
    let title = if carrying && view.focused {
        format!("{} ({}) - drop here", view.column.title(), view.tasks.len())
    } else {
        format!("{} ({})", view.column.title(), view.tasks.len())
    };
    let border_style = if view.focused {
        Style::default().fg(accent)
    } else {
        Style::default().fg(fg_color)
    };

    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = areas[0];
    let scrollbar_area = areas[1];

    // Only the focused column shows its cursor, and not while carrying a task
    let highlight = if view.focused && !carrying {
        Style::default().fg(highlight_fg).bg(highlight_bg)
    } else {
        Style::default()
    };

    let total_items = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style))
        .style(Style::default().fg(fg_color))
        .highlight_style(highlight);

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_items = list_area.height.saturating_sub(2) as usize;
    if total_items > visible_items && visible_items > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let selected_index = list_state.selected().unwrap_or(0);
        let scroll_position = selected_index.saturating_sub(visible_items - 1);
        let mut scrollbar_state = ScrollbarState::new(total_items)
            .viewport_content_length(visible_items)
            .position(scroll_position);

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}
