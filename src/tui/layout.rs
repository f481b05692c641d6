use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub header_area: Rect,
    pub todo_area: Rect,
    pub done_area: Rect,
    pub comments_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Width: 40 columns fits two 20-column task lists side by side
    /// Height: 12 lines (1 header + 5 columns + 4 comments + 1 status + 1 buffer)
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect) -> Self {
        let min_width_with_border = Self::MIN_WIDTH + 2;
        let min_height_with_border = Self::MIN_HEIGHT + 2;
        let width = size.width.max(min_width_with_border);
        let height = size.height.max(min_height_with_border);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Comments take a third of the content, the columns the rest
        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),        // Header
                Constraint::Percentage(65),   // Columns
                Constraint::Min(4),           // Comments
                Constraint::Length(1),        // Status
            ])
            .split(inner_area);

        let columns = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(vertical[1]);

        Self {
            inner_area,
            header_area: vertical[0],
            todo_area: columns[0],
            done_area: columns[1],
            comments_area: vertical[2],
            status_area: vertical[3],
        }
    }
}
