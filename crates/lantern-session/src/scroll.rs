//! Viewport scroll state, in text rows.

/// Fraction of the viewport advanced by a page up/down.
pub const SCROLL_PAGE_FRACTION: f32 = 0.9;

/// Scroll state for a tab's text viewport.
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// First visible content row.
    pub row: usize,
    /// Total rendered content rows.
    content_rows: usize,
    /// Visible viewport rows.
    viewport_rows: usize,
}

impl ScrollState {
    pub fn new(viewport_rows: usize) -> Self {
        Self {
            row: 0,
            content_rows: 0,
            viewport_rows,
        }
    }

    /// Update dimensions after a render or resize, clamping the offset.
    pub fn set_extent(&mut self, content_rows: usize, viewport_rows: usize) {
        self.content_rows = content_rows;
        self.viewport_rows = viewport_rows;
        self.clamp();
    }

    /// Scroll up by one page.
    pub fn page_up(&mut self) {
        self.row = self.row.saturating_sub(self.page_amount());
    }

    /// Scroll down by one page.
    pub fn page_down(&mut self) {
        self.row += self.page_amount();
        self.clamp();
    }

    /// Jump to the top, for freshly loaded pages.
    pub fn reset(&mut self) {
        self.row = 0;
    }

    fn page_amount(&self) -> usize {
        ((self.viewport_rows as f32) * SCROLL_PAGE_FRACTION).max(1.0) as usize
    }

    fn clamp(&mut self) {
        let max = self.content_rows.saturating_sub(self.viewport_rows);
        self.row = self.row.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_down_clamps_to_content_end() {
        let mut s = ScrollState::new(10);
        s.set_extent(25, 10);
        s.page_down(); // 9
        s.page_down(); // 18 -> clamp 15
        assert_eq!(s.row, 15);
        s.page_down();
        assert_eq!(s.row, 15);
    }

    #[test]
    fn page_up_saturates_at_top() {
        let mut s = ScrollState::new(10);
        s.set_extent(100, 10);
        s.page_up();
        assert_eq!(s.row, 0);
        s.page_down();
        s.page_up();
        assert_eq!(s.row, 0);
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut s = ScrollState::new(20);
        s.set_extent(5, 20);
        s.page_down();
        assert_eq!(s.row, 0);
    }

    #[test]
    fn shrinking_content_clamps_offset() {
        let mut s = ScrollState::new(10);
        s.set_extent(100, 10);
        s.page_down();
        s.page_down();
        assert!(s.row > 0);
        s.set_extent(12, 10);
        assert_eq!(s.row, 2);
    }

    #[test]
    fn tiny_viewport_still_advances() {
        let mut s = ScrollState::new(1);
        s.set_extent(10, 1);
        s.page_down();
        assert_eq!(s.row, 1);
    }
}
