use std::ops::{Deref, DerefMut};

use ratatui::layout::Rect;

use crate::puzzle::NodeId;
use crate::render::{
    CursorVisualPosition, HitRegion, RenderOverlay, RenderResult, node_at, render_instructions,
};
use crate::session::PuzzleSession;
use crate::theme::Theme;

/// PuzzleDisplay wraps a PuzzleSession and keeps what the last frame looked
/// like, so that mouse positions can be mapped back to brackets.
#[derive(Debug)]
pub struct PuzzleDisplay {
    session: PuzzleSession,
    regions: Vec<HitRegion>,
    last_cursor_visual: Option<CursorVisualPosition>,
    last_view_height: usize,
    last_total_lines: usize,
    last_text_area: Rect,
}

impl PuzzleDisplay {
    pub fn new(session: PuzzleSession) -> Self {
        Self {
            session,
            regions: Vec::new(),
            last_cursor_visual: None,
            last_view_height: 1,
            last_total_lines: 0,
            last_text_area: Rect::default(),
        }
    }

    /// Get the input cursor position from the last render
    pub fn last_cursor_visual(&self) -> Option<CursorVisualPosition> {
        self.last_cursor_visual
    }

    pub fn last_view_height(&self) -> usize {
        self.last_view_height
    }

    pub fn last_total_lines(&self) -> usize {
        self.last_total_lines
    }

    /// Render the current projection, with hover and the open input field
    /// drawn on top, and remember where every bracket ended up.
    pub fn render(
        &mut self,
        wrap_width: usize,
        left_padding: usize,
        theme: &Theme,
    ) -> RenderResult {
        let overlay = RenderOverlay {
            hovered: self.session.hovered(),
            editing: self.session.editing(),
        };
        let result = render_instructions(
            self.session.projection(),
            wrap_width,
            left_padding,
            overlay,
            theme,
        );
        self.regions = result.regions.clone();
        self.last_cursor_visual = result.cursor;
        result
    }

    /// Update tracking state after rendering (called from draw)
    pub fn update_after_render(&mut self, text_area: Rect, total_lines: usize) {
        self.last_text_area = text_area;
        self.last_total_lines = total_lines;
        self.last_view_height = (text_area.height as usize).max(1);
    }

    /// The bracket drawn under a terminal cell, if any.
    pub fn node_from_mouse(&self, column: u16, row: u16, scroll_top: usize) -> Option<NodeId> {
        let area = self.last_text_area;
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let max_x = area.x.saturating_add(area.width);
        let max_y = area.y.saturating_add(area.height);
        if column < area.x || column >= max_x || row < area.y || row >= max_y {
            return None;
        }
        let line = scroll_top.saturating_add((row - area.y) as usize);
        let relative_column = column - area.x;
        node_at(&self.regions, line, relative_column)
    }

    /// Moves the hover highlight to whatever is under the mouse.
    pub fn hover_at(&mut self, column: u16, row: u16, scroll_top: usize) -> bool {
        let id = self.node_from_mouse(column, row, scroll_top);
        self.session.hover(id)
    }
}

impl Deref for PuzzleDisplay {
    type Target = PuzzleSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for PuzzleDisplay {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::session::SessionConfig;

    fn display(text: &str) -> PuzzleDisplay {
        PuzzleDisplay::new(PuzzleSession::with_puzzle(SessionConfig::default(), text))
    }

    fn rendered(text: &str, area: Rect, width: usize) -> PuzzleDisplay {
        let mut display = display(text);
        let result = display.render(width, 0, &Theme::default());
        display.update_after_render(area, result.total_lines);
        display
    }

    #[test]
    fn nothing_is_hit_before_first_render() {
        let display = display("[a]");
        assert_eq!(display.node_from_mouse(0, 0, 0), None);
    }

    #[test]
    fn mouse_maps_through_text_area_offset() {
        let display = rendered("x [ab] y", Rect::new(3, 1, 40, 5), 40);
        // "[ab]" covers columns 2..6 of the text area.
        assert_eq!(display.node_from_mouse(5, 1, 0), Some(0));
        assert_eq!(display.node_from_mouse(8, 1, 0), Some(0));
        assert_eq!(display.node_from_mouse(9, 1, 0), None);
        assert_eq!(display.node_from_mouse(4, 1, 0), None);
        assert_eq!(display.node_from_mouse(5, 2, 0), None);
    }

    #[test]
    fn clicks_outside_text_area_hit_nothing() {
        let display = rendered("[ab]", Rect::new(3, 1, 40, 5), 40);
        assert_eq!(display.node_from_mouse(2, 1, 0), None);
        assert_eq!(display.node_from_mouse(3, 0, 0), None);
        assert_eq!(display.node_from_mouse(3, 6, 0), None);
    }

    #[test]
    fn scroll_offset_selects_later_lines() {
        let display = rendered("a\nb\n[c]", Rect::new(0, 0, 20, 2), 20);
        assert_eq!(display.last_total_lines(), 3);
        assert_eq!(display.node_from_mouse(0, 0, 2), Some(0));
        assert_eq!(display.node_from_mouse(0, 1, 1), Some(0));
        assert_eq!(display.node_from_mouse(0, 0, 0), None);
    }

    #[test]
    fn hover_follows_mouse() {
        let mut display = rendered("[a] b", Rect::new(0, 0, 20, 2), 20);
        assert!(display.hover_at(1, 0, 0));
        assert_eq!(display.hovered(), Some(0));
        assert!(!display.hover_at(2, 0, 0));
        assert!(display.hover_at(4, 0, 0));
        assert_eq!(display.hovered(), None);
    }

    #[test]
    fn render_tracks_input_cursor() {
        let mut display = display("[a]");
        let start = Instant::now();
        display.activate(0, start);
        display.tick(start + Duration::from_millis(300));
        if let Some(edit) = display.editing_mut() {
            edit.insert_char('z');
        }
        display.render(20, 2, &Theme::default());
        assert_eq!(
            display.last_cursor_visual(),
            Some(CursorVisualPosition { line: 0, column: 3 })
        );

        display.commit_edit();
        display.render(20, 2, &Theme::default());
        assert_eq!(display.last_cursor_visual(), None);
        assert_eq!(display.tree().bracket(0).and_then(|b| b.guessed_word()), Some("z"));
    }

    #[test]
    fn view_height_never_drops_below_one() {
        let display = rendered("[a]", Rect::new(0, 0, 20, 0), 20);
        assert_eq!(display.last_view_height(), 1);
        assert_eq!(display.node_from_mouse(0, 0, 0), None);
    }
}
