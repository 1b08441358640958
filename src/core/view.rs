use super::geometry::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Where the page is rendered inside the window and at what resolution.
///
/// Three spaces are in play: window pixels, coordinates relative to the
/// web view (0..1), and page pixels as the browser engine sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    /// Web view rectangle in window pixels
    pub webview: Rect,
    /// Window size in pixels
    pub window_size: Vec2,
    /// Page pixels covered by the web view
    pub resolution: Vec2,
    /// Current page scroll in page pixels
    pub scroll_offset: Vec2,
}

impl PageView {
    /// Web view filling the whole window at one page pixel per window pixel
    pub fn fullscreen(width: f64, height: f64) -> Self {
        Self {
            webview: Rect::new(0.0, 0.0, width, height),
            window_size: Vec2::new(width, height),
            resolution: Vec2::new(width, height),
            scroll_offset: Vec2::ZERO,
        }
    }

    pub fn window_to_webview_relative(&self, window_px: Vec2) -> Vec2 {
        let size = self.webview.size();
        Vec2::new(
            safe_div(window_px.x - self.webview.x, size.x),
            safe_div(window_px.y - self.webview.y, size.y),
        )
    }

    pub fn webview_relative_to_window(&self, relative: Vec2) -> Vec2 {
        self.webview.origin() + relative.scale(self.webview.size())
    }

    pub fn webview_relative_to_page(&self, relative: Vec2) -> Vec2 {
        relative.scale(self.resolution)
    }

    /// Page pixels (viewport space, no scroll) to window pixels
    pub fn page_to_window(&self, page_px: Vec2) -> Vec2 {
        let relative = Vec2::new(
            safe_div(page_px.x, self.resolution.x),
            safe_div(page_px.y, self.resolution.y),
        );
        self.webview_relative_to_window(relative)
    }

    /// Document position to window-relative (0..1) coordinates. Fixed
    /// elements ignore the scroll offset.
    pub fn document_to_window_relative(&self, document_px: Vec2, fixed: bool) -> Vec2 {
        let mut viewport_px = document_px;
        if !fixed {
            viewport_px -= self.scroll_offset;
        }
        let window_px = self.page_to_window(viewport_px);
        Vec2::new(
            safe_div(window_px.x, self.window_size.x),
            safe_div(window_px.y, self.window_size.y),
        )
    }
}

impl Default for PageView {
    fn default() -> Self {
        Self::fullscreen(1280.0, 720.0)
    }
}

fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_view() -> PageView {
        PageView {
            webview: Rect::new(100.0, 50.0, 800.0, 400.0),
            window_size: Vec2::new(1000.0, 500.0),
            resolution: Vec2::new(1600.0, 800.0),
            scroll_offset: Vec2::new(0.0, 200.0),
        }
    }

    #[test]
    fn test_window_relative_round_trip() {
        let view = offset_view();
        let rel = view.window_to_webview_relative(Vec2::new(500.0, 250.0));
        assert_eq!(rel, Vec2::new(0.5, 0.5));
        assert_eq!(view.webview_relative_to_window(rel), Vec2::new(500.0, 250.0));
        assert_eq!(view.webview_relative_to_page(rel), Vec2::new(800.0, 400.0));
    }

    #[test]
    fn test_document_position_respects_scroll() {
        let view = offset_view();
        let scrolled = view.document_to_window_relative(Vec2::new(800.0, 600.0), false);
        assert_eq!(scrolled, Vec2::new(0.5, 0.5));

        let fixed = view.document_to_window_relative(Vec2::new(800.0, 400.0), true);
        assert_eq!(fixed, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_degenerate_webview_does_not_divide_by_zero() {
        let mut view = PageView::default();
        view.webview = Rect::new(0.0, 0.0, 0.0, 0.0);
        let rel = view.window_to_webview_relative(Vec2::new(10.0, 10.0));
        assert_eq!(rel, Vec2::ZERO);
    }
}
