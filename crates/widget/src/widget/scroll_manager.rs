use gpui::{Pixels, point};
use gpui_component::VirtualListScrollHandle;

/// Small delta used to ignore floating-point layout jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

/// Keeps the message list pinned to its newest row.
///
/// Any change to the log or to the typing indicator requests a jump to the
/// tail; the jump is applied on the next render once the list knows its
/// new extent.
pub struct ScrollManager {
    scroll_handle: VirtualListScrollHandle,
    pending_scroll_to_bottom: bool,
    last_row_count: usize,
    last_typing: bool,
    last_max_offset: Pixels,
}

impl ScrollManager {
    pub fn new() -> Self {
        Self {
            scroll_handle: VirtualListScrollHandle::new(),
            pending_scroll_to_bottom: false,
            last_row_count: 0,
            last_typing: false,
            last_max_offset: Pixels::ZERO,
        }
    }

    pub fn handle(&self) -> &VirtualListScrollHandle {
        &self.scroll_handle
    }

    pub fn is_pending(&self) -> bool {
        self.pending_scroll_to_bottom
    }

    pub fn request_scroll_to_bottom(&mut self) {
        self.pending_scroll_to_bottom = true;
    }

    /// Requests a scroll when the row count or typing indicator changed.
    pub fn observe_rows(&mut self, row_count: usize, typing: bool) -> bool {
        let changed = row_count != self.last_row_count || typing != self.last_typing;
        self.last_row_count = row_count;
        self.last_typing = typing;

        if changed {
            self.pending_scroll_to_bottom = true;
        }
        changed
    }

    /// Applies a pending jump and returns true while another frame is needed.
    pub fn apply_pending_scroll(&mut self) -> bool {
        if !self.pending_scroll_to_bottom {
            return false;
        }

        let max_offset = self.scroll_handle.max_offset().height;
        let current_x = self.scroll_handle.offset().x;
        // GPUI scrolls down with negative Y offsets.
        let target_y = if max_offset > Pixels::ZERO {
            -max_offset
        } else {
            Pixels::ZERO
        };
        self.scroll_handle.set_offset(point(current_x, target_y));

        // Hold the request until the list extent stops moving between frames.
        let settled = (f32::from(max_offset) - f32::from(self.last_max_offset)).abs()
            <= SCROLL_DELTA_EPSILON;
        self.last_max_offset = max_offset;
        if settled {
            self.pending_scroll_to_bottom = false;
        }

        !settled
    }

    pub fn bounds_width(&self) -> Pixels {
        self.scroll_handle.bounds().size.width
    }
}

impl Default for ScrollManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rows_and_typing_changes_request_a_jump() {
        let mut manager = ScrollManager::new();
        assert!(!manager.is_pending());

        assert!(manager.observe_rows(1, true));
        assert!(manager.is_pending());

        assert!(manager.observe_rows(2, false));
        assert!(manager.observe_rows(2, true));
    }

    #[test]
    fn unchanged_rows_do_not_request_a_jump() {
        let mut manager = ScrollManager::new();
        manager.observe_rows(3, false);
        manager.pending_scroll_to_bottom = false;

        assert!(!manager.observe_rows(3, false));
        assert!(!manager.is_pending());

        manager.request_scroll_to_bottom();
        assert!(manager.is_pending());
    }
}
