//! Row windowing for the channel table.
//!
//! Only rows inside [`RowWindow`] are built; everything else is accounted
//! for as blank extent above and below so the scroll range stays right.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub row_height: u32,
    pub height: u32,
    /// Rows materialised beyond each edge of the visible range.
    pub overscan: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            row_height: 1,
            height: 0,
            overscan: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
    pub space_above: u64,
    pub space_below: u64,
}

impl RowWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

impl Viewport {
    pub fn new(row_height: u32, height: u32, overscan: usize) -> Self {
        Self {
            row_height: row_height.max(1),
            height,
            overscan,
        }
    }

    fn row_h(&self) -> u64 {
        u64::from(self.row_height.max(1))
    }

    /// Rows that fit in the viewport, counting a partial last row.
    pub fn visible_rows(&self) -> usize {
        u64::from(self.height).div_ceil(self.row_h()) as usize
    }

    /// Upper bound on [`RowWindow::len`] for any list length.
    pub fn max_materialized(&self) -> usize {
        self.visible_rows() + 1 + 2 * self.overscan
    }

    pub fn total_extent(&self, len: usize) -> u64 {
        len as u64 * self.row_h()
    }

    pub fn max_offset(&self, len: usize) -> u64 {
        self.total_extent(len).saturating_sub(u64::from(self.height))
    }

    pub fn window(&self, offset: u64, len: usize) -> RowWindow {
        let rh = self.row_h();
        let offset = offset.min(self.max_offset(len));
        let first = (offset / rh) as usize;
        let last = ((offset + u64::from(self.height)).div_ceil(rh) as usize).min(len);
        let end = (last + self.overscan).min(len);
        let start = first.saturating_sub(self.overscan).min(end);
        RowWindow {
            start,
            end,
            space_above: start as u64 * rh,
            space_below: (len - end) as u64 * rh,
        }
    }

    /// Display positions actually on screen (no overscan).
    pub fn visible_range(&self, offset: u64, len: usize) -> Range<usize> {
        let rh = self.row_h();
        let offset = offset.min(self.max_offset(len));
        let first = ((offset / rh) as usize).min(len);
        let last = ((offset + u64::from(self.height)).div_ceil(rh) as usize).min(len);
        first..last
    }
}

/// Scroll position in the same units as `Viewport::height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    offset: u64,
}

impl ScrollState {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Pull the offset back inside the scroll range after the list shrank.
    pub fn clamp(&mut self, vp: &Viewport, len: usize) {
        self.offset = self.offset.min(vp.max_offset(len));
    }

    pub fn scroll_to(&mut self, offset: u64, vp: &Viewport, len: usize) {
        self.offset = offset.min(vp.max_offset(len));
    }

    pub fn scroll_by(&mut self, delta: i64, vp: &Viewport, len: usize) {
        let target = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as u64)
        };
        self.scroll_to(target, vp, len);
    }

    /// Minimal scroll that brings display row `row` fully into view.
    pub fn ensure_visible(&mut self, row: usize, vp: &Viewport, len: usize) {
        if len == 0 {
            self.offset = 0;
            return;
        }
        let rh = u64::from(vp.row_height.max(1));
        let top = row.min(len - 1) as u64 * rh;
        let bottom = top + rh;
        if top < self.offset {
            self.offset = top;
        } else if bottom > self.offset + u64::from(vp.height) {
            self.offset = bottom.saturating_sub(u64::from(vp.height));
        }
        self.clamp(vp, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_materialises_nothing() {
        let vp = Viewport::new(1, 20, 3);
        let w = vp.window(0, 0);
        assert!(w.is_empty());
        assert_eq!((w.space_above, w.space_below), (0, 0));
    }

    #[test]
    fn single_row() {
        let vp = Viewport::new(1, 20, 3);
        let w = vp.window(100, 1);
        assert_eq!(w.range(), 0..1);
    }

    #[test]
    fn bounded_independent_of_length() {
        for &(rh, h) in &[(1u32, 20u32), (2, 7), (3, 30), (5, 1)] {
            let vp = Viewport::new(rh, h, 3);
            for &n in &[0usize, 1, 10, 10_000, 1_000_000] {
                for offset in [0u64, 13, 5_000, u64::MAX / 2] {
                    let w = vp.window(offset, n);
                    assert!(w.len() <= vp.max_materialized(), "n={n} rh={rh} h={h}");
                    let visible = vp.visible_range(offset, n);
                    assert!(w.start <= visible.start && visible.end <= w.end);
                    assert_eq!(
                        w.space_above + w.len() as u64 * u64::from(rh) + w.space_below,
                        vp.total_extent(n)
                    );
                }
            }
        }
    }

    #[test]
    fn window_tracks_offset() {
        let vp = Viewport::new(1, 10, 2);
        let w = vp.window(100, 10_000);
        assert_eq!(w.range(), 98..112);
        assert_eq!(w.space_above, 98);
        assert_eq!(w.space_below, 10_000 - 112);
    }

    #[test]
    fn shrinking_list_clamps_rather_than_resets() {
        let vp = Viewport::new(1, 10, 0);
        let mut scroll = ScrollState::default();
        scroll.scroll_to(500, &vp, 1000);
        assert_eq!(scroll.offset(), 500);

        scroll.clamp(&vp, 200);
        assert_eq!(scroll.offset(), 190);

        scroll.clamp(&vp, 5_000);
        assert_eq!(scroll.offset(), 190);

        scroll.clamp(&vp, 3);
        assert_eq!(scroll.offset(), 0);
    }

    #[test]
    fn ensure_visible_moves_minimally() {
        let vp = Viewport::new(1, 10, 0);
        let mut scroll = ScrollState::default();
        scroll.ensure_visible(4, &vp, 100);
        assert_eq!(scroll.offset(), 0);
        scroll.ensure_visible(15, &vp, 100);
        assert_eq!(scroll.offset(), 6);
        scroll.ensure_visible(3, &vp, 100);
        assert_eq!(scroll.offset(), 3);
    }

    #[test]
    fn scroll_by_saturates() {
        let vp = Viewport::new(1, 10, 0);
        let mut scroll = ScrollState::default();
        scroll.scroll_by(-5, &vp, 50);
        assert_eq!(scroll.offset(), 0);
        scroll.scroll_by(1_000, &vp, 50);
        assert_eq!(scroll.offset(), 40);
    }
}
