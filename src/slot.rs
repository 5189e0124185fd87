//! Free slot search inside the taskbar's icon tray
//!
//! The tray is owned by the shell and changes under us, so the search runs
//! against a fresh snapshot of child rectangles on every injection.

use crate::render::surface::Rect;

/// Offset used when the tray cannot be enumerated
pub const FALLBACK_SLOT_X: i32 = 0;

/// Claimed horizontal region, relative to the tray container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub x: i32,
    pub y: i32,
    pub width: i32,
}

/// Horizontal extent of one existing tray child, container relative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSpan {
    pub left: i32,
    pub right: i32,
    pub top: i32,
}

impl ChildSpan {
    pub fn from_rect(rect: Rect) -> Self {
        ChildSpan {
            left: rect.x,
            right: rect.right(),
            top: rect.y,
        }
    }

    fn overlaps(&self, left: i32, right: i32) -> bool {
        left < self.right && self.left < right
    }
}

/// Place a box of `icon_width` after the rightmost child plus `margin`,
/// skipping past any child it would overlap. `children` must already
/// exclude the window being placed. Empty input yields the fallback slot.
pub fn find_slot(children: &[ChildSpan], icon_width: i32, margin: i32) -> Slot {
    if children.is_empty() {
        return Slot {
            x: FALLBACK_SLOT_X,
            y: 0,
            width: icon_width,
        };
    }

    let margin = margin.max(0);
    let mut sorted: Vec<ChildSpan> = children.to_vec();
    sorted.sort_by_key(|c| (c.left, c.right));

    let rightmost = sorted.iter().map(|c| c.right).max().unwrap_or(0);
    let mut x = rightmost + margin;

    // Children may overlap each other or extend oddly; settle on a gap
    loop {
        match sorted.iter().find(|c| c.overlaps(x, x + icon_width)) {
            Some(child) => x = child.right + margin,
            None => break,
        }
    }

    let y = sorted.iter().map(|c| c.top).min().unwrap_or(0);
    Slot { x, y, width: icon_width }
}

/// `find_slot` bounded on the right by `limit`, the left edge of the
/// notification area. `None` when the box does not fit before it.
pub fn find_slot_within(children: &[ChildSpan], icon_width: i32, margin: i32, limit: i32) -> Option<Slot> {
    let slot = find_slot(children, icon_width, margin);
    (slot.x + icon_width <= limit).then_some(slot)
}

/// Slot flush against the left of `limit`, used when no gap is free
pub fn slot_before(limit: i32, y: i32, icon_width: i32, margin: i32) -> Slot {
    Slot {
        x: (limit - margin.max(0) - icon_width).max(0),
        y,
        width: icon_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(left: i32, right: i32) -> ChildSpan {
        ChildSpan { left, right, top: 0 }
    }

    #[test]
    fn test_slot_after_rightmost_child() {
        let slot = find_slot(&[span(0, 50), span(50, 90)], 40, 4);
        assert_eq!(slot, Slot { x: 94, y: 0, width: 40 });
    }

    #[test]
    fn test_unsorted_children() {
        let slot = find_slot(&[span(120, 160), span(0, 50), span(60, 100)], 30, 2);
        assert_eq!(slot.x, 162);
    }

    #[test]
    fn test_fallback_when_tray_empty() {
        let slot = find_slot(&[], 40, 4);
        assert_eq!(slot.x, FALLBACK_SLOT_X);
        assert_eq!(slot.width, 40);
    }

    #[test]
    fn test_slot_never_overlaps() {
        let children = [span(0, 10), span(5, 70), span(30, 40), span(72, 75)];
        let slot = find_slot(&children, 20, 3);
        assert!(children.iter().all(|c| !c.overlaps(slot.x, slot.x + slot.width)));
        assert_eq!(slot.x, 78);
    }

    #[test]
    fn test_bounded_slot_fits_before_limit() {
        let children = [span(0, 48), span(48, 1500)];
        let slot = find_slot_within(&children, 40, 4, 1700).unwrap();
        assert_eq!(slot.x, 1504);
        assert!(slot.x + slot.width <= 1700);
    }

    #[test]
    fn test_no_room_before_notification_area() {
        // Start button, task list up to the notification area
        let children = [span(0, 48), span(48, 1700)];
        assert_eq!(find_slot_within(&children, 40, 4, 1700), None);

        let tray = span(1700, 1920);
        let slot = slot_before(1700, 0, 40, 4);
        assert_eq!(slot.x, 1656);
        assert!(!tray.overlaps(slot.x, slot.x + slot.width));
    }

    #[test]
    fn test_slot_before_stays_on_bar() {
        assert_eq!(slot_before(20, 0, 40, 4).x, 0);
    }

    #[test]
    fn test_slot_uses_topmost_child_edge() {
        let children = [
            ChildSpan { left: 0, right: 20, top: 4 },
            ChildSpan { left: 20, right: 40, top: 2 },
        ];
        assert_eq!(find_slot(&children, 10, 0).y, 2);
    }
}
