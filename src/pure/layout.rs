//! The tiling layout engine: a catalog of percentage based slot layouts,
//! strut aware tiling space derivation and the user driven slot resize
//! projection.
//!
//! All functions in here are pure: they map rectangles to rectangles. The
//! [WindowManager][crate::core::WindowManager] is responsible for reading
//! struts from the server and pushing the resulting geometry to clients.
use crate::pure::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pixels reserved against the tiling space for client borders.
pub const TILING_MARGIN: u32 = 6;

/// How far apart two slot edges may sit while still counting as adjacent
/// for the purposes of a user driven resize.
pub const EDGE_TOLERANCE: i32 = 10;

/// The smallest width or height a slot may be driven to by a user resize.
/// A projection that would cross this aborts without side effects.
pub const MIN_SLOT_EXTENT: u32 = 50;

/// Pixels of screen edge reserved by a panel, read from
/// `_NET_WM_STRUT_PARTIAL` (first four values).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Strut {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Strut {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

/// One percentage rectangle within a [SlotLayout], all values in [0, 1].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LayoutSlot {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl LayoutSlot {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// An ordered sequence of slots: the i-th slot receives the i-th window of
/// the workspace it is applied to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SlotLayout {
    pub slots: Vec<LayoutSlot>,
}

impl SlotLayout {
    pub fn new(slots: Vec<LayoutSlot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The layout catalog: window count -> ordered list of layouts.
///
/// Built-in entries cover 1..=4 windows; user config can override or extend
/// any count before the event loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    by_count: HashMap<usize, Vec<SlotLayout>>,
}

impl Default for LayoutTable {
    fn default() -> Self {
        const THIRD: f64 = 1.0 / 3.0;

        let full = SlotLayout::new(vec![LayoutSlot::new(0.0, 0.0, 1.0, 1.0)]);
        let cols2 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, 0.5, 1.0),
            LayoutSlot::new(0.5, 0.0, 0.5, 1.0),
        ]);
        let rows2 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, 1.0, 0.5),
            LayoutSlot::new(0.0, 0.5, 1.0, 0.5),
        ]);
        let main_and_stack2 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, 0.5, 1.0),
            LayoutSlot::new(0.5, 0.0, 0.5, 0.5),
            LayoutSlot::new(0.5, 0.5, 0.5, 0.5),
        ]);
        let cols3 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, THIRD, 1.0),
            LayoutSlot::new(THIRD, 0.0, THIRD, 1.0),
            LayoutSlot::new(2.0 * THIRD, 0.0, THIRD, 1.0),
        ]);
        let grid4 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, 0.5, 0.5),
            LayoutSlot::new(0.5, 0.0, 0.5, 0.5),
            LayoutSlot::new(0.0, 0.5, 0.5, 0.5),
            LayoutSlot::new(0.5, 0.5, 0.5, 0.5),
        ]);
        let main_and_stack3 = SlotLayout::new(vec![
            LayoutSlot::new(0.0, 0.0, 0.5, 1.0),
            LayoutSlot::new(0.5, 0.0, 0.5, THIRD),
            LayoutSlot::new(0.5, THIRD, 0.5, THIRD),
            LayoutSlot::new(0.5, 2.0 * THIRD, 0.5, THIRD),
        ]);

        let by_count = HashMap::from([
            (1, vec![full]),
            (2, vec![cols2, rows2]),
            (3, vec![main_and_stack2, cols3]),
            (4, vec![grid4, main_and_stack3]),
        ]);

        Self { by_count }
    }
}

impl LayoutTable {
    /// The layouts available for the given window count, if any.
    pub fn layouts_for(&self, n: usize) -> Option<&[SlotLayout]> {
        self.by_count.get(&n).map(|ls| ls.as_slice())
    }

    /// Number of layouts defined for the given window count.
    pub fn len_for(&self, n: usize) -> usize {
        self.by_count.get(&n).map(|ls| ls.len()).unwrap_or(0)
    }

    /// Replace the catalog entry for a window count. Empty layout lists are
    /// dropped rather than stored.
    pub fn set(&mut self, n: usize, layouts: Vec<SlotLayout>) {
        if layouts.iter().all(|l| l.len() == n) && !layouts.is_empty() {
            self.by_count.insert(n, layouts);
        }
    }
}

/// Derive the usable tiling rectangle for a monitor after reserving a strut
/// and the outer gap.
pub fn tiling_space(mon: &Rect, strut: Strut, outer_gap: u32) -> Rect {
    Rect {
        x: mon.x + (strut.left + outer_gap) as i32,
        y: mon.y + (strut.top + outer_gap) as i32,
        w: mon
            .w
            .saturating_sub(strut.left + strut.right + 2 * outer_gap + TILING_MARGIN),
        h: mon
            .h
            .saturating_sub(strut.top + strut.bottom + 2 * outer_gap + TILING_MARGIN),
    }
}

/// Project a layout's percentage slots onto the tiling space as pixel
/// rectangles relative to the tiling space origin, before gaps.
///
/// This is the form stored in a workspace's resized layout: it survives gap
/// changes and monitor moves unchanged.
pub fn pixel_slots(layout: &SlotLayout, ts: &Rect) -> Vec<Rect> {
    let (tw, th) = (ts.w as f64, ts.h as f64);

    layout
        .slots
        .iter()
        .map(|s| Rect {
            x: (tw * s.x).round() as i32,
            y: (th * s.y).round() as i32,
            w: (tw * s.w).round() as u32,
            h: (th * s.h).round() as u32,
        })
        .collect()
}

/// Turn tiling-space relative pixel slots into absolute client rectangles by
/// re-adding the tiling space origin and carving the gap out of each slot.
pub fn apply_gaps(slots: &[Rect], ts: &Rect, gap: u32) -> Vec<Rect> {
    slots
        .iter()
        .map(|s| Rect {
            x: ts.x + s.x + gap as i32,
            y: ts.y + s.y + gap as i32,
            w: s.w.saturating_sub(2 * gap),
            h: s.h.saturating_sub(2 * gap),
        })
        .collect()
}

/// The axis a user driven slot resize operates along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Project a user driven resize of the focused slot onto the full slot set.
///
/// Along the chosen axis the focused slot's trailing edge moves by `delta`
/// pixels: every slot sharing that trailing edge (within [EDGE_TOLERANCE])
/// grows or shrinks with it, and every slot whose leading edge sits on it
/// gives up or gains the same amount so its own trailing edge stays put.
///
/// Returns None, leaving the caller's state untouched, when the focused
/// slot's trailing edge already sits on the tiling space boundary (there is
/// no neighbor to trade space with) or when any adjusted slot would drop
/// below [MIN_SLOT_EXTENT].
pub fn project_resize(
    slots: &[Rect],
    focused: usize,
    axis: Axis,
    delta: i32,
    ts: &Rect,
) -> Option<Vec<Rect>> {
    let f = slots.get(focused)?;

    let (f_trailing, limit) = match axis {
        Axis::X => (f.x + f.w as i32, ts.w as i32),
        Axis::Y => (f.y + f.h as i32, ts.h as i32),
    };

    if (limit - f_trailing).abs() <= EDGE_TOLERANCE {
        return None;
    }

    let mut projected = Vec::with_capacity(slots.len());
    for s in slots {
        let (leading, extent) = match axis {
            Axis::X => (s.x, s.w),
            Axis::Y => (s.y, s.h),
        };
        let trailing = leading + extent as i32;

        let (new_leading, new_extent) = if (trailing - f_trailing).abs() <= EDGE_TOLERANCE {
            (leading, extent as i32 + delta)
        } else if (leading - f_trailing).abs() <= EDGE_TOLERANCE {
            (leading + delta, extent as i32 - delta)
        } else {
            (leading, extent as i32)
        };

        if new_extent < MIN_SLOT_EXTENT as i32 {
            return None;
        }

        projected.push(match axis {
            Axis::X => Rect {
                x: new_leading,
                w: new_extent as u32,
                ..*s
            },
            Axis::Y => Rect {
                y: new_leading,
                h: new_extent as u32,
                ..*s
            },
        });
    }

    Some(projected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use simple_test_case::test_case;

    const MON: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn tiling_space_without_struts() {
        let ts = tiling_space(&MON, Strut::default(), 0);

        assert_eq!(ts, Rect::new(0, 0, 1914, 1074));
    }

    #[test]
    fn tiling_space_with_top_strut() {
        let ts = tiling_space(&MON, Strut::new(0, 0, 30, 0), 0);

        assert_eq!(ts, Rect::new(0, 30, 1914, 1044));
    }

    #[test]
    fn tiling_space_with_outer_gap_and_offset_monitor() {
        let mon = Rect::new(1920, 0, 1920, 1080);
        let ts = tiling_space(&mon, Strut::new(0, 0, 0, 20), 10);

        assert_eq!(ts, Rect::new(1930, 10, 1894, 1034));
    }

    #[test]
    fn two_windows_tile_side_by_side() {
        let table = LayoutTable::default();
        let ts = tiling_space(&MON, Strut::default(), 0);
        let layout = &table.layouts_for(2).unwrap()[0];
        let rects = apply_gaps(&pixel_slots(layout, &ts), &ts, 6);

        assert_eq!(
            rects,
            vec![
                Rect::new(6, 6, 945, 1062),
                Rect::new(963, 6, 945, 1062),
            ]
        );
    }

    #[test]
    fn single_window_honors_strut() {
        let table = LayoutTable::default();
        let ts = tiling_space(&MON, Strut::new(0, 0, 30, 0), 0);
        let layout = &table.layouts_for(1).unwrap()[0];
        let rects = apply_gaps(&pixel_slots(layout, &ts), &ts, 6);

        assert_eq!(rects, vec![Rect::new(6, 36, 1902, 1032)]);
    }

    #[test]
    fn builtin_catalog_covers_one_through_four() {
        let table = LayoutTable::default();

        for n in 1..=4 {
            let layouts = table.layouts_for(n).expect("catalog entry");
            assert!(!layouts.is_empty());
            for l in layouts {
                assert_eq!(l.len(), n, "slot count for {n} windows");
            }
        }
    }

    #[test]
    fn set_rejects_mismatched_slot_counts() {
        let mut table = LayoutTable::default();
        let before = table.layouts_for(2).unwrap().to_vec();

        table.set(2, vec![SlotLayout::new(vec![LayoutSlot::new(0.0, 0.0, 1.0, 1.0)])]);

        assert_eq!(table.layouts_for(2).unwrap(), before.as_slice());
    }

    // Three equal columns on a 1914 wide tiling space, used by the resize
    // projection tests below.
    fn three_columns() -> (Vec<Rect>, Rect) {
        let table = LayoutTable::default();
        let ts = tiling_space(&MON, Strut::default(), 0);
        let slots = pixel_slots(&table.layouts_for(3).unwrap()[1], &ts);

        (slots, ts)
    }

    #[test]
    fn grow_middle_column_steals_from_the_right() {
        let (slots, ts) = three_columns();

        let projected = project_resize(&slots, 1, Axis::X, 100, &ts).expect("projection");

        assert_eq!(projected[0], slots[0], "left column untouched");
        assert_eq!(projected[1].w, slots[1].w + 100, "middle column widened");
        assert_eq!(projected[2].x, slots[2].x + 100, "right column shifted");
        assert_eq!(projected[2].w, slots[2].w - 100, "right column narrowed");
        assert_eq!(
            projected[2].x + projected[2].w as i32,
            slots[2].x + slots[2].w as i32,
            "right column trailing edge unchanged"
        );
    }

    #[test]
    fn shrink_below_minimum_extent_is_rejected() {
        let (slots, ts) = three_columns();

        // 638 - 600 < 50 so the whole projection must be abandoned.
        assert_eq!(project_resize(&slots, 1, Axis::X, -600, &ts), None);
    }

    #[test]
    fn resize_at_the_tiling_space_boundary_is_rejected() {
        let (slots, ts) = three_columns();

        assert_eq!(project_resize(&slots, 2, Axis::X, 100, &ts), None);
    }

    #[test]
    fn vertical_resize_uses_the_y_origin() {
        let table = LayoutTable::default();
        // A tall offset monitor: the boundary check must compare against the
        // tiling space height, not its x origin.
        let mon = Rect::new(1920, 0, 1920, 2160);
        let ts = tiling_space(&mon, Strut::default(), 0);
        let slots = pixel_slots(&table.layouts_for(2).unwrap()[1], &ts);

        let projected = project_resize(&slots, 0, Axis::Y, 120, &ts).expect("projection");

        assert_eq!(projected[0].h, slots[0].h + 120);
        assert_eq!(projected[1].y, slots[1].y + 120);
        assert_eq!(projected[1].h, slots[1].h - 120);

        // The bottom row already touches the boundary.
        assert_eq!(project_resize(&slots, 1, Axis::Y, 120, &ts), None);
    }

    #[quickcheck]
    fn gapped_slots_stay_disjoint_and_in_bounds(w: u32, h: u32, n: usize) -> TestResult {
        let (w, h) = (w % 5000, h % 5000);
        if w < 200 || h < 200 {
            return TestResult::discard();
        }

        let table = LayoutTable::default();
        let n = 1 + n % 4;
        let ts = tiling_space(&Rect::new(0, 0, w, h), Strut::default(), 0);

        for layout in table.layouts_for(n).unwrap() {
            let rects = apply_gaps(&pixel_slots(layout, &ts), &ts, 6);

            for (i, a) in rects.iter().enumerate() {
                if a.x < ts.x || a.y < ts.y || a.right() > ts.right() + 1 || a.bottom() > ts.bottom() + 1
                {
                    return TestResult::failed();
                }

                for b in rects.iter().skip(i + 1) {
                    let overlap = a.x < b.right()
                        && b.x < a.right()
                        && a.y < b.bottom()
                        && b.y < a.bottom();
                    if overlap {
                        return TestResult::failed();
                    }
                }
            }
        }

        TestResult::passed()
    }

    #[test_case(Axis::X; "horizontal")]
    #[test_case(Axis::Y; "vertical")]
    #[test]
    fn projection_preserves_total_extent(axis: Axis) {
        let table = LayoutTable::default();
        let ts = tiling_space(&MON, Strut::default(), 0);
        let layout = match axis {
            Axis::X => &table.layouts_for(2).unwrap()[0],
            Axis::Y => &table.layouts_for(2).unwrap()[1],
        };
        let slots = pixel_slots(layout, &ts);

        let projected = project_resize(&slots, 0, axis, 80, &ts).expect("projection");

        let total = |rs: &[Rect]| -> u32 {
            rs.iter()
                .map(|r| match axis {
                    Axis::X => r.w,
                    Axis::Y => r.h,
                })
                .sum()
        };

        assert_eq!(total(&slots), total(&projected));
    }
}
