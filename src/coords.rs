// Display space -> logical pixel space.
// Visual: wherever the window is stretched to, the pen lands under the cursor.

use crate::types::{DisplayRect, Point};

/// A raw pointer sample as the platform reports it.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
    /// Mouse/pen position relative to the canvas element's top-left corner.
    Mouse { offset_x: f32, offset_y: f32 },
    /// Active touch points in client (window) coordinates; only the first counts.
    /// Only embedders with a touch source construct this.
    #[allow(dead_code)]
    Touch { touches: Vec<(f32, f32)> },
}

impl PointerInput {
    pub fn is_touch(&self) -> bool {
        matches!(self, PointerInput::Touch { .. })
    }
}

/// Scales pointer positions into the surface's fixed resolution.
/// Nothing is cached between calls.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    logical_width: f32,
    logical_height: f32,
}

impl CoordinateMapper {
    pub fn new(logical_width: usize, logical_height: usize) -> Self {
        Self { logical_width: logical_width as f32, logical_height: logical_height as f32 }
    }

    /// Map one sample using the canvas rect as it is *right now*.
    /// A zero-sized rect gives non-finite coordinates; callers drop those.
    pub fn map(&self, input: &PointerInput, rect: &DisplayRect) -> Point {
        let sx = self.logical_width / rect.width;
        let sy = self.logical_height / rect.height;

        let (x, y) = match input {
            PointerInput::Mouse { offset_x, offset_y } => (*offset_x, *offset_y),
            PointerInput::Touch { touches } => touches
                .first()
                .map(|(cx, cy)| (cx - rect.left, cy - rect.top))
                .unwrap_or((f32::NAN, f32::NAN)),
        };

        Point::new(x * sx, y * sy)
    }
}

/// Pointer event derived from polling the mouse once per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MouseEdge {
    Press(f32, f32),
    Move(f32, f32),
    Release,
}

/// Turns per-frame button/position samples into press, move and release
/// events. A frame where the cursor has not moved produces no move.
#[derive(Debug, Default)]
pub struct MouseTracker {
    was_down: bool,
    last: Option<(f32, f32)>,
}

impl MouseTracker {
    /// `pos` is relative to the canvas and `None` when the cursor is outside
    /// it. `drawing` says whether a stroke is currently active.
    pub fn update(&mut self, down: bool, pos: Option<(f32, f32)>, drawing: bool) -> Option<MouseEdge> {
        let edge = match (down, pos) {
            (true, Some((x, y))) if drawing => {
                (self.last != Some((x, y))).then_some(MouseEdge::Move(x, y))
            }
            // Only a fresh press starts a stroke, not dragging in from outside.
            (true, Some((x, y))) if !self.was_down => Some(MouseEdge::Press(x, y)),
            (true, Some(_)) => None,
            _ if drawing => Some(MouseEdge::Release),
            _ => None,
        };
        self.was_down = down;
        self.last = pos;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LOGICAL_HEIGHT, LOGICAL_WIDTH};

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(LOGICAL_WIDTH, LOGICAL_HEIGHT)
    }

    fn rect(left: f32, top: f32, width: f32, height: f32) -> DisplayRect {
        DisplayRect { left, top, width, height }
    }

    #[test]
    fn one_to_one_display_is_identity() {
        let p = mapper().map(
            &PointerInput::Mouse { offset_x: 120.0, offset_y: 33.5 },
            &rect(0.0, 0.0, 960.0, 540.0),
        );
        assert_eq!(p, Point::new(120.0, 33.5));
    }

    #[test]
    fn half_size_display_doubles_coordinates() {
        let p = mapper().map(
            &PointerInput::Mouse { offset_x: 100.0, offset_y: 50.0 },
            &rect(0.0, 0.0, 480.0, 270.0),
        );
        assert_eq!(p, Point::new(200.0, 100.0));
    }

    #[test]
    fn axes_scale_independently() {
        let p = mapper().map(
            &PointerInput::Mouse { offset_x: 960.0, offset_y: 270.0 },
            &rect(0.0, 0.0, 1920.0, 270.0),
        );
        assert_eq!(p, Point::new(480.0, 540.0));
    }

    #[test]
    fn touch_uses_first_point_relative_to_rect_origin() {
        let input = PointerInput::Touch { touches: vec![(110.0, 70.0), (500.0, 500.0)] };
        let p = mapper().map(&input, &rect(10.0, 20.0, 480.0, 270.0));
        assert_eq!(p, Point::new(200.0, 100.0));
        assert!(input.is_touch());
    }

    #[test]
    fn touch_without_points_is_not_finite() {
        let p = mapper().map(&PointerInput::Touch { touches: vec![] }, &rect(0.0, 0.0, 960.0, 540.0));
        assert!(!p.is_finite());
    }

    #[test]
    fn degenerate_rect_does_not_panic() {
        let p = mapper().map(
            &PointerInput::Mouse { offset_x: 5.0, offset_y: 0.0 },
            &rect(0.0, 0.0, 0.0, 0.0),
        );
        assert!(!p.is_finite());
    }

    #[test]
    fn rect_changes_are_seen_on_the_next_call() {
        let m = mapper();
        let input = PointerInput::Mouse { offset_x: 10.0, offset_y: 10.0 };
        let before = m.map(&input, &rect(0.0, 0.0, 960.0, 540.0));
        let after = m.map(&input, &rect(0.0, 0.0, 96.0, 54.0));
        assert_eq!(before, Point::new(10.0, 10.0));
        assert_eq!(after, Point::new(100.0, 100.0));
    }

    #[test]
    fn held_still_mouse_produces_no_moves() {
        let mut tracker = MouseTracker::default();
        assert_eq!(tracker.update(true, Some((10.0, 10.0)), false), Some(MouseEdge::Press(10.0, 10.0)));
        assert_eq!(tracker.update(true, Some((10.0, 10.0)), true), None);
        assert_eq!(tracker.update(true, Some((20.0, 10.0)), true), Some(MouseEdge::Move(20.0, 10.0)));
        for _ in 0..60 {
            assert_eq!(tracker.update(true, Some((20.0, 10.0)), true), None);
        }
        assert_eq!(tracker.update(false, Some((20.0, 10.0)), true), Some(MouseEdge::Release));
    }

    #[test]
    fn leaving_the_canvas_releases_and_reentering_does_not_press() {
        let mut tracker = MouseTracker::default();
        tracker.update(true, Some((1.0, 1.0)), false);
        assert_eq!(tracker.update(true, None, true), Some(MouseEdge::Release));
        assert_eq!(tracker.update(true, Some((2.0, 2.0)), false), None);
        assert_eq!(tracker.update(false, Some((2.0, 2.0)), false), None);
        assert_eq!(tracker.update(true, Some((2.0, 2.0)), false), Some(MouseEdge::Press(2.0, 2.0)));
    }
}
