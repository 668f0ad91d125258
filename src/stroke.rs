// Freehand pen: paints each pointer-move segment straight into the surface.
// Visual: a 5 px round-capped line follows the pointer while the button is held.
// Nothing about the stroke survives pointer-up except its pixels.

use crate::gamma::GammaLut;
use crate::types::{Color, Point, Surface};

pub const STROKE_WIDTH: f32 = 5.0;

enum StrokeMode {
    Idle,
    Drawing { path: Vec<Point>, touch: bool },
}

pub struct StrokeRenderer {
    mode: StrokeMode,
    width: f32,
    lut: GammaLut,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self { mode: StrokeMode::Idle, width: STROKE_WIDTH, lut: GammaLut::new() }
    }

    #[cfg(test)]
    pub fn is_drawing(&self) -> bool {
        matches!(self.mode, StrokeMode::Drawing { .. })
    }

    /// Points of the stroke in progress (empty when idle).
    pub fn path(&self) -> &[Point] {
        match &self.mode {
            StrokeMode::Drawing { path, .. } => path,
            StrokeMode::Idle => &[],
        }
    }

    /// Touch strokes own the gesture: the platform must not scroll or zoom.
    pub fn suppresses_default(&self) -> bool {
        matches!(self.mode, StrokeMode::Drawing { touch: true, .. })
    }

    /// Begin a new path. The raster is not touched.
    pub fn pointer_down(&mut self, point: Point, touch: bool) {
        let mut path = Vec::new();
        if point.is_finite() {
            path.push(point);
        }
        self.mode = StrokeMode::Drawing { path, touch };
    }

    /// Extend the path and paint the new segment immediately.
    /// Returns true when pixels were painted.
    pub fn pointer_move(&mut self, surface: &mut Surface, point: Point, color: Color) -> bool {
        let StrokeMode::Drawing { path, .. } = &mut self.mode else {
            return false;
        };
        if !point.is_finite() {
            return false;
        }
        let Some(&from) = path.last() else {
            // Empty sub-path: the first usable point only positions the pen.
            path.push(point);
            return false;
        };
        path.push(point);
        paint_segment(surface, from, point, color, self.width, &self.lut);
        true
    }

    /// End the stroke (pointer released or left the canvas).
    /// Returns how many points the finished path had.
    pub fn pointer_up(&mut self) -> usize {
        let count = self.path().len();
        self.mode = StrokeMode::Idle;
        count
    }
}

impl Default for StrokeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Shortest distance from (px,py) to the segment (x1,y1)-(x2,y2).
fn distance_to_segment(px: f32, py: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let len2 = dx * dx + dy * dy;
    if len2 <= f32::EPSILON {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }
    let t = (((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0);
    let qx = x1 + t * dx;
    let qy = y1 + t * dy;
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}

/// Stroke one capsule (segment + round caps) with 1 px anti-aliased edges.
pub fn paint_segment(
    surface: &mut Surface,
    from: Point,
    to: Point,
    color: Color,
    width: f32,
    lut: &GammaLut,
) {
    let half = width / 2.0;

    // Scan only the capsule's bounding box, clamped to the surface.
    let min_x = (from.x.min(to.x) - half - 1.0).floor().max(0.0) as usize;
    let min_y = (from.y.min(to.y) - half - 1.0).floor().max(0.0) as usize;
    let max_x = (from.x.max(to.x) + half + 1.0).ceil().min(surface.width as f32) as usize;
    let max_y = (from.y.max(to.y) + half + 1.0).ceil().min(surface.height as f32) as usize;

    for y in min_y..max_y {
        for x in min_x..max_x {
            // Sample at the pixel center.
            let d = distance_to_segment(x as f32 + 0.5, y as f32 + 0.5, from.x, from.y, to.x, to.y);
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
            if coverage <= 0.0 { continue; }
            let idx = y * surface.width + x;
            surface.pixels[idx] = lut.composite_over(surface.pixels[idx], color, coverage);
        }
    }
}
