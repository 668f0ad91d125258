// Owns the drawing surface and the optional generated background.
// Layers on every full redraw, bottom to top:
//   1) opaque white over the whole canvas
//   2) the background image, stretched to the canvas size
// Strokes are never replayed: a redraw wipes them.

use std::borrow::Cow;
use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use tracing::debug;

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::types::{unpack_argb, Color, Surface, OPAQUE_WHITE};

pub struct CanvasCompositor {
    surface: Surface,
    background: Option<RgbaImage>,
    lut: GammaLut,
}

impl CanvasCompositor {
    /// Allocate the surface. It stays transparent until `initialize()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self { surface: Surface::new(width, height), background: None, lut: GammaLut::new() }
    }

    /// White fill only, once at creation.
    /// Visual: blank white paper.
    pub fn initialize(&mut self) {
        self.surface.fill(OPAQUE_WHITE);
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Mutable access for the stroke renderer.
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    #[cfg(test)]
    pub fn background(&self) -> Option<&RgbaImage> {
        self.background.as_ref()
    }

    /// Replace the background and redraw from scratch.
    /// Visual: the generated picture fills the canvas; earlier pen marks vanish.
    pub fn set_background(&mut self, image: RgbaImage) {
        debug!(width = image.width(), height = image.height(), "replacing canvas background");
        self.background = Some(image);
        self.redraw();
    }

    /// Drop the background and go back to plain white.
    pub fn clear(&mut self) {
        self.background = None;
        self.redraw();
    }

    fn redraw(&mut self) {
        let Self { surface, background, lut } = self;
        surface.fill(OPAQUE_WHITE);

        let Some(bg) = &*background else {
            return;
        };
        let (w, h) = (surface.width as u32, surface.height as u32);
        let scaled: Cow<'_, RgbaImage> = if bg.dimensions() == (w, h) {
            Cow::Borrowed(bg)
        } else {
            Cow::Owned(imageops::resize(bg, w, h, FilterType::Triangle))
        };

        for (x, y, px) in scaled.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let idx = y as usize * surface.width + x as usize;
            surface.pixels[idx] =
                lut.composite_over(surface.pixels[idx], Color::rgb(r, g, b), a as f32 / 255.0);
        }
    }

    /// Current visible content laid over a fresh white layer, without alpha.
    /// The live surface is only read.
    pub fn flatten_rgb(&self) -> RgbImage {
        let (w, h) = (self.surface.width as u32, self.surface.height as u32);
        let mut out = RgbImage::new(w, h);
        for (x, y, px) in out.enumerate_pixels_mut() {
            let src = self.surface.pixels[y as usize * self.surface.width + x as usize];
            let (a, r, g, b) = unpack_argb(src);
            let mixed = self.lut.composite_over(OPAQUE_WHITE, Color::rgb(r, g, b), a as f32 / 255.0);
            let (_, r, g, b) = unpack_argb(mixed);
            px.0 = [r, g, b];
        }
        out
    }

    /// PNG bytes of the visible canvas, ready to send.
    pub fn flatten(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(self.flatten_rgb())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::Encode(format!("flatten canvas: {e}")))?;
        Ok(bytes)
    }
}

/// Decode image bytes from the service into an RGBA bitmap.
pub fn decode_background(bytes: &[u8]) -> Result<RgbaImage, Error> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::Decode(format!("generated image ({} bytes): {e}", bytes.len())))?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeRenderer;
    use crate::types::{pack_argb, Point};
    use image::Rgba;

    const W: usize = 48;
    const H: usize = 27;

    fn scribble(canvas: &mut CanvasCompositor) {
        let mut pen = StrokeRenderer::new();
        pen.pointer_down(Point::new(2.0, 2.0), false);
        pen.pointer_move(canvas.surface_mut(), Point::new(40.0, 20.0), Color::rgb(0, 0, 200));
        pen.pointer_up();
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 5) as u8, (y * 9) as u8, 77, 255]))
    }

    #[test]
    fn initialize_paints_opaque_white() {
        let mut canvas = CanvasCompositor::new(W, H);
        assert!(!canvas.surface().is_opaque());
        canvas.initialize();
        assert!(canvas.surface().pixels.iter().all(|&px| px == OPAQUE_WHITE));
    }

    #[test]
    fn clearing_twice_matches_clearing_once() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        canvas.set_background(gradient(W as u32, H as u32));
        scribble(&mut canvas);

        canvas.clear();
        let once = canvas.surface().clone();
        canvas.clear();
        assert_eq!(canvas.surface(), &once);
        assert!(once.pixels.iter().all(|&px| px == OPAQUE_WHITE));
        assert!(canvas.background().is_none());
    }

    #[test]
    fn new_background_replaces_strokes_exactly() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        scribble(&mut canvas);
        assert!(canvas.surface().pixels.iter().any(|&px| px != OPAQUE_WHITE));

        let bg = gradient(W as u32, H as u32);
        canvas.set_background(bg.clone());
        for (x, y, px) in bg.enumerate_pixels() {
            let [r, g, b, _] = px.0;
            assert_eq!(canvas.surface().get(x as usize, y as usize), Some(pack_argb(255, r, g, b)));
        }
    }

    #[test]
    fn background_is_scaled_to_fill_the_canvas() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        let small = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 30, 255]));
        canvas.set_background(small);
        assert!(canvas.surface().pixels.iter().all(|&px| px == pack_argb(255, 10, 200, 30)));
    }

    #[test]
    fn transparent_background_pixels_show_white() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        canvas.set_background(RgbaImage::from_pixel(W as u32, H as u32, Rgba([0, 0, 0, 0])));
        assert!(canvas.surface().pixels.iter().all(|&px| px == OPAQUE_WHITE));
    }

    #[test]
    fn flatten_of_uninitialized_surface_is_opaque_white() {
        let canvas = CanvasCompositor::new(W, H);
        let png = canvas.flatten().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert!(!decoded.color().has_alpha());
        assert!(decoded.to_rgb8().pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn flatten_of_cleared_surface_is_opaque_white() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.clear();
        let rgb = canvas.flatten_rgb();
        assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn flatten_keeps_strokes_and_does_not_touch_the_surface() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        scribble(&mut canvas);
        let before = canvas.surface().clone();

        let png = canvas.flatten().unwrap();
        assert_eq!(canvas.surface(), &before);

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (W as u32, H as u32));
        let (_, r, g, b) = unpack_argb(before.get(20, 10).unwrap());
        assert_eq!(decoded.get_pixel(20, 10).0, [r, g, b]);
    }

    #[test]
    fn corrupt_bytes_are_a_decode_error() {
        assert!(matches!(decode_background(b"definitely not a png"), Err(Error::Decode(_))));
    }

    #[test]
    fn flattened_png_decodes_back_as_background() {
        let mut canvas = CanvasCompositor::new(W, H);
        canvas.initialize();
        scribble(&mut canvas);
        let bg = decode_background(&canvas.flatten().unwrap()).unwrap();
        assert_eq!(bg.dimensions(), (W as u32, H as u32));
    }
}
