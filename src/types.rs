// Core types shared by the canvas, the stroke renderer and the window.

use crate::error::Error;

/// Fixed resolution of the drawing surface (logical pixel space).
pub const LOGICAL_WIDTH: usize = 960;
pub const LOGICAL_HEIGHT: usize = 540;

/// Opaque white, the base layer under everything.
pub const OPAQUE_WHITE: u32 = 0xFF_FF_FF_FF;

/// Pack an ARGB quadruple into 0xAARRGGBB.
#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Split 0xAARRGGBB back into (a, r, g, b).
#[inline]
pub fn unpack_argb(px: u32) -> (u8, u8, u8, u8) {
    (
        ((px >> 24) & 0xFF) as u8,
        ((px >> 16) & 0xFF) as u8,
        ((px >> 8) & 0xFF) as u8,
        (px & 0xFF) as u8,
    )
}

/// A raster of packed pixels. minifb only reads the low 24 bits (0x00RRGGBB);
/// the top byte is alpha so the compositor can tell painted from untouched.
/// Visual: a freshly allocated surface is fully transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: usize,      // pixels per row
    pub height: usize,     // number of rows
    pub pixels: Vec<u32>,  // width * height entries, 0xAARRGGBB
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        for px in &mut self.pixels { *px = color; }
    }

    #[cfg(test)]
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height { return None; }
        Some(self.pixels[y * self.width + x])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: u32) {
        if x >= self.width || y >= self.height { return; }
        let idx = y * self.width + x;
        self.pixels[idx] = color;
    }

    /// True when every pixel has full alpha.
    #[cfg(test)]
    pub fn is_opaque(&self) -> bool {
        self.pixels.iter().all(|px| px >> 24 == 0xFF)
    }
}

/// A position in logical pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pen color. Always opaque; strokes get their softness from coverage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn parse_hex(text: &str) -> Result<Self, Error> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(format!("invalid color '{text}', expected #RRGGBB")));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| Error::Config(format!("invalid color '{text}': {e}")))
        };
        Ok(Self { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    #[inline]
    pub fn to_argb(self) -> u32 {
        pack_argb(0xFF, self.r, self.g, self.b)
    }
}

/// On-screen rectangle the canvas currently occupies, in display pixels.
/// Re-read every event; the window can be resized at any time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && y >= self.top && x < self.left + self.width && y < self.top + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(Color::parse_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(Color::parse_hex("00FF00").unwrap(), Color::rgb(0, 255, 0));
        assert_eq!(Color::rgb(1, 2, 255).to_hex(), "#0102FF");
    }

    #[test]
    fn bad_hex_colors_are_config_errors() {
        assert!(matches!(Color::parse_hex("#fff"), Err(Error::Config(_))));
        assert!(matches!(Color::parse_hex("#gg0000"), Err(Error::Config(_))));
    }

    #[test]
    fn argb_packing_round_trips() {
        let px = pack_argb(0x80, 1, 2, 3);
        assert_eq!(px, 0x80_01_02_03);
        assert_eq!(unpack_argb(px), (0x80, 1, 2, 3));
    }

    #[test]
    fn fresh_surface_is_transparent_until_filled() {
        let mut s = Surface::new(4, 3);
        assert!(!s.is_opaque());
        s.fill(OPAQUE_WHITE);
        assert!(s.is_opaque());
        assert_eq!(s.get(3, 2), Some(OPAQUE_WHITE));
        assert_eq!(s.get(4, 0), None);
    }
}
