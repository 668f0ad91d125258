// Gamma-correct "source over" blending through lookup tables.
// Visual: anti-aliased stroke edges and translucent background pixels mix
// with what is underneath without dark fringes.

use crate::types::{pack_argb, unpack_argb, Color};

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1) as f32
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255) via 4096-step quantization
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    /// Build both tables once; each owner keeps its own copy.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = (i as f32) / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Paint `src` over the packed pixel `dst` with the given coverage (0..1).
    /// Full coverage replaces the pixel exactly; zero coverage leaves it alone.
    pub fn composite_over(&self, dst: u32, src: Color, coverage: f32) -> u32 {
        if coverage.is_nan() || coverage <= 0.0 { return dst; }
        if coverage >= 1.0 { return src.to_argb(); }

        let (da, dr, dg, db) = unpack_argb(dst);
        let da = da as f32 / 255.0;
        let keep = da * (1.0 - coverage);        // how much of dst survives
        let out_a = coverage + keep;             // > 0 because coverage > 0

        let mix = |s: u8, d: u8| {
            let s_lin = self.srgb_u8_to_linear(s);
            let d_lin = self.srgb_u8_to_linear(d);
            self.linear_to_srgb_u8((s_lin * coverage + d_lin * keep) / out_a)
        };

        let a = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        pack_argb(a, mix(src.r, dr), mix(src.g, dg), mix(src.b, db))
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}
