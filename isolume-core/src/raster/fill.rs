//! Run fills: horizontal/vertical spans and the ambient-occlusion variant
//!
//! Runs antialias only their endpoints; interiors take the plain write.
//! That keeps long terrain edges cheap while still softening the corners
//! where runs meet.

use super::{PixelPipeline, Target};
use crate::buffers::{front_alpha, front_luma, pack_front};

/// Small ambient-occlusion bitmap sampled by the masked fill
///
/// Stored row-major with an explicit stride so one atlas can hold several
/// column profiles side by side. Mirrored variants are pre-baked into the
/// data rather than flipped at draw time.
#[derive(Debug, Clone, Copy)]
pub struct OcclusionMask<'m> {
    /// Alpha multipliers, 255 = fully lit
    pub data: &'m [u8],
    /// Bytes per bitmap row
    pub stride: usize,
}

impl<'m> OcclusionMask<'m> {
    /// Sample the mask at `(col, row)`
    #[inline]
    pub fn sample(&self, col: usize, row: usize) -> u8 {
        self.data[row * self.stride + col]
    }
}

impl<'a> PixelPipeline<'a> {
    /// Fill the horizontal run `[x0, x1]` at `y`
    ///
    /// Endpoints get the AA halo, the interior the plain write. Coordinates
    /// must be pre-clipped to the AA-safe interior; `x0 <= x1`.
    pub fn fill_h(&mut self, target: Target, x0: usize, x1: usize, y: usize, color: u32) {
        self.draw_pixel_aa(target, x0, y, color);
        if x1 == x0 {
            return;
        }
        for x in (x0 + 1)..x1 {
            self.draw_pixel(target, x, y, color);
        }
        self.draw_pixel_aa(target, x1, y, color);
    }

    /// Fill the vertical run `[y0, y1]` at `x`
    ///
    /// Same endpoint-AA contract as [`PixelPipeline::fill_h`]; `y0 <= y1`.
    /// The depth plane is transposed, so the interior loop walks
    /// consecutive depth slots.
    pub fn fill_v(&mut self, target: Target, x: usize, y0: usize, y1: usize, color: u32) {
        self.draw_pixel_aa(target, x, y0, color);
        if y1 == y0 {
            return;
        }
        for y in (y0 + 1)..y1 {
            self.draw_pixel(target, x, y, color);
        }
        self.draw_pixel_aa(target, x, y1, color);
    }

    /// Vertical fill with per-pixel ambient occlusion
    ///
    /// Each pixel's alpha is scaled by the mask sample at
    /// `(mask_col, v_offset + row-within-run)`. Always writes the front
    /// plane (occlusion modulates alpha, which the back plane lacks).
    pub fn fill_v_masked(
        &mut self,
        x: usize,
        y0: usize,
        y1: usize,
        color: u32,
        mask: &OcclusionMask<'_>,
        mask_col: usize,
        v_offset: usize,
    ) {
        let base_alpha = front_alpha(color) as u16;
        let luma = front_luma(color);
        for (i, y) in (y0..=y1).enumerate() {
            let m = mask.sample(mask_col, v_offset + i) as u16;
            let a = (base_alpha * m / 255) as u8;
            self.draw_pixel(Target::Front, x, y, pack_front(a, luma));
        }
    }
}
