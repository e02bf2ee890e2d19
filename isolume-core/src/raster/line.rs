//! Line scan conversion and parametric clipping

use super::{PixelPipeline, Target};
use crate::buffers::{front_alpha, front_luma, pack_front};
use crate::config::{PANEL_H, PANEL_W};

/// Inclusive clip rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClipRect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl ClipRect {
    /// Full screen
    pub const SCREEN: Self = Self {
        x_min: 0,
        y_min: 0,
        x_max: PANEL_W as i32 - 1,
        y_max: PANEL_H as i32 - 1,
    };

    /// Screen inset by one pixel, safe for AA halos and diagonal neighbors
    pub const AA_SAFE: Self = Self {
        x_min: 1,
        y_min: 1,
        x_max: PANEL_W as i32 - 2,
        y_max: PANEL_H as i32 - 2,
    };
}

/// Liang-Barsky parametric clip of a segment against `rect`
///
/// Returns the clipped endpoints, or `None` when the segment lies fully
/// outside. Degenerate (point) segments inside the rect are returned as is.
pub fn clip_line(
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    rect: ClipRect,
) -> Option<(i32, i32, i32, i32)> {
    let dx = (x1 - x0) as f32;
    let dy = (y1 - y0) as f32;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    let edges = [
        (-dx, (x0 - rect.x_min) as f32),
        (dx, (rect.x_max - x0) as f32),
        (-dy, (y0 - rect.y_min) as f32),
        (dy, (rect.y_max - y0) as f32),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    let cx0 = x0 + (t0 * dx + 0.5) as i32;
    let cy0 = y0 + (t0 * dy + 0.5) as i32;
    let cx1 = x0 + (t1 * dx + 0.5) as i32;
    let cy1 = y0 + (t1 * dy + 0.5) as i32;
    Some((cx0, cy0, cx1, cy1))
}

/// Scale a packed pixel's intensity by `s`/255 (luma and alpha lanes)
#[inline]
fn scale_px(color: u32, s: u8) -> u32 {
    let l = (front_luma(color) as u16 * s as u16 / 255) as u8;
    let a = (front_alpha(color) as u16 * s as u16 / 255) as u8;
    pack_front(a, l)
}

impl<'a> PixelPipeline<'a> {
    /// Draw a single-pixel-wide antialiased line
    ///
    /// Weighted Bresenham: a 16-bit fixed-point error accumulator advances
    /// the minor axis on overflow, and its top 8 bits at each step split
    /// intensity between the pixel and its diagonal neighbor. No floating
    /// point in the inner loop. Endpoints must be pre-clipped to
    /// [`ClipRect::AA_SAFE`].
    pub fn draw_line(&mut self, target: Target, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();

        // Axis-aligned runs get the cheaper endpoint-AA fill.
        if dy == 0 {
            self.fill_h(target, x0.min(x1) as usize, x0.max(x1) as usize, y0 as usize, color);
            return;
        }
        if dx == 0 {
            self.fill_v(target, x0 as usize, y0.min(y1) as usize, y0.max(y1) as usize, color);
            return;
        }

        let sx = if x1 > x0 { 1i32 } else { -1 };
        let sy = if y1 > y0 { 1i32 } else { -1 };

        // Perfect diagonals accumulate no error; the fraction below would
        // not fit 16 bits, so step both axes directly.
        if dx == dy {
            let mut x = x0;
            let mut y = y0;
            for _ in 0..=dx {
                self.draw_pixel(target, x as usize, y as usize, color);
                x += sx;
                y += sy;
            }
            return;
        }

        if dx > dy {
            // X-major: fraction of a minor step per major step.
            let k = (((dy as u32) << 16) / (dx as u32)) as u16;
            let mut err: u16 = 0;
            let mut x = x0;
            let mut y = y0;
            for _ in 0..=dx {
                let w = (err >> 8) as u8;
                self.draw_pixel(target, x as usize, y as usize, scale_px(color, 255 - w));
                if w > 0 {
                    self.draw_pixel(target, x as usize, (y + sy) as usize, scale_px(color, w));
                }
                let (next, carry) = err.overflowing_add(k);
                err = next;
                if carry {
                    y += sy;
                }
                x += sx;
            }
        } else {
            let k = (((dx as u32) << 16) / (dy as u32)) as u16;
            let mut err: u16 = 0;
            let mut x = x0;
            let mut y = y0;
            for _ in 0..=dy {
                let w = (err >> 8) as u8;
                self.draw_pixel(target, x as usize, y as usize, scale_px(color, 255 - w));
                if w > 0 {
                    self.draw_pixel(target, (x + sx) as usize, y as usize, scale_px(color, w));
                }
                let (next, carry) = err.overflowing_add(k);
                err = next;
                if carry {
                    x += sx;
                }
                y += sy;
            }
        }
    }
}
