//! Single-pixel writes: the depth/shade/bloom/fog funnel and the AA halo

use super::{PixelPipeline, Target};
use crate::buffers::{front_luma, FrameBuffers};
use crate::config::BLOOM_THRESHOLD;

/// Orthogonal neighbor offsets, written before the diagonals
const ORTHO: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Diagonal neighbor offsets
const DIAG: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Per-lane average of two packed pixels, rounding down
#[inline]
fn avg_packed(a: u32, b: u32) -> u32 {
    (a & b) + (((a ^ b) & 0xFEFE_FEFE) >> 1)
}

/// Average of two luma bytes, rounding down
#[inline]
fn avg_luma(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16) / 2) as u8
}

impl<'a> PixelPipeline<'a> {
    /// Write one fragment
    ///
    /// Order is fixed: depth test, shading write, bloom spill, fog
    /// overwrite. `color` is a packed front pixel; back-buffer writes take
    /// its luma byte. Coordinates must already be on screen.
    pub fn draw_pixel(&mut self, target: Target, x: usize, y: usize, color: u32) {
        if self.flags.depth_test {
            let di = FrameBuffers::depth_index(x, y);
            let stored = self.fb.depth[di];
            // Depth is a remapped distance: larger = nearer. A stored value
            // above the candidate means something nearer already owns the
            // pixel.
            if self.draw_depth < stored {
                return;
            }
            if self.flags.depth_write {
                self.fb.depth[di] = self.draw_depth;
            }
        }

        let idx = FrameBuffers::index(x, y);
        let luma = front_luma(color);

        if self.flags.shade {
            match target {
                Target::Back => self.fb.back[idx] = luma,
                Target::Front => self.fb.front[idx] = color,
            }
        }

        if self.flags.bloom && luma > BLOOM_THRESHOLD {
            // Linear remap of the over-threshold range onto full scale.
            let spill =
                ((luma - BLOOM_THRESHOLD) as u16 * 255 / (255 - BLOOM_THRESHOLD) as u16) as u8;
            self.fb.bloom[idx] = self.fb.bloom[idx].saturating_add(spill);
        }

        if self.flags.fog && self.fog_px != 0 {
            self.fb.front[idx] = self.fog_px;
        }
    }

    /// Write one fragment with a 3x3 averaged halo
    ///
    /// Skips all work when the pixel already holds `color`. The center is
    /// written first, then the four orthogonal neighbors, then the four
    /// diagonals, each as the average of its existing value and `color`.
    /// Neighbor writes force depth-write on so later interior fills do not
    /// punch through the halo. This is a box-filter approximation, not
    /// coverage AA; the write order is part of the visual contract.
    ///
    /// Coordinates must be clipped to the AA-safe interior
    /// ([`super::clamp_interior_x`] / [`super::clamp_interior_y`]).
    pub fn draw_pixel_aa(&mut self, target: Target, x: usize, y: usize, color: u32) {
        let idx = FrameBuffers::index(x, y);
        let unchanged = match target {
            Target::Back => self.fb.back[idx] == front_luma(color),
            Target::Front => self.fb.front[idx] == color,
        };
        if unchanged {
            return;
        }

        self.draw_pixel(target, x, y, color);

        let saved = self.flags;
        self.flags.depth_write = true;
        for (dx, dy) in ORTHO.iter().chain(DIAG.iter()) {
            let nx = (x as i32 + dx) as usize;
            let ny = (y as i32 + dy) as usize;
            let nidx = FrameBuffers::index(nx, ny);
            let blended = match target {
                Target::Back => {
                    let existing = self.fb.back[nidx];
                    avg_luma(existing, front_luma(color)) as u32 * 0x0001_0101
                        | (color & 0xFF00_0000)
                }
                Target::Front => avg_packed(self.fb.front[nidx], color),
            };
            self.draw_pixel(target, nx, ny, blended);
        }
        self.flags = saved;
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DrawFlags, Target};
    use super::*;
    use crate::buffers::pack_front;
    use crate::range::DynamicRange;

    fn setup() -> (FrameBuffers, DynamicRange) {
        (FrameBuffers::new(), DynamicRange::new())
    }

    #[test]
    fn test_depth_reject_iff_stored_nearer() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::OPAQUE);
        let c_far = pack_front(0xFF, 0x40);
        let c_near = pack_front(0xFF, 0x80);

        // Fresh frame: everything passes against DEPTH_CLEAR.
        pp.set_draw_depth(10);
        pp.draw_pixel(Target::Back, 5, 5, c_far);
        assert_eq!(pp.buffers().back[FrameBuffers::index(5, 5)], 0x40);

        // Farther fragment (smaller remapped depth) must be rejected.
        pp.set_draw_depth(3);
        pp.draw_pixel(Target::Back, 5, 5, c_near);
        assert_eq!(pp.buffers().back[FrameBuffers::index(5, 5)], 0x40);

        // Equal depth is "not farther" and passes.
        pp.set_draw_depth(10);
        pp.draw_pixel(Target::Back, 5, 5, c_near);
        assert_eq!(pp.buffers().back[FrameBuffers::index(5, 5)], 0x80);
    }

    #[test]
    fn test_depth_monotonic_within_frame() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::OPAQUE);
        let color = pack_front(0xFF, 0x20);
        let di = FrameBuffers::depth_index(8, 9);

        for d in [-100i8, -20, -20, 5, 3, 70, 60] {
            let before = pp.buffers().depth[di];
            pp.set_draw_depth(d);
            pp.draw_pixel(Target::Back, 8, 9, color);
            let after = pp.buffers().depth[di];
            assert!(after >= before, "depth went backwards: {} -> {}", before, after);
        }
    }

    #[test]
    fn test_depth_write_flag_off_keeps_stored() {
        let (mut fb, mut range) = setup();
        let mut flags = DrawFlags::OPAQUE;
        flags.depth_write = false;
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, flags);
        pp.set_draw_depth(50);
        pp.draw_pixel(Target::Back, 1, 1, pack_front(0xFF, 0x11));
        assert_eq!(
            pp.buffers().depth[FrameBuffers::depth_index(1, 1)],
            crate::buffers::DEPTH_CLEAR
        );
        // The write itself still happened.
        assert_eq!(pp.buffers().back[FrameBuffers::index(1, 1)], 0x11);
    }

    #[test]
    fn test_bloom_spill_above_threshold() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::OPAQUE);
        pp.set_draw_depth(0);

        pp.draw_pixel(Target::Back, 2, 2, pack_front(0xFF, BLOOM_THRESHOLD));
        assert_eq!(pp.buffers().bloom[FrameBuffers::index(2, 2)], 0);

        pp.draw_pixel(Target::Back, 3, 2, pack_front(0xFF, 0xFF));
        assert_eq!(pp.buffers().bloom[FrameBuffers::index(3, 2)], 255);
    }

    #[test]
    fn test_fog_overwrites_front_when_nonzero() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::FOGGED);
        pp.set_draw_depth(0);
        let fog = pack_front(0x60, 0xA0);
        pp.set_fog(fog);
        pp.draw_pixel(Target::Front, 4, 4, pack_front(0xFF, 0x10));
        assert_eq!(pp.buffers().front[FrameBuffers::index(4, 4)], fog);

        // Fog value 0 means no fog write even with the flag set.
        pp.set_fog(0);
        let solid = pack_front(0xFF, 0x10);
        pp.draw_pixel(Target::Front, 5, 4, solid);
        assert_eq!(pp.buffers().front[FrameBuffers::index(5, 4)], solid);
    }

    #[test]
    fn test_aa_skips_when_unchanged() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::OPAQUE);
        pp.set_draw_depth(0);
        let color = pack_front(0xFF, 0x80);
        pp.draw_pixel(Target::Front, 10, 10, color);
        let before_neighbor = pp.buffers().front[FrameBuffers::index(11, 10)];

        // Same color again: the halo must not be touched.
        pp.draw_pixel_aa(Target::Front, 10, 10, color);
        assert_eq!(pp.buffers().front[FrameBuffers::index(11, 10)], before_neighbor);
    }

    #[test]
    fn test_aa_halo_averages_neighbors() {
        let (mut fb, mut range) = setup();
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, DrawFlags::OPAQUE);
        pp.set_draw_depth(0);
        pp.draw_pixel_aa(Target::Back, 20, 20, pack_front(0xFF, 0x80));
        assert_eq!(pp.buffers().back[FrameBuffers::index(20, 20)], 0x80);
        // Neighbors average existing (0) with new (0x80).
        for (nx, ny) in [(19, 20), (21, 20), (20, 19), (20, 21), (19, 19), (21, 21)] {
            assert_eq!(pp.buffers().back[FrameBuffers::index(nx, ny)], 0x40);
        }
    }

    #[test]
    fn test_aa_neighbors_force_depth_write() {
        let (mut fb, mut range) = setup();
        let mut flags = DrawFlags::OPAQUE;
        flags.depth_write = false;
        let mut pp = super::super::PixelPipeline::new(&mut fb, &mut range, flags);
        pp.set_draw_depth(12);
        pp.draw_pixel_aa(Target::Back, 30, 30, pack_front(0xFF, 0x80));
        // Center honors the caller's depth_write=false...
        assert_eq!(
            pp.buffers().depth[FrameBuffers::depth_index(30, 30)],
            crate::buffers::DEPTH_CLEAR
        );
        // ...but the halo always records its depth.
        assert_eq!(pp.buffers().depth[FrameBuffers::depth_index(31, 30)], 12);
        // And the forced flag does not leak into later draws.
        assert!(!pp.flags().depth_write);
    }

    #[test]
    fn test_avg_packed_is_per_lane() {
        assert_eq!(avg_packed(0xFF00_FF00, 0x00FF_0000), 0x7F7F_7F00);
        assert_eq!(avg_packed(0x1010_1010, 0x1010_1010), 0x1010_1010);
    }
}
