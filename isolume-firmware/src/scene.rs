//! Demo scene
//!
//! A small isometric diorama exercising the whole pipeline: terrain
//! strips, a building block with ambient-occluded edges, skyline lines,
//! and the two volumetric effect kinds on alternating timers. The real
//! voxel world and its generation live outside this firmware; this module
//! doubles as the reference implementation of the collaborator traits.

use isolume_core::buffers::{pack_front, FrameBuffers};
use isolume_core::range::DynamicRange;
use isolume_core::raster::{
    clamp_interior_x, clamp_interior_y, clip_line, ClipRect, DrawFlags, OcclusionMask,
    PixelPipeline, Target,
};
use isolume_core::volumetric::{
    render_effect, ExplosionField, RadialInstance, RowCache, ShockwaveField,
};
use isolume_core::world::{Projection, Shader, Voxel, VoxelLookup};

/// Pre-baked edge-darkening profile for building columns; the mirrored
/// right-edge variant is the second column.
static EDGE_AO: [u8; 16] = [
    96, 255, 112, 255, 128, 255, 144, 255, 160, 255, 176, 255, 192, 255, 208, 255,
];

/// Deterministic height field standing in for the voxel world
struct DemoWorld;

impl VoxelLookup for DemoWorld {
    fn voxel(&self, gx: i16, gy: i16) -> Voxel {
        if !(0..48).contains(&gx) || !(0..48).contains(&gy) {
            return Voxel::EMPTY;
        }
        // Cheap ridged pattern: enough variation to light the depth and
        // fog ranges without real terrain generation.
        let h = ((gx * 3 + gy * 5) % 7 - 3) as i8;
        Voxel {
            visible: true,
            kind: ((gx ^ gy) & 0x03) as u8,
            height_step: h,
            occlusion: 0,
        }
    }
}

/// Material-tinted lambert-ish shading
struct DemoShader;

impl Shader for DemoShader {
    fn shade(&self, _world: [f32; 3], normal: [f32; 3], material: u8) -> u32 {
        let up = normal[2].clamp(0.0, 1.0);
        let luma = 96.0 + up * 120.0 + material as f32 * 8.0;
        pack_front(0xE0, luma as u8)
    }
}

/// Scene state advanced once per accepted frame
pub struct Scene {
    world: DemoWorld,
    shader: DemoShader,
    proj: Projection,
    explosion: RadialInstance,
    explosion_rows: RowCache,
    shockwave: RadialInstance,
    shockwave_rows: RowCache,
    respawns: u32,
    azimuth_mdeg: i32,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: DemoWorld,
            shader: DemoShader,
            proj: Projection {
                origin_px: (128, 6),
                cell_w: 3,
                cell_h: 1,
                step_px: 2,
            },
            explosion: RadialInstance::new((20, 22), 9, 1400),
            explosion_rows: RowCache::new(),
            shockwave: RadialInstance::new((30, 14), 14, 2200),
            shockwave_rows: RowCache::new(),
            respawns: 0,
            azimuth_mdeg: 0,
        }
    }

    /// Advance simulation state by one frame interval
    pub fn update(&mut self, dt_ms: u32) {
        self.explosion.advance(dt_ms);
        self.shockwave.advance(dt_ms);
        self.azimuth_mdeg = (self.azimuth_mdeg + 150) % 360_000;

        // Dead effects respawn with a new footprint; the row caches
        // regenerate lazily on the next render pass.
        if self.explosion.is_dead() {
            self.respawns += 1;
            let r = 6 + (self.respawns % 5) as u16;
            self.explosion = RadialInstance::new((20, 22), r, 1400);
        }
        if self.shockwave.is_dead() {
            let r = 12 + (self.respawns % 3) as u16 * 2;
            self.shockwave = RadialInstance::new((30, 14), r, 2200);
        }
    }

    /// Draw one frame into the software buffers
    pub fn draw(&mut self, fb: &mut FrameBuffers, range: &mut DynamicRange) {
        range.set_view(self.azimuth_mdeg as f32 * 1.745e-5, 0.6);

        let mut pp = PixelPipeline::new(fb, range, DrawFlags::OPAQUE);

        self.draw_terrain(&mut pp);
        self.draw_tower(&mut pp);
        self.draw_skyline(&mut pp);

        pp.set_flags(DrawFlags::FOGGED);
        pp.set_fog(0);
        render_effect(
            &mut pp,
            &mut self.explosion_rows,
            &mut self.explosion,
            &ExplosionField,
            &self.world,
            &self.shader,
            &self.proj,
        );
        render_effect(
            &mut pp,
            &mut self.shockwave_rows,
            &mut self.shockwave,
            &ShockwaveField { thickness: 0.22 },
            &self.world,
            &self.shader,
            &self.proj,
        );
    }

    /// Ground strips, far to near
    fn draw_terrain(&mut self, pp: &mut PixelPipeline<'_>) {
        for gy in (0..40i16).step_by(2) {
            let (x0, y) = self.proj.cell_to_screen(0, gy);
            let (x1, _) = self.proj.cell_to_screen(40, gy);
            let Some((cx0, cy, cx1, _)) =
                clip_line(x0 as i32, y as i32, x1 as i32, y as i32, ClipRect::AA_SAFE)
            else {
                continue;
            };
            pp.set_draw_depth(self.proj.depth_of(20, gy));
            let luma = 40 + (gy as u8) * 2;
            pp.fill_h(
                Target::Back,
                cx0.min(cx1) as usize,
                cx0.max(cx1) as usize,
                cy as usize,
                pack_front(0xFF, luma),
            );
        }
    }

    /// One building block with ambient-occluded vertical edges
    fn draw_tower(&mut self, pp: &mut PixelPipeline<'_>) {
        let base = self.proj.cell_to_screen(26, 26);
        let mask = OcclusionMask {
            data: &EDGE_AO,
            stride: 2,
        };
        pp.set_draw_depth(self.proj.depth_of(26, 26));
        for (i, col) in (0..10usize).zip([0usize, 1].into_iter().cycle()) {
            let x = clamp_interior_x(base.0 as i32 + i as i32);
            let y1 = clamp_interior_y(base.1 as i32);
            // Run length matches the mask's 8 rows.
            let y0 = clamp_interior_y(base.1 as i32 - 7);
            pp.fill_v_masked(x, y0, y1, pack_front(0xFF, 0xD8), &mask, col, 0);
        }
    }

    /// Bright ridge lines that feed the bloom plane
    fn draw_skyline(&mut self, pp: &mut PixelPipeline<'_>) {
        let spans = [((2i16, 8i16), (14i16, 8i16)), ((14, 8), (26, 2)), ((26, 2), (38, 10))];
        for (a, b) in spans {
            let (ax, ay) = self.proj.cell_to_screen(a.0, a.1);
            let (bx, by) = self.proj.cell_to_screen(b.0, b.1);
            let Some((x0, y0, x1, y1)) =
                clip_line(ax as i32, ay as i32, bx as i32, by as i32, ClipRect::AA_SAFE)
            else {
                continue;
            };
            pp.set_draw_depth(self.proj.depth_of(a.0, a.1));
            pp.draw_line(Target::Back, x0, y0, x1, y1, pack_front(0xFF, 0xF4));
        }
    }
}
