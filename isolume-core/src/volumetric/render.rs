//! Radial-grid effect rendering
//!
//! Walks the cached circular footprint row by row, evaluates the field
//! per cell, and turns positive distances into shaded voxel columns via
//! the pixel pipeline. The traversal strategy is fixed by the field type;
//! the match below folds away during monomorphization.

use super::field::{DistanceField, Traversal};
use super::instance::RadialInstance;
use super::rows::RowCache;
use crate::raster::{clamp_interior_x, clamp_interior_y, PixelPipeline, Target};
use crate::world::{Projection, Shader, VoxelLookup};

/// Column height of a fully-inside cell, in pixels
const HEIGHT_PX: f32 = 24.0;

/// Render one effect instance
///
/// Dead or radius-less instances are a no-op, not an error. A screen-space
/// bounding-circle test rejects fully off-screen instances before any
/// per-row work. When the instance's radius changed since the last pass,
/// the shared row table is regenerated first.
pub fn render_effect<F, V, S>(
    pp: &mut PixelPipeline<'_>,
    cache: &mut RowCache,
    inst: &mut RadialInstance,
    field: &F,
    world: &V,
    shader: &S,
    proj: &Projection,
) where
    F: DistanceField,
    V: VoxelLookup,
    S: Shader,
{
    if inst.is_dead() || inst.radius() == 0 {
        return;
    }

    let center = proj.cell_to_screen(inst.origin.0, inst.origin.1);
    let radius_px = inst.radius() as i16 * (proj.cell_w + proj.cell_h);
    if !proj.circle_on_screen(center, radius_px) {
        return;
    }

    if inst.rows_stale() {
        cache.invalidate();
        inst.mark_rows_fresh();
    }
    cache.ensure(inst.radius());

    let t = inst.t_norm();
    let inv_r = inst.inv_radius();

    // The strategy is an associated const: exactly one arm survives per
    // field type.
    match F::TRAVERSAL {
        Traversal::Brute => {
            for row in cache.rows_mut() {
                let width = -row.dx_start;
                for dx in row.dx_start..=width {
                    let _ = draw_cell(pp, inst, field, world, shader, proj, t, inv_r, dx, row.dy);
                }
            }
        }
        Traversal::CullExpanding => {
            for row in cache.rows_mut() {
                let width = -row.dx_start;
                // Right half, center outward.
                for dx in 0..=width {
                    if !draw_cell(pp, inst, field, world, shader, proj, t, inv_r, dx, row.dy) {
                        break;
                    }
                }
                // Left half, center outward.
                for dx in 1..=width {
                    if !draw_cell(pp, inst, field, world, shader, proj, t, inv_r, -dx, row.dy) {
                        break;
                    }
                }
            }
        }
        Traversal::CullInnerCircleGrowing => {
            for row in cache.rows_mut() {
                let width = -row.dx_start;
                for dx in row.dx_start..=width {
                    // The cached interval is settled: the wavefront has
                    // fully passed it and nothing there changes anymore.
                    if dx >= row.left && dx <= row.right {
                        continue;
                    }
                    let _ = draw_cell(pp, inst, field, world, shader, proj, t, inv_r, dx, row.dy);
                    if field.expired(dx as f32 * inv_r, row.dy as f32 * inv_r, t) {
                        if row.left > row.right {
                            row.left = dx;
                            row.right = dx;
                        } else if dx == row.left - 1 {
                            row.left = dx;
                        } else if dx == row.right + 1 {
                            row.right = dx;
                        }
                    }
                }
            }
        }
    }
}

/// Evaluate and draw one cell; returns whether it was inside the volume
#[allow(clippy::too_many_arguments)]
fn draw_cell<F, V, S>(
    pp: &mut PixelPipeline<'_>,
    inst: &RadialInstance,
    field: &F,
    world: &V,
    shader: &S,
    proj: &Projection,
    t: f32,
    inv_r: f32,
    dx: i16,
    dy: i8,
) -> bool
where
    F: DistanceField,
    V: VoxelLookup,
    S: Shader,
{
    let dxn = dx as f32 * inv_r;
    let dyn_ = dy as f32 * inv_r;
    let d = field.eval(dxn, dyn_, t);
    if d <= 0.0 {
        return false;
    }

    let gx = inst.origin.0 + dx;
    let gy = inst.origin.1 + dy as i16;
    let vox = world.voxel(gx, gy);
    if !vox.visible {
        // Inside the volume, but the world contributes nothing here.
        return true;
    }

    let mut height = (d * HEIGHT_PX) as i32;
    height += vox.height_step as i32 * proj.step_px as i32;
    if height <= 0 {
        return true;
    }

    let (sx, sy) = proj.cell_to_screen(gx, gy);
    let x = clamp_interior_x(sx as i32);
    let base = clamp_interior_y(sy as i32);
    let top = clamp_interior_y(sy as i32 - height);

    pp.set_draw_depth(proj.depth_of(gx, gy));
    let color = shader.shade(
        [gx as f32, gy as f32, d],
        [dxn, dyn_, 1.0 - d],
        vox.kind,
    );
    pp.fill_v(Target::Front, x, top.min(base), base.max(top), color);
    true
}
