//! Signed-distance fields for the radial effects
//!
//! A field maps a normalized cell offset and the instance's lifetime
//! progress to a signed distance: positive inside the volume, zero or
//! negative outside. Each field also fixes, at compile time, which row
//! traversal is sound for its shape.

use micromath::F32Ext;

/// Row traversal strategy, chosen per field type at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Traversal {
    /// Evaluate every cell of every row
    Brute,
    /// March outward from the row center, stop each side at the first
    /// outside cell; sound only for star-convex volumes
    CullExpanding,
    /// Skip the per-row interval already rendered in earlier frames;
    /// sound for volumes that grow outward around a static interior
    CullInnerCircleGrowing,
}

/// Signed-distance evaluation for one effect shape
pub trait DistanceField {
    /// Traversal the renderer may use for this shape
    const TRAVERSAL: Traversal;

    /// Signed distance at normalized offset `(dx, dy)` (cell offset times
    /// the instance's reciprocal radius) and lifetime progress `t`
    fn eval(&self, dx: f32, dy: f32, t: f32) -> f32;

    /// Whether the volume has permanently passed this cell
    ///
    /// Growing fields report the settled interior here; the renderer's
    /// interval cache skips settled cells on later frames. Fields without
    /// a settled region never expire anything.
    fn expired(&self, dx: f32, dy: f32, t: f32) -> bool {
        let _ = (dx, dy, t);
        false
    }
}

/// Expanding solid sphere: a fireball filling its footprint over the
/// instance lifetime
#[derive(Debug, Clone, Copy)]
pub struct ExplosionField;

impl DistanceField for ExplosionField {
    const TRAVERSAL: Traversal = Traversal::CullExpanding;

    fn eval(&self, dx: f32, dy: f32, t: f32) -> f32 {
        t - (dx * dx + dy * dy).sqrt()
    }
}

/// Outward-growing annulus: a shockwave ring of fixed thickness
#[derive(Debug, Clone, Copy)]
pub struct ShockwaveField {
    /// Ring thickness as a fraction of the radius
    pub thickness: f32,
}

impl DistanceField for ShockwaveField {
    const TRAVERSAL: Traversal = Traversal::CullInnerCircleGrowing;

    fn eval(&self, dx: f32, dy: f32, t: f32) -> f32 {
        let r = (dx * dx + dy * dy).sqrt();
        // Positive inside the band [t - thickness, t]; the interior the
        // wavefront has passed stays covered by the rendered interval.
        if r > t {
            t - r
        } else {
            self.thickness - (t - r)
        }
    }

    fn expired(&self, dx: f32, dy: f32, t: f32) -> bool {
        let r = (dx * dx + dy * dy).sqrt();
        r < t - self.thickness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explosion_grows_with_time() {
        let f = ExplosionField;
        // At t=0 only the exact center is inside.
        assert!(f.eval(0.0, 0.0, 0.0) >= 0.0);
        assert!(f.eval(0.3, 0.0, 0.0) < 0.0);
        // By t=0.5 the half-radius shell is inside.
        assert!(f.eval(0.3, 0.0, 0.5) > 0.0);
        assert!(f.eval(0.0, 0.7, 0.5) < 0.0);
        // Fully grown covers the footprint.
        assert!(f.eval(0.7, 0.7, 1.0) > 0.0);
    }

    #[test]
    fn test_explosion_is_star_convex() {
        // Along any ray from the center, inside cells precede outside
        // cells: the precondition for CullExpanding.
        let f = ExplosionField;
        let t = 0.6;
        let mut seen_outside = false;
        for i in 0..20 {
            let r = i as f32 * 0.05;
            let inside = f.eval(r, 0.0, t) > 0.0;
            if seen_outside {
                assert!(!inside, "inside cell after outside cell at r={}", r);
            }
            if !inside {
                seen_outside = true;
            }
        }
    }

    #[test]
    fn test_shockwave_band() {
        let f = ShockwaveField { thickness: 0.2 };
        let t = 0.6;
        // Ahead of the wavefront: outside.
        assert!(f.eval(0.8, 0.0, t) < 0.0);
        // On the wavefront: inside.
        assert!(f.eval(0.55, 0.0, t) > 0.0);
        // Far behind the wavefront: outside the band.
        assert!(f.eval(0.1, 0.0, t) < 0.0);
    }

    #[test]
    fn test_traversal_selection() {
        assert_eq!(ExplosionField::TRAVERSAL, Traversal::CullExpanding);
        assert_eq!(
            ShockwaveField::TRAVERSAL,
            Traversal::CullInnerCircleGrowing
        );
    }
}
