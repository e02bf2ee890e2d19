//! Per-frame depth/fog dynamic range
//!
//! The scene's depth spread and fog density spread change from frame to
//! frame as the camera moves. Shading wants both normalized, so this model
//! accumulates the raw extremes during a render pass and commits them to
//! scale factors at a fixed point in the frame - scheduled by the frame
//! loop to overlap an in-flight hardware op, hiding the cost.

use micromath::F32Ext;

/// Degenerate filler the depth accumulator resets to
const DEPTH_FILLER: (i8, i8) = (i8::MAX, i8::MIN);

/// Degenerate filler the fog accumulator resets to
const FOG_FILLER: (u8, u8) = (u8::MAX, u8::MIN);

/// Running and committed dynamic range of depth and fog values
#[derive(Debug, Clone)]
pub struct DynamicRange {
    /// Running depth extremes for the frame being rendered
    depth_acc: (i8, i8),
    /// Running fog-alpha extremes for the frame being rendered
    fog_acc: (u8, u8),
    /// Committed reciprocal of the depth magnitude
    inv_depth: f32,
    /// Committed fog window base
    fog_base: u8,
    /// Committed reciprocal of the fog window span
    inv_fog_span: f32,
    /// Depth range the committed scales were derived from
    committed_depth: (i8, i8),
    /// View direction for the eye vector, radians
    azimuth: f32,
    elevation: f32,
    /// Eye-point vector used by volumetric fog shading
    eye: [f32; 3],
    /// Eye vector must be recomputed on the next commit
    eye_stale: bool,
}

impl DynamicRange {
    /// Full-scale defaults: usable before the first commit without a
    /// division by zero
    pub fn new() -> Self {
        Self {
            depth_acc: DEPTH_FILLER,
            fog_acc: FOG_FILLER,
            inv_depth: 1.0 / i8::MAX as f32,
            fog_base: 0,
            inv_fog_span: 1.0 / u8::MAX as f32,
            committed_depth: (i8::MIN, i8::MAX),
            azimuth: 0.0,
            elevation: 0.0,
            eye: [0.0, 1.0, 0.0],
            eye_stale: true,
        }
    }

    /// Feed one selected draw depth into the running range
    #[inline]
    pub fn record_depth(&mut self, depth: i8) {
        if depth < self.depth_acc.0 {
            self.depth_acc.0 = depth;
        }
        if depth > self.depth_acc.1 {
            self.depth_acc.1 = depth;
        }
    }

    /// Feed one fog alpha produced by the lighting shader
    #[inline]
    pub fn record_fog(&mut self, alpha: u8) {
        if alpha < self.fog_acc.0 {
            self.fog_acc.0 = alpha;
        }
        if alpha > self.fog_acc.1 {
            self.fog_acc.1 = alpha;
        }
    }

    /// Set the view direction the eye vector derives from (radians)
    pub fn set_view(&mut self, azimuth: f32, elevation: f32) {
        if azimuth != self.azimuth || elevation != self.elevation {
            self.azimuth = azimuth;
            self.elevation = elevation;
            self.eye_stale = true;
        }
    }

    /// Commit the accumulated ranges and reset the accumulators
    ///
    /// An empty accumulator (nothing drawn this frame) keeps the previous
    /// committed scales. The eye vector is recomputed only when the depth
    /// range actually changed; on a static frame the trig is skipped.
    pub fn commit(&mut self) {
        let (dmin, dmax) = self.depth_acc;
        if dmin <= dmax {
            let magnitude = (dmin as i16).abs().max((dmax as i16).abs());
            if magnitude > 0 {
                self.inv_depth = 1.0 / magnitude as f32;
            }
            if (dmin, dmax) != self.committed_depth {
                self.committed_depth = (dmin, dmax);
                self.eye_stale = true;
            }
        }
        self.depth_acc = DEPTH_FILLER;

        let (fmin, fmax) = self.fog_acc;
        if fmin < fmax {
            self.fog_base = fmin;
            self.inv_fog_span = 1.0 / (fmax - fmin) as f32;
        }
        self.fog_acc = FOG_FILLER;

        if self.eye_stale {
            self.recompute_eye();
            self.eye_stale = false;
        }
    }

    /// Normalized distance of a depth value, in [-1, 1]
    #[inline]
    pub fn distance(&self, depth: i8) -> f32 {
        depth as f32 * self.inv_depth
    }

    /// Normalized fog density of an alpha value, in [0, 1]
    #[inline]
    pub fn density(&self, alpha: u8) -> f32 {
        ((alpha.saturating_sub(self.fog_base)) as f32 * self.inv_fog_span).min(1.0)
    }

    /// Committed eye-point vector (unit length, scaled by shading)
    #[inline]
    pub fn eye(&self) -> [f32; 3] {
        self.eye
    }

    fn recompute_eye(&mut self) {
        let (sin_az, cos_az) = (self.azimuth.sin(), self.azimuth.cos());
        let (sin_el, cos_el) = (self.elevation.sin(), self.elevation.cos());
        self.eye = [cos_el * sin_az, cos_el * cos_az, sin_el];
    }
}

impl Default for DynamicRange {
    fn default() -> Self {
        Self::new()
    }
}
