//! Volumetric radial-grid effects
//!
//! Expanding and growing volumes (explosions, shockwaves) are rendered as
//! a signed-distance field evaluated over a circular grid footprint. The
//! footprint's per-scanline geometry is cached and reused across frames;
//! per-cell work is bounded by a culling strategy chosen per field type at
//! compile time.

mod field;
mod instance;
mod render;
mod rows;

pub use field::{DistanceField, ExplosionField, ShockwaveField, Traversal};
pub use instance::RadialInstance;
pub use render::render_effect;
pub use rows::{Row, RowCache, MAX_EFFECT_RADIUS, MAX_ROWS};
