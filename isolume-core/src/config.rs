//! Panel geometry and frame cadence constants
//!
//! Values that must stay bit-exact for panel compatibility live here; the
//! rest of the engine derives its buffer sizes from them.

/// Panel width in pixels (logical framebuffer orientation)
pub const PANEL_W: usize = 256;

/// Panel height in pixels (logical framebuffer orientation)
pub const PANEL_H: usize = 64;

/// Pixels per frame
pub const PANEL_PIXELS: usize = PANEL_W * PANEL_H;

/// Bytes per wire frame: 4 bits per pixel, two pixels per byte
pub const WIRE_FRAME_LEN: usize = PANEL_PIXELS / 2;

/// Target frame interval (60 Hz)
pub const FRAME_INTERVAL_MS: u32 = 16;

/// Hard ceiling before the timeout-abort paths engage (30 Hz)
pub const FRAME_DEADLINE_MS: u32 = 33;

/// Luma above this threshold spills into the bloom accumulation plane
pub const BLOOM_THRESHOLD: u8 = 192;

/// Bounded-wait poll budget for the transmit buffer toggle
///
/// At one pause per poll this covers a full frame interval of contention
/// before the force-reset fallback engages.
pub const TOGGLE_POLL_LIMIT: u32 = 1024;
