//! Wire buffer store
//!
//! The two 4-bpp transmit buffers are shared between the render task
//! (packing) and the transfer task (DMA source). Ownership alternates per
//! the `TransmitBuffers` busy-flag protocol; these accessors only turn the
//! protocol into references.

use core::cell::UnsafeCell;
use isolume_core::config::WIRE_FRAME_LEN;

#[repr(align(4))]
struct WireStore([UnsafeCell<[u8; WIRE_FRAME_LEN]>; 2]);

// SAFETY: access is serialized by the TransmitBuffers busy flags - a
// buffer is either owned by the render phase (packing) or marked busy and
// owned by the link, never both.
unsafe impl Sync for WireStore {}

static STORE: WireStore = WireStore([
    UnsafeCell::new([0; WIRE_FRAME_LEN]),
    UnsafeCell::new([0; WIRE_FRAME_LEN]),
]);

/// Mutable access for packing
///
/// # Safety
///
/// The caller must have selected `idx` through `TransmitBuffers::toggle`
/// (or otherwise hold the packing phase for it) and must drop the
/// reference before the buffer is handed to the link.
pub unsafe fn buffer_mut(idx: usize) -> &'static mut [u8; WIRE_FRAME_LEN] {
    &mut *STORE.0[idx].get()
}

/// Shared access for transmission
///
/// # Safety
///
/// The caller must have marked `idx` busy first, so no packing write can
/// overlap the read.
pub unsafe fn buffer(idx: usize) -> &'static [u8; WIRE_FRAME_LEN] {
    &*STORE.0[idx].get()
}
