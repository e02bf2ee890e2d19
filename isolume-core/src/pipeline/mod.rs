//! Display transmission pipeline
//!
//! Everything between "the frame is composited" and "bytes are on the
//! wire": the handoff state machine shared by the main loop and the two
//! display interrupts, the double-buffered transmit staging, and the
//! panel wire format.

mod pack;
mod sync;
mod txbuf;

pub use pack::pack_rotated;
pub use sync::{RenderSync, SyncState, TickAction};
pub use txbuf::TransmitBuffers;
