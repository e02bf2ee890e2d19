//! Inter-task communication channels
//!
//! Defines the static channels and shared pipeline state used for
//! communication between Embassy tasks. Uses embassy-sync primitives for
//! safe async communication; the pipeline handoff itself lives in the
//! lock-free state machines from isolume-core.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use isolume_core::pipeline::{RenderSync, TransmitBuffers};

/// Render/transmit handoff shared by the main loop and both display
/// interrupts
pub static RENDER_SYNC: RenderSync = RenderSync::new();

/// Busy flags of the two wire buffers
pub static TX_BUFFERS: TransmitBuffers = TransmitBuffers::new();

/// Signaled by the DMA2D completion interrupt
pub static BLIT_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Millisecond timestamp from the 1 kHz system tick
pub static TICK_MS: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Transmission commands from the refresh tick to the transfer task
///
/// Capacity 1: a command that cannot be accepted is dropped by the sender,
/// never queued - frames are allowed to drop under load.
pub static TX_CMD: Channel<CriticalSectionRawMutex, TxCommand, 1> = Channel::new();

/// One transmission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxCommand {
    /// Transmit the freshly packed wire buffer
    Send { buffer: usize },
    /// Nothing new: re-send the previous frame with a window re-sync
    Resync,
}

/// Whether the serial link is draining either wire buffer
pub fn link_busy() -> bool {
    TX_BUFFERS.is_busy(0) || TX_BUFFERS.is_busy(1)
}
