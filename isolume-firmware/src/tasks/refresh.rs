//! Display refresh trigger task
//!
//! The ~60 Hz cadence source. Each tick asks the handoff state machine
//! what to do; the answer is either "transmit the staged frame", "re-send
//! the previous one", or nothing. Frames that cannot go out this tick are
//! dropped, never queued.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use isolume_core::config::FRAME_INTERVAL_MS;
use isolume_core::pipeline::TickAction;

use crate::channels::{link_busy, TxCommand, RENDER_SYNC, TX_BUFFERS, TX_CMD};
use crate::drivers::blit;

/// Refresh task - drives the fixed transmission cadence
#[embassy_executor::task]
pub async fn refresh_task() {
    info!("Refresh task started");

    let mut ticker = Ticker::every(Duration::from_millis(FRAME_INTERVAL_MS as u64));

    loop {
        ticker.next().await;
        let now = Instant::now().as_millis() as u32;

        match RENDER_SYNC.refresh_tick(now, blit::engine_busy(), link_busy()) {
            TickAction::SendFrame => {
                let idx = TX_BUFFERS.active();
                TX_BUFFERS.mark_busy(idx);
                if TX_CMD.try_send(TxCommand::Send { buffer: idx }).is_err() {
                    // Transfer task still draining the previous command:
                    // this frame is dropped.
                    TX_BUFFERS.mark_free(idx);
                    trace!("frame dropped, transfer backlog");
                }
            }
            TickAction::Resync => {
                if TX_CMD.try_send(TxCommand::Resync).is_err() {
                    // Nobody will complete the re-send; unwind Pending so
                    // rendering is not blocked.
                    RENDER_SYNC.tx_complete();
                }
            }
            TickAction::Skip => {}
        }
    }
}
