//! Serial transfer task
//!
//! Drains transmission commands from the refresh tick: initializes the
//! panel, bursts wire buffers out over SPI DMA, and releases buffer
//! ownership when the hardware is done with them. Every wait on the link
//! is bounded; a stalled transfer costs one frame, never the pipeline.

use defmt::*;
use embassy_time::{with_timeout, Duration};

use isolume_core::config::FRAME_DEADLINE_MS;

use crate::channels::{TxCommand, RENDER_SYNC, TX_BUFFERS, TX_CMD};
use crate::drivers::panel::PanelWindow;
use crate::drivers::wire;
use crate::drivers::BoardPanel;

/// Frames between addressing-window rewrites
const WINDOW_RESYNC_INTERVAL: u32 = 60;

/// Transfer task - owns the panel link
#[embassy_executor::task]
pub async fn transfer_task(mut panel: BoardPanel) {
    info!("Transfer task started");

    if let Err(e) = panel.init().await {
        error!("Panel init failed: {:?}", e);
    }

    let mut last: Option<usize> = None;
    let mut sends_since_resync = 0u32;

    loop {
        match TX_CMD.receive().await {
            TxCommand::Send { buffer } => {
                if sends_since_resync >= WINDOW_RESYNC_INTERVAL || last.is_none() {
                    let _ = panel.set_window(PanelWindow::default()).await;
                    sends_since_resync = 0;
                }
                sends_since_resync += 1;

                // SAFETY: the refresh tick marked `buffer` busy before
                // queuing the command; the render loop will not touch it
                // until mark_free below.
                let data = unsafe { wire::buffer(buffer) };
                send_bounded(&mut panel, data).await;

                TX_BUFFERS.mark_free(buffer);
                RENDER_SYNC.tx_complete();
                last = Some(buffer);
            }
            TxCommand::Resync => {
                if let Some(idx) = last {
                    TX_BUFFERS.mark_busy(idx);
                    let _ = panel.set_window(PanelWindow::default()).await;
                    // SAFETY: marked busy above; the render loop's toggle
                    // will not select it while the flag is set.
                    let data = unsafe { wire::buffer(idx) };
                    send_bounded(&mut panel, data).await;
                    TX_BUFFERS.mark_free(idx);
                    sends_since_resync = 0;
                }
                RENDER_SYNC.tx_complete();
            }
        }
    }
}

/// Transmit with the hard frame deadline as the bound
async fn send_bounded(panel: &mut BoardPanel, data: &[u8]) {
    match with_timeout(
        Duration::from_millis(FRAME_DEADLINE_MS as u64),
        panel.write_frame(data),
    )
    .await
    {
        Ok(Ok(())) => trace!("frame sent"),
        Ok(Err(e)) => warn!("link write error: {:?}", e),
        Err(_) => warn!("link stalled, frame abandoned"),
    }
}
