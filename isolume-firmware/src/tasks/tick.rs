//! System tick task
//!
//! Publishes a millisecond timestamp at 1 kHz. The render loop polls the
//! handoff state on this tick, and effect lifetimes count it down.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use crate::channels::TICK_MS;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 1;

/// Tick task - signals the elapsed time since boot
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));
    let start = Instant::now();

    loop {
        ticker.next().await;
        TICK_MS.signal(start.elapsed().as_millis() as u32);
    }
}
