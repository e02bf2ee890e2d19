//! Main render loop task
//!
//! One iteration per frame: draw the scene into the software buffers,
//! kick the hardware compose (hiding the range commit behind it), run the
//! bloom pyramid, pack the wire buffer, and hand the frame to the refresh
//! tick. Simulation state advances exactly once per consumed handoff.

use defmt::*;
use embassy_time::{with_timeout, Duration, Instant};

use isolume_core::buffers::FrameBuffers;
use isolume_core::compositor::{BloomChain, Compositor, NoChain, ResizeChain};
use isolume_core::config::{FRAME_DEADLINE_MS, FRAME_INTERVAL_MS, PANEL_H, PANEL_W};
use isolume_core::pipeline::pack_rotated;
use isolume_core::range::DynamicRange;
use isolume_hal::{ComposeOp, WaitHook};

use crate::channels::{BLIT_DONE, RENDER_SYNC, TICK_MS, TX_BUFFERS};
use crate::drivers::{wire, Dma2d};
use crate::scene::Scene;

/// WFE between toggle polls: sleeps until any interrupt, which includes
/// the transfer-complete path that frees the buffer being waited on
struct WfeWait;

impl WaitHook for WfeWait {
    fn pause(&mut self) {
        cortex_m::asm::wfe();
    }
}

/// Rolling frame statistics, logged roughly once a second
struct FrameStats {
    acc_us: u64,
    worst_us: u64,
    frames: u32,
}

impl FrameStats {
    const fn new() -> Self {
        Self {
            acc_us: 0,
            worst_us: 0,
            frames: 0,
        }
    }

    fn frame(&mut self, render_us: u64) {
        self.acc_us += render_us;
        self.worst_us = self.worst_us.max(render_us);
        self.frames += 1;
        if self.frames >= 64 {
            info!(
                "render avg {}us worst {}us over {} frames",
                self.acc_us / self.frames as u64,
                self.worst_us,
                self.frames
            );
            *self = Self::new();
        }
    }
}

/// Render task - the cooperative main loop
#[embassy_executor::task]
pub async fn render_task(mut engine: Dma2d, fb: &'static mut FrameBuffers) {
    info!("Render task started");

    let mut range = DynamicRange::new();
    let mut compositor = Compositor::new();
    let mut scene = Scene::new();
    let mut stats = FrameStats::new();

    loop {
        if !RENDER_SYNC.can_render() {
            if RENDER_SYNC.take_handoff() {
                // The previous frame was accepted for transmission:
                // advance simulation state, exactly once.
                scene.update(FRAME_INTERVAL_MS);
            } else {
                TICK_MS.wait().await;
                continue;
            }
        }

        let t0 = Instant::now();

        fb.clear_frame();
        scene.draw(fb, &mut range);

        // Full-frame compose on the 2D engine; the dynamic-range commit
        // runs in its shadow.
        let op = ComposeOp {
            width: PANEL_W as u32,
            height: PANEL_H as u32,
        };
        if compositor.start_compose(&mut engine, op).is_ok() {
            range.commit();
            drive(&mut compositor, &mut engine, &mut NoChain).await;
        }

        // Separable blur of the bloom plane, chained stage to stage from
        // the completion context.
        let (first, mut chain) = BloomChain::begin();
        if compositor.start_resize(&mut engine, first).is_ok() {
            drive(&mut compositor, &mut engine, &mut chain).await;
        }

        let idx = TX_BUFFERS.toggle(&mut WfeWait);
        // SAFETY: toggle returned a buffer the link is not draining; it
        // stays ours until the refresh tick marks it busy.
        let buf = unsafe { wire::buffer_mut(idx) };
        pack_rotated(&fb.compose, &fb.bloom, buf);

        RENDER_SYNC.render_complete(Instant::now().as_millis() as u32);
        stats.frame(t0.elapsed().as_micros());
    }
}

/// Pump completion events until the compositor goes idle
///
/// Each wait is bounded by the hard frame deadline; a stalled engine is
/// aborted and the pipeline carries on with whatever the planes hold.
async fn drive<C: ResizeChain>(compositor: &mut Compositor, engine: &mut Dma2d, chain: &mut C) {
    while compositor.is_busy() {
        match with_timeout(
            Duration::from_millis(FRAME_DEADLINE_MS as u64),
            BLIT_DONE.wait(),
        )
        .await
        {
            Ok(()) => {
                compositor.on_blit_complete(engine, chain);
            }
            Err(_) => {
                warn!("blit engine stalled, forcing reset");
                compositor.force_reset(engine);
            }
        }
    }
}
