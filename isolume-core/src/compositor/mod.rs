//! Hardware compositor orchestration
//!
//! The 2D engine does exactly two things in hardware: a full-frame compose
//! and a 1D linear blend. This module owns the mutual exclusion over the
//! engine (one operation in flight, ever) and the state machine that turns
//! chains of 1D blends into 2D bilinear resizes.

mod chain;
mod resize;

pub use chain::{BloomChain, NoChain, ResizeChain};
pub use resize::{ResizeMachine, ResizeOp, StepOutcome, RESIZE_FRAC_BITS};

use isolume_hal::{BlitEngine, BlitError, ComposeOp};
use portable_atomic::{AtomicBool, Ordering};

/// What the compositor is currently driving
enum Activity {
    Idle,
    Compose,
    Resize(ResizeMachine),
}

/// Result of feeding one completion event to the compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// The current operation issued its next row/column
    Running,
    /// A chained continuation started a new resize from the completion
    /// context
    Chained,
    /// Everything finished; the engine is idle and the busy flag cleared
    Done,
    /// Completion arrived with nothing in flight (timeout already reset us)
    Spurious,
}

/// Orchestrates the blit engine; exactly one operation in flight
///
/// The busy flag is atomic because the display refresh interrupt reads it
/// while the compositor task writes it. All other state is owned by the
/// compositor task alone.
pub struct Compositor {
    busy: AtomicBool,
    activity: Activity,
}

impl Compositor {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            activity: Activity::Idle,
        }
    }

    /// Whether an operation is in flight (safe from any context)
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start the full-frame compose of Back+Front into the compose plane
    pub fn start_compose<E: BlitEngine>(
        &mut self,
        engine: &mut E,
        op: ComposeOp,
    ) -> Result<(), BlitError> {
        self.claim()?;
        if let Err(e) = engine.start_compose(&op) {
            self.release();
            return Err(e);
        }
        self.activity = Activity::Compose;
        Ok(())
    }

    /// Start a two-pass resize; continuations come from `chain` later
    pub fn start_resize<E: BlitEngine>(
        &mut self,
        engine: &mut E,
        op: ResizeOp,
    ) -> Result<(), BlitError> {
        self.claim()?;
        match ResizeMachine::start(op, engine) {
            Ok(machine) => {
                self.activity = Activity::Resize(machine);
                Ok(())
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    /// Feed one engine-completion event
    ///
    /// Called from the completion context. When a resize finishes, `chain`
    /// is consulted and a returned operation starts immediately, without
    /// the caller ever waiting in between.
    pub fn on_blit_complete<E: BlitEngine, C: ResizeChain>(
        &mut self,
        engine: &mut E,
        chain: &mut C,
    ) -> Progress {
        match &mut self.activity {
            Activity::Idle => Progress::Spurious,
            Activity::Compose => {
                self.activity = Activity::Idle;
                self.release();
                Progress::Done
            }
            Activity::Resize(machine) => match machine.on_blit_complete(engine) {
                StepOutcome::Continue => Progress::Running,
                StepOutcome::Finished => match chain.next() {
                    Some(op) => match ResizeMachine::start(op, engine) {
                        Ok(next) => {
                            self.activity = Activity::Resize(next);
                            Progress::Chained
                        }
                        Err(_) => {
                            // A malformed continuation cannot hang the
                            // pipeline; drop it and go idle.
                            self.activity = Activity::Idle;
                            self.release();
                            Progress::Done
                        }
                    },
                    None => {
                        self.activity = Activity::Idle;
                        self.release();
                        Progress::Done
                    }
                },
            },
        }
    }

    /// Timeout path: abort the transfer and force the idle state
    ///
    /// Liveness guarantee for a stalled engine; never surfaced to callers
    /// as an error. The worst case downstream is a dropped frame.
    pub fn force_reset<E: BlitEngine>(&mut self, engine: &mut E) {
        engine.abort();
        self.activity = Activity::Idle;
        self.release();
    }

    fn claim(&self) -> Result<(), BlitError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| BlitError::Busy)
    }

    fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{front_alpha, front_luma, GRAY_RAMP};
    use crate::config::{PANEL_H, PANEL_PIXELS, PANEL_W};
    use isolume_hal::{LineBlendOp, Plane};

    /// Software stand-in for the 2D engine: executes each operation
    /// synchronously and lets the test pump completions one at a time.
    pub(super) struct SoftBlit {
        pub back: [u8; PANEL_PIXELS],
        pub front: [u32; PANEL_PIXELS],
        pub compose: [u32; PANEL_PIXELS],
        pub bloom: [u8; PANEL_PIXELS],
        pub bloom_half: [u8; PANEL_PIXELS],
        pub scratch: [u8; PANEL_PIXELS],
        pub pending: bool,
        pub line_ops: usize,
        pub aborted: bool,
    }

    impl SoftBlit {
        pub fn new() -> Self {
            Self {
                back: [0; PANEL_PIXELS],
                front: [0; PANEL_PIXELS],
                compose: [0; PANEL_PIXELS],
                bloom: [0; PANEL_PIXELS],
                bloom_half: [0; PANEL_PIXELS],
                scratch: [0; PANEL_PIXELS],
                pending: false,
                line_ops: 0,
                aborted: false,
            }
        }

        fn plane(&self, p: Plane) -> &[u8; PANEL_PIXELS] {
            match p {
                Plane::Bloom => &self.bloom,
                Plane::BloomHalf => &self.bloom_half,
                Plane::Scratch => &self.scratch,
                Plane::Back => &self.back,
                _ => panic!("32bpp plane in a 1D blend test"),
            }
        }

        fn plane_mut(&mut self, p: Plane) -> &mut [u8; PANEL_PIXELS] {
            match p {
                Plane::Bloom => &mut self.bloom,
                Plane::BloomHalf => &mut self.bloom_half,
                Plane::Scratch => &mut self.scratch,
                Plane::Back => &mut self.back,
                _ => panic!("32bpp plane in a 1D blend test"),
            }
        }
    }

    impl BlitEngine for SoftBlit {
        fn start_compose(&mut self, op: &ComposeOp) -> Result<(), BlitError> {
            for i in 0..(op.width * op.height) as usize {
                let base = GRAY_RAMP[self.back[i] as usize];
                let fg = self.front[i];
                let a = front_alpha(fg) as u32;
                let bl = front_luma(base) as u32;
                let fl = front_luma(fg) as u32;
                let l = ((bl * (255 - a) + fl * a) / 255) as u8;
                self.compose[i] = crate::buffers::pack_front(0xFF, l);
            }
            self.pending = true;
            Ok(())
        }

        fn start_line_blend(&mut self, op: &LineBlendOp) -> Result<(), BlitError> {
            let inv = 255 - op.coeff as u32;
            for i in 0..op.len as usize {
                let a = self.plane(op.src0.0)[(op.src0.1 + i as u32 * op.src0_pitch) as usize]
                    as u32;
                let b = self.plane(op.src1.0)[(op.src1.1 + i as u32 * op.src1_pitch) as usize]
                    as u32;
                let v = ((a * inv + b * op.coeff as u32) / 255) as u8;
                let dst = op.dst;
                self.plane_mut(dst.0)[(dst.1 + i as u32 * op.dst_pitch) as usize] = v;
            }
            self.line_ops += 1;
            self.pending = true;
            Ok(())
        }

        fn is_busy(&self) -> bool {
            self.pending
        }

        fn abort(&mut self) {
            self.pending = false;
            self.aborted = true;
        }
    }

    /// Pump completions until the compositor goes idle
    pub(super) fn run_to_idle<C: ResizeChain>(
        comp: &mut Compositor,
        engine: &mut SoftBlit,
        chain: &mut C,
    ) -> usize {
        let mut events = 0;
        while comp.is_busy() {
            engine.pending = false;
            comp.on_blit_complete(engine, chain);
            events += 1;
            assert!(events < 10_000, "compositor never went idle");
        }
        events
    }

    #[test]
    fn test_mutual_exclusion_one_op_in_flight() {
        let mut comp = Compositor::new();
        let mut engine = SoftBlit::new();
        let op = ComposeOp {
            width: PANEL_W as u32,
            height: PANEL_H as u32,
        };
        comp.start_compose(&mut engine, op).unwrap();
        assert!(comp.is_busy());
        assert_eq!(comp.start_compose(&mut engine, op), Err(BlitError::Busy));

        engine.pending = false;
        assert_eq!(
            comp.on_blit_complete(&mut engine, &mut NoChain),
            Progress::Done
        );
        assert!(!comp.is_busy());
    }

    #[test]
    fn test_compose_expands_ramp_and_blends_front() {
        let mut comp = Compositor::new();
        let mut engine = SoftBlit::new();
        engine.back[0] = 0x80;
        // Opaque white front pixel at index 1.
        engine.back[1] = 0x20;
        engine.front[1] = crate::buffers::pack_front(0xFF, 0xFF);

        comp.start_compose(
            &mut engine,
            ComposeOp {
                width: PANEL_W as u32,
                height: PANEL_H as u32,
            },
        )
        .unwrap();
        run_to_idle(&mut comp, &mut engine, &mut NoChain);

        assert_eq!(front_luma(engine.compose[0]), 0x80);
        assert_eq!(front_luma(engine.compose[1]), 0xFF);
    }

    #[test]
    fn test_spurious_completion_is_harmless() {
        let mut comp = Compositor::new();
        let mut engine = SoftBlit::new();
        assert_eq!(
            comp.on_blit_complete(&mut engine, &mut NoChain),
            Progress::Spurious
        );
        assert!(!comp.is_busy());
    }

    #[test]
    fn test_force_reset_aborts_and_clears_busy() {
        let mut comp = Compositor::new();
        let mut engine = SoftBlit::new();
        comp.start_resize(
            &mut engine,
            ResizeOp {
                src: Plane::Bloom,
                src_w: 8,
                src_h: 8,
                dst: Plane::BloomHalf,
                dst_w: 4,
                dst_h: 4,
                scratch: Plane::Scratch,
            },
        )
        .unwrap();
        assert!(comp.is_busy());
        comp.force_reset(&mut engine);
        assert!(!comp.is_busy());
        assert!(engine.aborted);
        // The stale completion that may still arrive is ignored.
        assert_eq!(
            comp.on_blit_complete(&mut engine, &mut NoChain),
            Progress::Spurious
        );
    }
}
