//! Double-buffered transmit staging
//!
//! Two physical wire buffers alternate: one drains over the serial link
//! while the other is packed with the next frame. The toggle must never
//! hand out a buffer the link is still reading from, and it must not
//! livelock when an interrupt glitch leaves both flags stuck busy.

use crate::config::TOGGLE_POLL_LIMIT;
use isolume_hal::WaitHook;
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

/// Busy flags and the active index of the two wire buffers
///
/// The pixel storage itself lives with the firmware (it must be static for
/// DMA); this tracks only ownership.
pub struct TransmitBuffers {
    busy: [AtomicBool; 2],
    active: AtomicU8,
}

impl TransmitBuffers {
    pub const fn new() -> Self {
        Self {
            busy: [AtomicBool::new(false), AtomicBool::new(false)],
            active: AtomicU8::new(0),
        }
    }

    /// Index currently being packed (the last value `toggle` returned)
    #[inline]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire) as usize
    }

    /// Whether buffer `idx` is draining
    #[inline]
    pub fn is_busy(&self, idx: usize) -> bool {
        self.busy[idx].load(Ordering::Acquire)
    }

    /// Transmission started: the buffer belongs to the link now
    pub fn mark_busy(&self, idx: usize) {
        self.busy[idx].store(true, Ordering::Release);
    }

    /// Transmission-complete interrupt: the buffer is reusable
    pub fn mark_free(&self, idx: usize) {
        self.busy[idx].store(false, Ordering::Release);
    }

    /// Select the buffer for the next frame
    ///
    /// Prefers the buffer not used last time. If that one is still
    /// draining, polls bounded with a low-power pause, taking whichever of
    /// the two frees first - the previous buffer freeing up is the
    /// documented fallback, not an error. If the budget runs out with both
    /// flags stuck, both are force-cleared and the intended buffer taken;
    /// the worst case is one corrupted (dropped) frame.
    pub fn toggle<W: WaitHook>(&self, wait: &mut W) -> usize {
        let current = self.active();
        let intended = current ^ 1;

        if !self.is_busy(intended) {
            self.active.store(intended as u8, Ordering::Release);
            return intended;
        }

        for _ in 0..TOGGLE_POLL_LIMIT {
            if !self.is_busy(intended) {
                self.active.store(intended as u8, Ordering::Release);
                return intended;
            }
            if !self.is_busy(current) {
                // Fallback: reuse the buffer we just filled rather than
                // keep waiting on the intended one.
                return current;
            }
            wait.pause();
        }

        // Both stuck busy past the budget: a completion interrupt was
        // lost. Force-reset and move on.
        self.mark_free(0);
        self.mark_free(1);
        self.active.store(intended as u8, Ordering::Release);
        intended
    }
}

impl Default for TransmitBuffers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hook that frees configured buffers after a set number of pauses
    struct ScriptedWait<'a> {
        bufs: &'a TransmitBuffers,
        pauses: u32,
        free_at: [(u32, usize); 2],
        used: usize,
    }

    impl<'a> ScriptedWait<'a> {
        fn new(bufs: &'a TransmitBuffers, free_at: [(u32, usize); 2]) -> Self {
            Self {
                bufs,
                pauses: 0,
                free_at,
                used: 0,
            }
        }
    }

    impl<'a> WaitHook for ScriptedWait<'a> {
        fn pause(&mut self) {
            self.pauses += 1;
            while self.used < self.free_at.len() {
                let (at, idx) = self.free_at[self.used];
                if at == u32::MAX || self.pauses < at {
                    break;
                }
                self.bufs.mark_free(idx);
                self.used += 1;
            }
        }
    }

    #[test]
    fn test_toggle_alternates_when_free() {
        let bufs = TransmitBuffers::new();
        let mut wait = isolume_hal::wait::SpinWait;
        assert_eq!(bufs.toggle(&mut wait), 1);
        assert_eq!(bufs.toggle(&mut wait), 0);
        assert_eq!(bufs.toggle(&mut wait), 1);
    }

    #[test]
    fn test_toggle_never_selects_busy_when_other_free() {
        let bufs = TransmitBuffers::new();
        let mut wait = isolume_hal::wait::SpinWait;
        // Active is 0; the intended buffer 1 is draining.
        bufs.mark_busy(1);
        assert_eq!(bufs.toggle(&mut wait), 0);
        // And the mirror case.
        bufs.mark_free(1);
        bufs.mark_busy(0);
        assert_eq!(bufs.toggle(&mut wait), 1);
    }

    #[test]
    fn test_contention_fallback_takes_first_free() {
        let bufs = TransmitBuffers::new();
        // Both draining; toggle will wait on buffer 1 (the intended one),
        // but buffer 0 frees a tick earlier.
        bufs.mark_busy(0);
        bufs.mark_busy(1);
        let mut wait = ScriptedWait::new(&bufs, [(3, 0), (4, 1)]);
        let chosen = bufs.toggle(&mut wait);
        assert_eq!(chosen, 0, "fallback to the first-freed buffer");
        assert_eq!(wait.pauses, 3);
    }

    #[test]
    fn test_intended_wins_when_it_frees_first() {
        let bufs = TransmitBuffers::new();
        bufs.mark_busy(0);
        bufs.mark_busy(1);
        let mut wait = ScriptedWait::new(&bufs, [(2, 1), (u32::MAX, 0)]);
        assert_eq!(bufs.toggle(&mut wait), 1);
    }

    #[test]
    fn test_both_stuck_forces_reset() {
        let bufs = TransmitBuffers::new();
        bufs.mark_busy(0);
        bufs.mark_busy(1);
        let mut wait = ScriptedWait::new(&bufs, [(u32::MAX, 0), (u32::MAX, 1)]);
        let chosen = bufs.toggle(&mut wait);
        // The intended buffer is taken and both flags are clear: no
        // livelock, at worst one bad frame.
        assert_eq!(chosen, 1);
        assert!(!bufs.is_busy(0));
        assert!(!bufs.is_busy(1));
    }
}
