//! Render/transmit handoff state machine
//!
//! Three execution contexts touch this state: the main render loop, the
//! ~60 Hz refresh timer interrupt, and the transmission-complete
//! interrupt. Each transition has exactly one writer; the atomics carry
//! the ownership handoff, not a lock.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

/// Pipeline states, ordered so "rendering allowed" is the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SyncState {
    /// Nothing staged; the main loop may render
    Idle = 0,
    /// The refresh timer started a re-transmission of the previous frame
    Pending = 1,
    /// A render pass completed; the composited frame awaits the timer
    Loaded = 2,
    /// Transient: transmission accepted, the main loop may update
    /// simulation state exactly once and start the next frame
    HandoffComplete = 3,
}

impl SyncState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Pending,
            2 => Self::Loaded,
            _ => Self::HandoffComplete,
        }
    }
}

/// Decision of one refresh-timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickAction {
    /// A freshly staged frame: toggle buffers and transmit it
    SendFrame,
    /// Nothing new: re-transmit the previous frame with a window re-sync
    Resync,
    /// Conditions not met; the frame is dropped, never queued
    Skip,
}

/// Shared handoff flag plus the two pipeline timestamps
pub struct RenderSync {
    state: AtomicU8,
    t_render_done: AtomicU32,
    t_send_done: AtomicU32,
}

impl RenderSync {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SyncState::Idle as u8),
            t_render_done: AtomicU32::new(0),
            t_send_done: AtomicU32::new(0),
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Timestamp of the last completed render pass (ms)
    pub fn t_render_done(&self) -> u32 {
        self.t_render_done.load(Ordering::Acquire)
    }

    /// Timestamp of the last accepted transmission (ms)
    pub fn t_send_done(&self) -> u32 {
        self.t_send_done.load(Ordering::Acquire)
    }

    /// Main loop: may a new render pass begin?
    #[inline]
    pub fn can_render(&self) -> bool {
        self.state() == SyncState::Idle
    }

    /// Main loop: a render pass finished and the frame is staged
    pub fn render_complete(&self, now_ms: u32) {
        self.t_render_done.store(now_ms, Ordering::Release);
        self.state.store(SyncState::Loaded as u8, Ordering::Release);
    }

    /// Refresh timer: decide what this tick transmits, if anything
    ///
    /// A staged frame is accepted only if it is newer than the last send
    /// and the compositor is not mid-operation (the compose plane would be
    /// half-written). Otherwise the tick degrades: on an idle pipeline it
    /// re-transmits the previous frame to re-sync the panel window; in
    /// every other case it skips. Skipped frames are dropped, never
    /// queued.
    pub fn refresh_tick(&self, now_ms: u32, compositor_busy: bool, link_busy: bool) -> TickAction {
        if link_busy {
            return TickAction::Skip;
        }
        match self.state() {
            SyncState::Loaded => {
                if self.t_render_done.load(Ordering::Acquire)
                    > self.t_send_done.load(Ordering::Acquire)
                    && !compositor_busy
                {
                    self.t_send_done.store(now_ms, Ordering::Release);
                    self.state
                        .store(SyncState::HandoffComplete as u8, Ordering::Release);
                    TickAction::SendFrame
                } else {
                    TickAction::Skip
                }
            }
            SyncState::Idle => {
                // Nothing new this interval. If we have ever sent a frame,
                // push it again so the panel's auto-increment pointer gets
                // re-based before drift accumulates.
                if self.t_send_done.load(Ordering::Acquire) != 0 {
                    self.state.store(SyncState::Pending as u8, Ordering::Release);
                    TickAction::Resync
                } else {
                    TickAction::Skip
                }
            }
            _ => TickAction::Skip,
        }
    }

    /// Transmission-complete interrupt: retire a re-transmission
    ///
    /// Fresh-frame sends are retired by the main loop via
    /// [`RenderSync::take_handoff`]; this only unwinds the `Pending`
    /// re-sync path.
    pub fn tx_complete(&self) {
        let _ = self.state.compare_exchange(
            SyncState::Pending as u8,
            SyncState::Idle as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Main loop: consume the handoff, returning true exactly once
    ///
    /// The caller updates simulation state on `true`, then starts the next
    /// render pass.
    pub fn take_handoff(&self) -> bool {
        self.state
            .compare_exchange(
                SyncState::HandoffComplete as u8,
                SyncState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for RenderSync {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_frame_handoff_sequence() {
        let sync = RenderSync::new();
        assert_eq!(sync.state(), SyncState::Idle);
        assert!(sync.can_render());

        // Render pass completes at t=100.
        sync.render_complete(100);
        assert_eq!(sync.state(), SyncState::Loaded);
        assert!(!sync.can_render());

        // Refresh tick: render newer than send, compositor idle.
        let action = sync.refresh_tick(105, false, false);
        assert_eq!(action, TickAction::SendFrame);
        assert_eq!(sync.state(), SyncState::HandoffComplete);
        assert_eq!(sync.t_send_done(), 105);

        // Main loop consumes the handoff exactly once.
        assert!(sync.take_handoff());
        assert!(!sync.take_handoff());
        assert!(sync.can_render());
    }

    #[test]
    fn test_stale_frame_is_skipped_not_queued() {
        let sync = RenderSync::new();
        sync.render_complete(100);
        assert_eq!(sync.refresh_tick(105, false, false), TickAction::SendFrame);
        sync.take_handoff();

        // The same frame is not sent twice: after the handoff the state is
        // Idle and the timestamps say nothing new arrived.
        sync.render_complete(104);
        // t_render (104) is older than t_send (105): skip.
        assert_eq!(sync.refresh_tick(120, false, false), TickAction::Skip);
        assert_eq!(sync.state(), SyncState::Loaded);
    }

    #[test]
    fn test_busy_compositor_defers_the_frame() {
        let sync = RenderSync::new();
        sync.render_complete(50);
        assert_eq!(sync.refresh_tick(55, true, false), TickAction::Skip);
        // Still loaded: the next tick picks it up once the compositor is
        // idle.
        assert_eq!(sync.state(), SyncState::Loaded);
        assert_eq!(sync.refresh_tick(71, false, false), TickAction::SendFrame);
    }

    #[test]
    fn test_busy_link_skips_everything() {
        let sync = RenderSync::new();
        sync.render_complete(50);
        assert_eq!(sync.refresh_tick(55, false, true), TickAction::Skip);
        assert_eq!(sync.state(), SyncState::Loaded);
    }

    #[test]
    fn test_resync_path_retransmits_previous_frame() {
        let sync = RenderSync::new();
        // Before anything was ever sent there is nothing to re-sync.
        assert_eq!(sync.refresh_tick(16, false, false), TickAction::Skip);

        sync.render_complete(20);
        sync.refresh_tick(32, false, false);
        sync.take_handoff();

        // Idle interval with no new frame: previous one goes out again.
        assert_eq!(sync.refresh_tick(48, false, false), TickAction::Resync);
        assert_eq!(sync.state(), SyncState::Pending);
        // Rendering is blocked while the re-transmission drains...
        assert!(!sync.can_render());
        sync.tx_complete();
        assert_eq!(sync.state(), SyncState::Idle);
        assert!(sync.can_render());
    }

    #[test]
    fn test_tx_complete_does_not_disturb_other_states() {
        let sync = RenderSync::new();
        sync.render_complete(10);
        sync.tx_complete();
        assert_eq!(sync.state(), SyncState::Loaded);
    }

    #[test]
    fn test_render_while_pending_still_stages() {
        let sync = RenderSync::new();
        sync.render_complete(20);
        sync.refresh_tick(32, false, false);
        sync.take_handoff();
        sync.refresh_tick(48, false, false);
        assert_eq!(sync.state(), SyncState::Pending);

        // A render pass that was already in flight when the re-sync
        // started finishes now; its completion outranks Pending.
        sync.render_complete(60);
        assert_eq!(sync.state(), SyncState::Loaded);
        assert_eq!(sync.refresh_tick(64, false, false), TickAction::SendFrame);
    }
}
