//! Low-power wait primitive
//!
//! Every wait in the pipeline is bounded: a fixed number of polls with a
//! pause between them. The pause is hardware-specific (WFE on the target,
//! a no-op or a scripted hook in host tests), so it lives behind a trait.

/// Pause primitive called between bounded polls
pub trait WaitHook {
    /// Block briefly, ideally in a low-power state, until the next poll
    fn pause(&mut self);
}

/// Busy-spin hook for contexts where sleeping is not allowed
#[derive(Debug, Default)]
pub struct SpinWait;

impl WaitHook for SpinWait {
    fn pause(&mut self) {}
}
