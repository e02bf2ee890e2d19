//! Embassy async tasks
//!
//! One task per execution context of the pipeline: the render loop, the
//! 60 Hz refresh trigger, the serial transfer, and the 1 kHz system tick.
//! They communicate via the channels module and the core handoff state
//! machines.

pub mod refresh;
pub mod render;
pub mod tick;
pub mod transfer;

pub use refresh::refresh_task;
pub use render::render_task;
pub use tick::tick_task;
pub use transfer::transfer_task;
