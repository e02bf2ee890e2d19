//! Isolume Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits for the fixed-function
//! 2D blit engine the rendering pipeline drives, so that the core engine
//! can be exercised on the host with software implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Rendering engine (isolume-core)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  isolume-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip drivers (isolume-firmware)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`blit::BlitEngine`] - fixed-function 2D compose/blend engine
//! - [`wait::WaitHook`] - low-power wait primitive for bounded polls

#![no_std]
#![deny(unsafe_code)]

pub mod blit;
pub mod wait;

// Re-export key traits at crate root for convenience
pub use blit::{BlitEngine, BlitError, ComposeOp, LineBlendOp, Plane};
pub use wait::{SpinWait, WaitHook};
