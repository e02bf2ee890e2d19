//! Board-agnostic rendering engine for the Isolume OLED firmware
//!
//! This crate contains all pipeline logic that does not depend on specific
//! hardware implementations:
//!
//! - Frame buffer set (back/front/depth/compose/bloom planes)
//! - Depth-tested, anti-aliased drawing primitives
//! - Per-frame depth/fog dynamic range model
//! - Hardware compositor orchestration (resize/blend state machine)
//! - Display transmission handoff state machine and wire packing
//! - Volumetric radial-grid effect renderer
//!
//! Hardware is reached exclusively through the `isolume-hal` traits, so the
//! whole engine runs (and is tested) on the host.

#![no_std]
#![deny(unsafe_code)]

pub mod buffers;
pub mod compositor;
pub mod config;
pub mod pipeline;
pub mod range;
pub mod raster;
pub mod volumetric;
pub mod world;
