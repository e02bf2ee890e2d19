//! Chip-level drivers
//!
//! Everything that touches registers or DMA-visible memory lives here:
//! the DMA2D blit engine, the SSD1322 panel link, and the wire buffer
//! store the two of them share with the render loop.

pub mod blit;
pub mod panel;
pub mod wire;

pub use blit::Dma2d;
pub use panel::Ssd1322;

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;

/// The panel driver bound to this board's SPI and control pins
pub type BoardPanel = Ssd1322<Spi<'static, Async>, Output<'static>, Output<'static>>;
