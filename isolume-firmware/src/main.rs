//! Isolume - OLED rendering pipeline firmware
//!
//! Main firmware binary for STM32F746-based boards driving a 256x64
//! grayscale OLED. Renders an isometric voxel scene into software frame
//! buffers, composites them on the Chrom-ART 2D engine, and streams the
//! packed result to the panel over SPI DMA at 60 Hz.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::pac::interrupt;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use static_cell::ConstStaticCell;
use {defmt_rtt as _, panic_probe as _};

use isolume_core::buffers::FrameBuffers;

use crate::drivers::blit::{Dma2d, PlaneAddrs};
use crate::drivers::Ssd1322;

mod channels;
mod drivers;
mod scene;
mod tasks;

/// The full frame buffer set, placed in bss rather than built on a stack
static FRAME_BUFFERS: ConstStaticCell<FrameBuffers> = ConstStaticCell::new(FrameBuffers::new());

/// DMA2D transfer-complete interrupt
#[interrupt]
fn DMA2D() {
    drivers::blit::on_irq();
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Isolume firmware starting...");

    let p = embassy_stm32::init(Default::default());
    info!("Peripherals initialized");

    let fb = FRAME_BUFFERS.take();

    // The 2D engine reads and writes the planes by address; compute them
    // once, before the render task takes ownership of the buffers.
    let addrs = PlaneAddrs {
        back: fb.back.as_ptr() as u32,
        front: fb.front.as_ptr() as u32,
        compose: fb.compose.as_ptr() as u32,
        bloom: fb.bloom.as_ptr() as u32,
        bloom_half: fb.bloom_half.as_ptr() as u32,
        scratch: fb.scratch.as_ptr() as u32,
    };
    let engine = Dma2d::new(addrs);

    // SAFETY: the handler only acknowledges the engine and signals; it is
    // safe to take interrupts as soon as the clock is enabled.
    unsafe {
        cortex_m::peripheral::NVIC::unmask(embassy_stm32::pac::Interrupt::DMA2D);
    }

    // Panel link: SPI1 TX-only with DMA, DC on PD13, CS on PD14.
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(30_000_000);
    let spi_bus = Spi::new_txonly(p.SPI1, p.PA5, p.PA7, p.DMA2_CH3, spi_config);
    let dc = Output::new(p.PD13, Level::Low, Speed::VeryHigh);
    let cs = Output::new(p.PD14, Level::High, Speed::VeryHigh);
    let panel = Ssd1322::new(spi_bus, dc, cs);

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::refresh_task()).unwrap();
    spawner.spawn(tasks::transfer_task(panel)).unwrap();
    spawner.spawn(tasks::render_task(engine, fb)).unwrap();

    info!("All tasks spawned");
}
