//! DMA2D blit engine driver
//!
//! Implements the `BlitEngine` trait on the Chrom-ART engine. The engine
//! natively blends two sources line by line; 1D runs with a pitch are
//! programmed as N lines of one pixel with the pitch as the line offset,
//! which is what lets the core resize machine drive column passes without
//! a transposed copy.

use isolume_core::buffers::GRAY_RAMP;
use isolume_hal::{BlitEngine, BlitError, ComposeOp, LineBlendOp, Plane};
use portable_atomic::{AtomicBool, Ordering};

use crate::channels::BLIT_DONE;

const DMA2D_BASE: usize = 0x4002_B000;

/// RCC AHB1 clock enable, DMA2D bit
const RCC_AHB1ENR: usize = 0x4002_3800 + 0x30;
const RCC_AHB1ENR_DMA2DEN: u32 = 1 << 23;

/// Register offsets
#[allow(dead_code)]
mod reg {
    pub const CR: usize = 0x00;
    pub const ISR: usize = 0x04;
    pub const IFCR: usize = 0x08;
    pub const FGMAR: usize = 0x0C;
    pub const FGOR: usize = 0x10;
    pub const BGMAR: usize = 0x14;
    pub const BGOR: usize = 0x18;
    pub const FGPFCCR: usize = 0x1C;
    pub const BGPFCCR: usize = 0x24;
    pub const BGCMAR: usize = 0x30;
    pub const OPFCCR: usize = 0x34;
    pub const OMAR: usize = 0x3C;
    pub const OOR: usize = 0x40;
    pub const NLR: usize = 0x44;
}

/// CR bits
const CR_START: u32 = 1 << 0;
const CR_ABORT: u32 = 1 << 2;
const CR_TCIE: u32 = 1 << 9;
/// Memory-to-memory with blending
const CR_MODE_BLEND: u32 = 0b10 << 16;

/// ISR/IFCR transfer-complete bits
const ISR_TCIF: u32 = 1 << 1;
const IFCR_CTCIF: u32 = 1 << 1;

/// Pixel format codes
const PF_ARGB8888: u32 = 0b0000;
const PF_L8: u32 = 0b0101;

/// FGPFCCR alpha mode: replace and multiply by the ALPHA field
const AM_REPLACE: u32 = 0b01 << 16;

/// Engine-level busy flag, readable from every context
static BUSY: AtomicBool = AtomicBool::new(false);

/// Whether a DMA2D transfer is in flight
pub fn engine_busy() -> bool {
    BUSY.load(Ordering::Acquire)
}

/// DMA2D interrupt body: acknowledge and wake the compositor
pub fn on_irq() {
    if read_reg(reg::ISR) & ISR_TCIF != 0 {
        write_reg(reg::IFCR, IFCR_CTCIF);
        BUSY.store(false, Ordering::Release);
        BLIT_DONE.signal(());
    }
}

#[inline]
fn write_reg(offset: usize, value: u32) {
    // SAFETY: fixed peripheral address, write-only register access.
    unsafe { core::ptr::write_volatile((DMA2D_BASE + offset) as *mut u32, value) }
}

#[inline]
fn read_reg(offset: usize) -> u32 {
    // SAFETY: fixed peripheral address.
    unsafe { core::ptr::read_volatile((DMA2D_BASE + offset) as *const u32) }
}

/// Base addresses of the DMA-visible pixel planes
#[derive(Debug, Clone, Copy)]
pub struct PlaneAddrs {
    pub back: u32,
    pub front: u32,
    pub compose: u32,
    pub bloom: u32,
    pub bloom_half: u32,
    pub scratch: u32,
}

/// The Chrom-ART engine bound to the frame buffer planes
pub struct Dma2d {
    addrs: PlaneAddrs,
}

impl Dma2d {
    /// Enable the engine clock and load the grayscale CLUT
    pub fn new(addrs: PlaneAddrs) -> Self {
        // SAFETY: read-modify-write of the RCC enable bit before any task
        // touches the engine.
        unsafe {
            let enr = RCC_AHB1ENR as *mut u32;
            core::ptr::write_volatile(enr, core::ptr::read_volatile(enr) | RCC_AHB1ENR_DMA2DEN);
        }
        // Background CLUT: the 256-entry grayscale ramp expanding the
        // indexed back buffer. The automatic load finishes long before the
        // first frame's compose is started.
        write_reg(reg::BGCMAR, GRAY_RAMP.as_ptr() as u32);
        write_reg(reg::BGPFCCR, PF_L8 | (255 << 8) | (1 << 5));
        Self { addrs }
    }

    /// Byte address and bytes-per-pixel of a plane
    fn plane(&self, p: Plane) -> (u32, u32) {
        match p {
            Plane::Back => (self.addrs.back, 1),
            Plane::Front => (self.addrs.front, 4),
            Plane::Compose => (self.addrs.compose, 4),
            Plane::Bloom => (self.addrs.bloom, 1),
            Plane::BloomHalf => (self.addrs.bloom_half, 1),
            Plane::Scratch => (self.addrs.scratch, 1),
        }
    }

    fn claim() -> Result<(), BlitError> {
        BUSY.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| BlitError::Busy)
    }
}

impl BlitEngine for Dma2d {
    fn start_compose(&mut self, op: &ComposeOp) -> Result<(), BlitError> {
        Self::claim()?;
        // Back through the CLUT as background, front over it, full frame.
        write_reg(reg::BGMAR, self.addrs.back);
        write_reg(reg::BGOR, 0);
        write_reg(reg::FGMAR, self.addrs.front);
        write_reg(reg::FGOR, 0);
        write_reg(reg::FGPFCCR, PF_ARGB8888);
        write_reg(reg::OMAR, self.addrs.compose);
        write_reg(reg::OOR, 0);
        write_reg(reg::OPFCCR, PF_ARGB8888);
        write_reg(reg::NLR, (op.width << 16) | op.height);
        write_reg(reg::CR, CR_MODE_BLEND | CR_TCIE | CR_START);
        Ok(())
    }

    fn start_line_blend(&mut self, op: &LineBlendOp) -> Result<(), BlitError> {
        Self::claim()?;
        let (src0, bpp0) = self.plane(op.src0.0);
        let (src1, bpp1) = self.plane(op.src1.0);
        let (dst, bppd) = self.plane(op.dst.0);

        // A pitched run is N lines of one pixel; the line offset supplies
        // the pitch.
        write_reg(reg::BGMAR, src0 + op.src0.1 * bpp0);
        write_reg(reg::BGOR, op.src0_pitch - 1);
        write_reg(reg::FGMAR, src1 + op.src1.1 * bpp1);
        write_reg(reg::FGOR, op.src1_pitch - 1);
        write_reg(reg::FGPFCCR, PF_L8 | AM_REPLACE | ((op.coeff as u32) << 24));
        write_reg(reg::OMAR, dst + op.dst.1 * bppd);
        write_reg(reg::OOR, op.dst_pitch - 1);
        write_reg(reg::OPFCCR, PF_L8);
        write_reg(reg::NLR, (1 << 16) | op.len);
        write_reg(reg::CR, CR_MODE_BLEND | CR_TCIE | CR_START);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        engine_busy()
    }

    fn abort(&mut self) {
        write_reg(reg::CR, CR_ABORT);
        write_reg(reg::IFCR, IFCR_CTCIF);
        BUSY.store(false, Ordering::Release);
        // A completion that raced the abort must not wake the next
        // operation's wait.
        BLIT_DONE.reset();
    }
}
