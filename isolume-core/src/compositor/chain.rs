//! Chained continuations for multi-stage resize pipelines
//!
//! A continuation is consulted from the completion context the moment a
//! resize finishes; returning an operation starts it immediately, so a
//! whole pyramid runs back to back without the caller waiting between
//! stages. Represented as typed state machines rather than callbacks so a
//! chain's remaining work is inspectable and testable.

use super::resize::ResizeOp;
use crate::config::{PANEL_H, PANEL_W};
use isolume_hal::Plane;

/// Supplier of the next resize operation in a pipeline
pub trait ResizeChain {
    /// Next operation to start immediately, or `None` to go idle
    fn next(&mut self) -> Option<ResizeOp>;
}

/// The empty continuation: one resize, then idle
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChain;

impl ResizeChain for NoChain {
    fn next(&mut self) -> Option<ResizeOp> {
        None
    }
}

/// Remaining stages of the bloom blur pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum BloomStage {
    DownQuarter,
    UpHalf,
    UpFull,
    Done,
}

/// Separable blur of the bloom plane: down, down, up, up
///
/// The accumulation plane doubles as the quarter-resolution level; by the
/// time the final up-sample overwrites it, the quarter data has already
/// been consumed.
#[derive(Debug, Clone, Copy)]
pub struct BloomChain {
    stage: BloomStage,
}

const FULL_W: u16 = PANEL_W as u16;
const FULL_H: u16 = PANEL_H as u16;
const HALF_W: u16 = FULL_W / 2;
const HALF_H: u16 = FULL_H / 2;
const QUARTER_W: u16 = FULL_W / 4;
const QUARTER_H: u16 = FULL_H / 4;

fn stage_op(src: Plane, sw: u16, sh: u16, dst: Plane, dw: u16, dh: u16) -> ResizeOp {
    ResizeOp {
        src,
        src_w: sw,
        src_h: sh,
        dst,
        dst_w: dw,
        dst_h: dh,
        scratch: Plane::Scratch,
    }
}

impl BloomChain {
    /// First operation of the pyramid plus the chain carrying the rest
    pub fn begin() -> (ResizeOp, Self) {
        (
            stage_op(Plane::Bloom, FULL_W, FULL_H, Plane::BloomHalf, HALF_W, HALF_H),
            Self {
                stage: BloomStage::DownQuarter,
            },
        )
    }

    /// Whether every stage has been handed out
    pub fn is_done(&self) -> bool {
        self.stage == BloomStage::Done
    }
}

impl ResizeChain for BloomChain {
    fn next(&mut self) -> Option<ResizeOp> {
        let (op, next) = match self.stage {
            BloomStage::DownQuarter => (
                Some(stage_op(
                    Plane::BloomHalf,
                    HALF_W,
                    HALF_H,
                    Plane::Bloom,
                    QUARTER_W,
                    QUARTER_H,
                )),
                BloomStage::UpHalf,
            ),
            BloomStage::UpHalf => (
                Some(stage_op(
                    Plane::Bloom,
                    QUARTER_W,
                    QUARTER_H,
                    Plane::BloomHalf,
                    HALF_W,
                    HALF_H,
                )),
                BloomStage::UpFull,
            ),
            BloomStage::UpFull => (
                Some(stage_op(
                    Plane::BloomHalf,
                    HALF_W,
                    HALF_H,
                    Plane::Bloom,
                    FULL_W,
                    FULL_H,
                )),
                BloomStage::Done,
            ),
            BloomStage::Done => (None, BloomStage::Done),
        };
        self.stage = next;
        op
    }
}
