//! Structured traversal callbacks shared by the parser and (per `spec.md`
//! §6.3) any future tree walker.
//!
//! The record-of-callbacks shape from `spec.md` §6.3 is expressed here as a
//! trait with one default-`Continue` method per structural event, so callers
//! only override what they need. Dispatch from the parser is direct —
//! `&mut dyn Handler` — matching the "non-virtual and direct" guidance of
//! `spec.md` §9 as closely as a trait object allows; callers who need zero
//! dynamic dispatch can instead call the generic parsing entry points with a
//! concrete `H: Handler` type.

use crate::container::{Block, Frame};
use crate::cif_loop::Loop;
use crate::error::CifErrorCode;
use crate::packet::Packet;
use crate::value::Value;

/// Return value of every [`Handler`] callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalControl {
    /// Proceed normally.
    Continue,
    /// Skip the remainder of the current structural element.
    SkipCurrent,
    /// Skip remaining siblings of the current element.
    SkipSiblings,
    /// Stop traversal entirely, successfully.
    End,
    /// Abort with the given error code.
    Abort(CifErrorCode),
}

/// Structural callback record (`spec.md` §6.3): one method per event in
/// cif → block → frame → loop → packet → item order.
///
/// All methods default to `Ok(TraversalControl::Continue)`.
#[allow(unused_variables)]
pub trait Handler {
    fn cif_start(&mut self) -> TraversalControl {
        TraversalControl::Continue
    }
    fn cif_end(&mut self) -> TraversalControl {
        TraversalControl::Continue
    }
    fn block_start(&mut self, code: &str) -> TraversalControl {
        TraversalControl::Continue
    }
    fn block_end(&mut self, block: &Block) -> TraversalControl {
        TraversalControl::Continue
    }
    fn frame_start(&mut self, code: &str) -> TraversalControl {
        TraversalControl::Continue
    }
    fn frame_end(&mut self, frame: &Frame) -> TraversalControl {
        TraversalControl::Continue
    }
    fn loop_start(&mut self, names: &[String]) -> TraversalControl {
        TraversalControl::Continue
    }
    fn loop_end(&mut self, cif_loop: &Loop) -> TraversalControl {
        TraversalControl::Continue
    }
    fn packet_start(&mut self) -> TraversalControl {
        TraversalControl::Continue
    }
    fn packet_end(&mut self, packet: &Packet) -> TraversalControl {
        TraversalControl::Continue
    }
    fn item(&mut self, name: &str, value: &Value) -> TraversalControl {
        TraversalControl::Continue
    }
}

/// A no-op handler, used when callers register only an error or whitespace
/// callback and don't need structural events.
#[derive(Default)]
pub struct NullHandler;
impl Handler for NullHandler {}

/// Called for every maximal or sub-maximal whitespace/comment run the lexer
/// produces, with its starting position and raw text (`spec.md` §4.1).
pub type WhitespaceCallback<'a> = &'a mut dyn FnMut(u32, u32, &str);

/// Called for every detected error. Returning `true` aborts the parse with
/// that error's code; returning `false` invokes the built-in recovery
/// (`spec.md` §4.2, "Error callback").
pub type ErrorCallback<'a> = &'a mut dyn FnMut(CifErrorCode, u32, u32, &str) -> bool;
