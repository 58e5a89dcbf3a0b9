//! Error taxonomy for CIF parsing, model manipulation, and writing.
//!
//! Mirrors the sibling `cif-validator` crate's error design: a plain
//! `Copy` enum identifies *which* condition occurred (`CifErrorCode`,
//! `spec.md` §6.5), while [`CifError`] pairs a code with a source
//! [`Span`] and a human-readable message for anything that needs to carry
//! context back to a caller or an error callback.

use std::fmt;
use thiserror::Error;

/// A location in the original input, in CIF terms: 1-based line and column,
/// plus the length in code points of the offending token (0 when not
/// applicable, e.g. for whole-document errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, length: u32) -> Self {
        Self { line, column, length }
    }

    pub fn point(line: u32, column: u32) -> Self {
        Self { line, column, length: 0 }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The single result-code enumeration referenced throughout `spec.md` §6.5.
///
/// `Ok` is deliberately absent: success is represented in Rust as
/// `Result::Ok(_)`, not as a member of this enum. Every other condition
/// `spec.md` calls out by name has a variant here, grouped the way the
/// spec groups them (general/resource, semantic, structural, I/O).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CifErrorCode {
    // ----- General / resource / misuse (spec.md §6.5, §7 kinds 4-5) -----
    /// Iteration has no more packets to yield.
    Finished,
    /// Unclassified failure.
    General,
    /// Allocation failure.
    Memory,
    /// A handle (loop/block/frame/iterator) no longer refers to live data.
    InvalidHandle,
    /// An invariant the implementation itself is responsible for was broken.
    Internal,
    /// A caller-supplied argument was invalid (e.g. an empty loop name list).
    Argument,
    /// An API was called in a state that does not permit the operation.
    Misuse,
    /// The requested operation is not supported by the backing store.
    NotSupported,
    /// The host environment (filesystem, allocator) failed.
    Environment,
    /// The calling application's callback aborted the operation.
    Client,

    // ----- Semantic errors (spec.md §7 kind 3) -----
    DuplicateBlockCode,
    InvalidBlockCode,
    MissingBlockCode,
    DuplicateFrameCode,
    InvalidFrameCode,
    MissingFrameCode,
    DuplicateItemName,
    InvalidItemName,
    MissingItemName,
    DuplicateLoopCategory,
    CategoryNotUnique,
    NoSuchLoop,
    ReservedLoop,
    WrongLoop,
    EmptyLoop,
    NullLoop,
    AmbiguousItem,
    InvalidPacket,
    PartialPacket,
    DisallowedValue,
    InvalidNumber,
    InvalidIndex,
    InvalidBareValue,

    // ----- I/O / encoding family (spec.md §4.1, §7 kind 1) -----
    InvalidChar,
    UnmappedChar,
    DisallowedChar,
    MissingSpace,
    MissingEndquote,
    UnclosedText,
    OverlengthLine,
    DisallowedInitialChar,
    WrongEncoding,

    // ----- Structural/grammar family (spec.md §4.2, §7 kind 2) -----
    NoBlockHeader,
    FrameNotAllowed,
    NoFrameTerm,
    UnexpectedTerm,
    EofInFrame,
    ReservedWord,
    MissingValue,
    UnexpectedValue,
    UnexpectedDelim,
    MissingDelim,
    MissingKey,
    UnquotedKey,
    MisquotedKey,
    NullKey,
    MissingPrefix,
}

impl CifErrorCode {
    /// Whether the default (built-in) recovery for this error lets parsing
    /// continue, or whether it is always fatal.
    ///
    /// Per `spec.md` §4.2/§7, almost every syntactic/semantic error has a
    /// defined recovery; only resource errors and a client-callback abort
    /// are unconditionally fatal.
    pub fn is_recoverable_by_default(self) -> bool {
        !matches!(
            self,
            CifErrorCode::Memory | CifErrorCode::Environment | CifErrorCode::Client
        )
    }
}

impl fmt::Display for CifErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The error type returned by fallible public functions.
///
/// Distinct from [`CifErrorCode`]: this is the `std::error::Error` a caller
/// matches on or displays, carrying the code plus where it happened.
#[derive(Debug, Error)]
pub enum CifError {
    #[error("{code} at {span}: {message}")]
    Syntax {
        code: CifErrorCode,
        span: Span,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Code(CifErrorCode),
}

impl CifError {
    pub fn new(code: CifErrorCode, span: Span, message: impl Into<String>) -> Self {
        CifError::Syntax {
            code,
            span,
            message: message.into(),
        }
    }

    pub fn code(&self) -> CifErrorCode {
        match self {
            CifError::Syntax { code, .. } => *code,
            CifError::Io(_) => CifErrorCode::Environment,
            CifError::Code(code) => *code,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CifError::Syntax { span, .. } => Some(*span),
            _ => None,
        }
    }
}

impl From<CifErrorCode> for CifError {
    fn from(code: CifErrorCode) -> Self {
        CifError::Code(code)
    }
}
