//! # cif-parser
//!
//! A parser, typed value system, and writer for Crystallographic Information
//! Framework (CIF) files, covering both CIF 1.1 and CIF 2.0.
//!
//! ## What is CIF?
//!
//! CIF is a standard file format used in crystallography and chemistry to
//! store structured data about crystal structures, molecular information,
//! and related metadata. Files contain data blocks with key-value pairs,
//! loops (tables), save frames, and multi-line text fields.
//!
//! ## Key Parsing Challenges
//!
//! ### 1. Case-insensitive keywords and name equality
//! `data_`, `loop_`, `save_`, `global_`, and `stop_` are matched
//! case-insensitively; item names, block codes, and frame codes compare
//! equal under Unicode NFD -> default case fold -> NFC normalization rather
//! than byte equality (see [`unicode::normalize`]).
//!
//! ### 2. A numeric type that never loses precision
//! Crystallographic measurements routinely carry more significant digits
//! than `f64` preserves exactly, and standard uncertainties (`10.25(3)`) are
//! part of the value itself. [`Number`] stores the decimal digit string and
//! scale verbatim; `approx()` is available for callers who want a fast
//! binary approximation but isn't what round-trips through the writer.
//!
//! ### 3. Loops with an interruptible scan
//! A loop's column declarations and its row values are a single
//! uninterrupted run of tokens, but a scalar item or another `loop_` can
//! follow immediately after the last row — the parser (`parser::Parser`)
//! has to know where a loop's value run ends without a separate terminator.
//!
//! ### 4. Text field line-folding and prefix protocols
//! CIF 2.0 text fields (`;...;`) can declare a line-folding marker, a
//! per-line prefix, or both combined; decoding that combination is isolated
//! in the lexer's internal `text_field` submodule.
//!
//! ## Architecture
//!
//! Parsing is a single hand-written recursive-descent pass with one-token
//! lookahead ([`parser`]) over a hand-written lexer ([`lexer`]), rather than
//! a generated grammar: CIF's structure is irregular enough (interruptible
//! loops, version-dependent delimiters, deferred lexical errors) that a
//! PEG/grammar file would need as much hand-tuning as the recursive-descent
//! version, without the benefit of a single declarative source of truth.
//!
//! The in-memory model ([`document`], [`container`], [`cif_loop`],
//! [`packet`], [`value`], [`number`]) is independent of how it was built:
//! it can be parsed into, constructed by hand, or mutated through
//! [`iterator::PacketIterator`], and serialized back out through
//! [`writer`].
//!
//! ## Example
//!
//! ```
//! use cif_parser::Cif;
//!
//! let text = "data_example\n_cell_length_a 10.000\n_title 'My Structure'\n";
//! let cif = Cif::parse_str(text).unwrap();
//! let block = cif.find_block("example").unwrap();
//! assert!(block.items().get_scalar("_cell_length_a").unwrap().is_numb());
//! ```
//!
//! ## Working with loops
//!
//! ```
//! use cif_parser::Cif;
//!
//! let text = "data_atoms\nloop_\n_atom_site_label\n_atom_site_type_symbol\nC1 C\nN1 N\n";
//! let cif = Cif::parse_str(text).unwrap();
//! let block = cif.find_block("atoms").unwrap();
//! let loop_ = block.items().loops().iter().find(|l| !l.is_scalars()).unwrap();
//! assert_eq!(loop_.len(), 2);
//! ```

pub mod cif_loop;
pub mod container;
pub mod document;
pub mod encoding;
pub mod error;
pub mod handler;
pub mod iterator;
pub mod lexer;
pub mod number;
pub mod options;
pub mod packet;
pub mod parser;
pub mod store;
pub mod unicode;
pub mod value;
pub mod writer;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(feature = "python")]
pub mod python;

// ===== Re-exports =====

pub use cif_loop::{Loop, SCALARS_CATEGORY};
pub use container::{Block, Frame, ItemContainer};
pub use document::Cif;
pub use encoding::{decode as decode_bytes, detect as detect_encoding, DetectedEncoding, Detection};
pub use error::{CifError, CifErrorCode, Span};
pub use handler::{Handler, NullHandler, TraversalControl};
pub use iterator::PacketIterator;
pub use number::{Number, NotANumber};
pub use options::{CifVersion, Modifier, ParseOptions, WriteOptions, MAX_LINE_LENGTH};
pub use packet::Packet;
pub use parser::{parse_bytes_to_cif, parse_str_to_cif};
pub use store::{ContainerRef, MemoryStore, Store};
pub use value::{Table, Value};
pub use writer::write_to_string;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_parse_and_write_round_trip_scalar() {
        let cif = Cif::parse_str("data_x\n_a 'hi there'\n").unwrap();
        let out = cif.to_string_cif().unwrap();
        let reparsed = Cif::parse_str(&out).unwrap();
        assert_eq!(
            reparsed.find_block("x").unwrap().items().get_scalar("_a"),
            Some(&Value::Char("hi there".to_string()))
        );
    }
}
