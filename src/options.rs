//! Parse/write configuration and the CIF version marker.
//!
//! Grounded in the teacher crate's `CifVersion` (`crates/cif-parser/src/ast/document.rs`)
//! but threaded as a plain value the way `parser/block.rs` and `parser/value.rs`
//! already pass it around, rather than as a pair of trait objects — matching
//! `spec.md` §9's "best handled by a small state variable" guidance.

use crate::handler::{ErrorCallback, Handler, WhitespaceCallback};

/// Maximum physical line length, in code points, per `spec.md` §6.1.
pub const MAX_LINE_LENGTH: usize = 2048;

/// CIF syntax version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CifVersion {
    #[default]
    V1_1,
    V2_0,
}

impl CifVersion {
    pub fn is_v2(self) -> bool {
        matches!(self, CifVersion::V2_0)
    }
}

impl std::fmt::Display for CifVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CifVersion::V1_1 => write!(f, "CIF 1.1"),
            CifVersion::V2_0 => write!(f, "CIF 2.0"),
        }
    }
}

/// A tri-state modifier used by [`ParseOptions`] for features that a caller
/// may force on, force off, or leave to the version default (`spec.md` §6.2:
/// `line_folding_modifier`, `text_prefixing_modifier`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    ForceOff,
    #[default]
    VersionDefault,
    ForceOn,
}

impl Modifier {
    /// Resolve against the version's own default for the feature.
    pub fn resolve(self, version_default: bool) -> bool {
        match self {
            Modifier::ForceOff => false,
            Modifier::ForceOn => true,
            Modifier::VersionDefault => version_default,
        }
    }

    pub fn from_i8(v: i8) -> Self {
        if v < 0 {
            Modifier::ForceOff
        } else if v > 0 {
            Modifier::ForceOn
        } else {
            Modifier::VersionDefault
        }
    }
}

/// Options controlling encoding detection, version defaults, recursion
/// limits, and callback registration for a single parse (`spec.md` §6.2).
pub struct ParseOptions<'a> {
    /// Treat input lacking a CIF 2.0 magic comment as CIF 2.0 rather than 1.1.
    pub default_to_cif2: bool,
    /// Encoding name to assume absent a BOM or magic-comment hint.
    pub default_encoding_name: Option<String>,
    /// Bypass encoding detection entirely and use `default_encoding_name`.
    pub force_default_encoding: bool,
    /// Line-folding protocol override (`spec.md` §4.1).
    pub line_folding_modifier: Modifier,
    /// Text-prefix protocol override (`spec.md` §4.1).
    pub text_prefixing_modifier: Modifier,
    /// 0 = frames forbidden, 1 = one level, negative = unlimited.
    pub max_frame_depth: i32,
    /// Extra characters to additionally treat as inline whitespace.
    pub extra_ws_chars: Vec<char>,
    /// Extra characters to additionally treat as end-of-line.
    pub extra_eol_chars: Vec<char>,
    /// Structural traversal callbacks (`spec.md` §6.3), optional.
    pub handler: Option<&'a mut dyn Handler>,
    /// Called for every whitespace/comment run, if registered.
    pub whitespace_callback: Option<WhitespaceCallback<'a>>,
    /// Called for every detected error; `None` means "always recover".
    pub error_callback: Option<ErrorCallback<'a>>,
}

impl<'a> Default for ParseOptions<'a> {
    fn default() -> Self {
        Self {
            default_to_cif2: false,
            default_encoding_name: None,
            force_default_encoding: false,
            line_folding_modifier: Modifier::VersionDefault,
            text_prefixing_modifier: Modifier::VersionDefault,
            max_frame_depth: -1,
            extra_ws_chars: Vec::new(),
            extra_eol_chars: Vec::new(),
            handler: None,
            whitespace_callback: None,
            error_callback: None,
        }
    }
}

impl<'a> ParseOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: &'a mut dyn Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_error_callback(mut self, cb: ErrorCallback<'a>) -> Self {
        self.error_callback = Some(cb);
        self
    }

    pub fn with_whitespace_callback(mut self, cb: WhitespaceCallback<'a>) -> Self {
        self.whitespace_callback = Some(cb);
        self
    }
}

/// Options controlling serialization (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Target CIF version. Writing LIST/TABLE values with `V1_1` is an error.
    pub version: CifVersion,
    /// Allow triple-quoted forms in CIF 2.0 output when shorter than a text field.
    pub prefer_triple_quotes: bool,
    /// Fold long text-field lines (CIF 2.0 only option).
    pub fold_long_lines: bool,
    /// Maximum physical line length before a value must become a text field.
    pub max_line_length: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: CifVersion::V2_0,
            prefer_triple_quotes: true,
            fold_long_lines: false,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}
