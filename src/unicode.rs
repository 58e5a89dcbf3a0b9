//! Unicode utilities: repertoire classification and CIF name normalization.
//!
//! Normalization is NFD -> default case fold -> NFC (`spec.md` §3, "Name
//! normalization"), built on `unicode-normalization` (NFD/NFC) and `caseless`
//! (default case folding), the same `unicode-rs` family of crates the
//! teacher's dependency tree already pulls in transitively.

use caseless::Caseless;
use unicode_normalization::UnicodeNormalization;

/// Normalize a CIF name, block code, frame code, or table key for equality
/// comparison: NFD -> default case fold -> NFC.
///
/// Table keys and category names follow different rules (`spec.md` §3):
/// table-key *lookup* uses this normalization, but the last-inserted
/// original form is what's preserved for enumeration; category names are
/// compared byte-for-byte and must never be passed through this function.
pub fn normalize(s: &str) -> String {
    let decomposed: String = s.nfd().collect();
    let folded: String = decomposed.chars().default_case_fold().collect();
    folded.nfc().collect()
}

/// Whether two strings are CIF-name-equal under `spec.md` §3's rule.
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Inline whitespace, per `spec.md` §4.1, not counting caller-supplied
/// `extra_ws_chars`.
pub fn is_inline_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// End-of-line markers recognized before `extra_eol_chars` is consulted.
/// CR, LF, and CRLF are collapsed to one logical newline by the decoder
/// upstream of this check; this just identifies the raw markers.
pub fn is_eol(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Valid first character of a CIF data name, block code, or frame code tail
/// (after the leading `_`, `data_`, or `save_`): anything printable that
/// isn't whitespace or a structurally significant delimiter.
pub fn is_name_start(c: char) -> bool {
    is_name_continue(c)
}

/// Valid non-leading character of a CIF name. CIF 1.1/2.0 both define names
/// as any non-whitespace, non-control character excluding the characters
/// that are themselves structurally significant when they begin a token:
/// quote marks, and (CIF 2.0) `[`, `]`, `{`, `}`, `$`.
pub fn is_name_continue(c: char) -> bool {
    !c.is_whitespace()
        && !is_disallowed_control(c)
        && !is_lone_surrogate(c)
        && !is_noncharacter(c)
        && !matches!(c, '\'' | '"' | '[' | ']' | '{' | '}' | '$' | ':')
}

/// C0/C1 controls disallowed outright, per `spec.md` §4.1. Tab, LF, CR, FF,
/// and VT (when whitelisted by the caller) are not disallowed; those are
/// filtered out by the caller before this check runs.
pub fn is_disallowed_control(c: char) -> bool {
    let code = c as u32;
    let allowed_c0 = matches!(c, '\t' | '\n' | '\r' | '\u{0B}' | '\u{0C}');
    if code < 0x20 {
        return !allowed_c0;
    }
    if code == 0x7F {
        return true;
    }
    // C1 controls, all disallowed.
    (0x80..=0x9F).contains(&code)
}

/// Lone surrogate halves are invalid in a code point stream; Rust's `char`
/// cannot itself hold one, so this exists for the byte-decoding path, which
/// works with raw `u32` scalar values before they're validated into `char`.
pub fn is_lone_surrogate_scalar(v: u32) -> bool {
    (0xD800..=0xDFFF).contains(&v)
}

fn is_lone_surrogate(_c: char) -> bool {
    // Unreachable for a valid `char` (Rust's `char` excludes surrogates by
    // construction); kept for symmetry with `is_lone_surrogate_scalar` and
    // so callers can run the same classification function regardless of
    // which representation they hold.
    false
}

/// Unicode noncharacters: the last two code points of each plane, and
/// U+FDD0..=U+FDEF.
pub fn is_noncharacter(c: char) -> bool {
    let v = c as u32;
    if (0xFDD0..=0xFDEF).contains(&v) {
        return true;
    }
    (v & 0xFFFE) == 0xFFFE
}
