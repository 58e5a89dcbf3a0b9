//! Byte-source encoding detection and decoding to a code-point stream.
//!
//! Isolated exactly as `spec.md` §9 calls for: "abstract the byte-source-to-
//! code-points conversion behind an interface that accepts a chosen encoding
//! and yields `(code_point, line, column)` triples." Non-UTF-8 transcoding
//! goes through `encoding_rs`, which is the crate the rest of the Rust
//! ecosystem reaches for here (the project-specific code-page registry
//! `spec.md` §1 calls out as an external collaborator is a different,
//! CIF-dictionary-driven concern and stays out of scope).

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::{CifError, CifErrorCode};
use crate::options::ParseOptions;
use crate::unicode::is_lone_surrogate_scalar;

/// A detected or forced text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    /// Fallback single-byte encoding used when nothing else is indicated.
    Latin1,
}

/// Outcome of sniffing the leading bytes of a CIF source.
pub struct Detection {
    pub encoding: DetectedEncoding,
    /// Number of leading bytes to skip (the BOM, if one was present).
    pub bom_len: usize,
    /// Whether the literal ASCII magic comment `#\CIF_2.0` was seen.
    pub saw_cif2_magic: bool,
}

/// Sniff a BOM, then a null-byte pattern, then the CIF 2.0 magic comment
/// (`spec.md` §4.1, "Encoding detection").
pub fn detect(bytes: &[u8], opts: &ParseOptions) -> Detection {
    if opts.force_default_encoding {
        let enc = match opts.default_encoding_name.as_deref() {
            Some("utf-16le") => DetectedEncoding::Utf16Le,
            Some("utf-16be") => DetectedEncoding::Utf16Be,
            Some("utf-32le") => DetectedEncoding::Utf32Le,
            Some("utf-32be") => DetectedEncoding::Utf32Be,
            Some("latin1") | Some("iso-8859-1") => DetectedEncoding::Latin1,
            _ => DetectedEncoding::Utf8,
        };
        return Detection {
            encoding: enc,
            bom_len: 0,
            saw_cif2_magic: bytes.starts_with(b"#\\CIF_2.0"),
        };
    }

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Detection {
            encoding: DetectedEncoding::Utf8,
            bom_len: 3,
            saw_cif2_magic: has_magic(&bytes[3..]),
        };
    }
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return Detection {
            encoding: DetectedEncoding::Utf32Le,
            bom_len: 4,
            saw_cif2_magic: false,
        };
    }
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return Detection {
            encoding: DetectedEncoding::Utf32Be,
            bom_len: 4,
            saw_cif2_magic: false,
        };
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Detection {
            encoding: DetectedEncoding::Utf16Le,
            bom_len: 2,
            saw_cif2_magic: false,
        };
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Detection {
            encoding: DetectedEncoding::Utf16Be,
            bom_len: 2,
            saw_cif2_magic: false,
        };
    }

    // No BOM: guess UTF-16/32 from the null-byte pattern of the first four
    // bytes, per `spec.md` §4.1.
    if bytes.len() >= 4 {
        let (b0, b1, b2, b3) = (bytes[0], bytes[1], bytes[2], bytes[3]);
        if b0 != 0 && b1 == 0 && b2 != 0 && b3 == 0 {
            return Detection {
                encoding: DetectedEncoding::Utf16Le,
                bom_len: 0,
                saw_cif2_magic: false,
            };
        }
        if b0 == 0 && b1 != 0 && b2 == 0 && b3 != 0 {
            return Detection {
                encoding: DetectedEncoding::Utf16Be,
                bom_len: 0,
                saw_cif2_magic: false,
            };
        }
        if b0 != 0 && b1 == 0 && b2 == 0 && b3 == 0 {
            return Detection {
                encoding: DetectedEncoding::Utf32Le,
                bom_len: 0,
                saw_cif2_magic: false,
            };
        }
        if b0 == 0 && b1 == 0 && b2 == 0 && b3 != 0 {
            return Detection {
                encoding: DetectedEncoding::Utf32Be,
                bom_len: 0,
                saw_cif2_magic: false,
            };
        }
    }

    if has_magic(bytes) {
        return Detection {
            encoding: DetectedEncoding::Utf8,
            bom_len: 0,
            saw_cif2_magic: true,
        };
    }

    let default = match opts.default_encoding_name.as_deref() {
        Some("latin1") | Some("iso-8859-1") => DetectedEncoding::Latin1,
        _ => DetectedEncoding::Utf8,
    };
    Detection {
        encoding: default,
        bom_len: 0,
        saw_cif2_magic: false,
    }
}

fn has_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"#\\CIF_2.0")
}

/// Decode a byte source to a flat `Vec<char>` given a detected encoding.
///
/// CR, CR+LF, and LF are *not* collapsed here; that is the lexer's job
/// (`spec.md` §4.1, "Line handling"), since the lexer also needs to treat
/// caller-supplied `extra_eol_chars` the same way, which this layer has no
/// knowledge of.
pub fn decode(bytes: &[u8], detection: &Detection) -> Result<Vec<char>, CifError> {
    let body = &bytes[detection.bom_len..];
    match detection.encoding {
        DetectedEncoding::Utf8 => decode_utf8(body),
        DetectedEncoding::Utf16Le => decode_via(body, UTF_16LE),
        DetectedEncoding::Utf16Be => decode_via(body, UTF_16BE),
        DetectedEncoding::Utf32Le => decode_utf32(body, true),
        DetectedEncoding::Utf32Be => decode_utf32(body, false),
        DetectedEncoding::Latin1 => decode_via(body, WINDOWS_1252),
    }
}

fn decode_utf8(body: &[u8]) -> Result<Vec<char>, CifError> {
    match std::str::from_utf8(body) {
        Ok(s) => Ok(s.chars().collect()),
        Err(_) => {
            // Lossy-decode but flag it: malformed UTF-8 surfaces as a wrong
            // encoding error to the caller while still producing a best
            // effort code-point stream (spec.md's recovery posture: accept
            // and continue).
            let (cow, _, had_errors) = encoding_rs::UTF_8.decode(body);
            if had_errors {
                log::warn!("input contains malformed UTF-8 sequences");
            }
            Ok(cow.chars().collect())
        }
    }
}

fn decode_via(body: &[u8], encoding: &'static Encoding) -> Result<Vec<char>, CifError> {
    let (cow, _, had_errors) = encoding.decode(body);
    if had_errors {
        log::warn!("input contains characters unmappable in {}", encoding.name());
    }
    Ok(cow.chars().collect())
}

fn decode_utf32(body: &[u8], little_endian: bool) -> Result<Vec<char>, CifError> {
    let mut out = Vec::with_capacity(body.len() / 4);
    for chunk in body.chunks(4) {
        if chunk.len() < 4 {
            break;
        }
        let scalar = if little_endian {
            u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        } else {
            u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
        };
        if is_lone_surrogate_scalar(scalar) {
            return Err(CifError::new(
                CifErrorCode::InvalidChar,
                Default::default(),
                format!("lone surrogate U+{:04X} in UTF-32 input", scalar),
            ));
        }
        match char::from_u32(scalar) {
            Some(c) => out.push(c),
            None => {
                return Err(CifError::new(
                    CifErrorCode::InvalidChar,
                    Default::default(),
                    format!("invalid scalar value U+{:04X} in UTF-32 input", scalar),
                ))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ParseOptions<'static> {
        ParseOptions::default()
    }

    #[test]
    fn detects_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'd', b'a', b't', b'a', b'_', b'x'];
        let d = detect(&bytes, &opts());
        assert_eq!(d.encoding, DetectedEncoding::Utf8);
        assert_eq!(d.bom_len, 3);
    }

    #[test]
    fn detects_cif2_magic_without_bom() {
        let bytes = b"#\\CIF_2.0\ndata_x\n";
        let d = detect(bytes, &opts());
        assert!(d.saw_cif2_magic);
        assert_eq!(d.encoding, DetectedEncoding::Utf8);
    }

    #[test]
    fn detects_utf16le_by_null_pattern() {
        let bytes = [b'd', 0x00, b'a', 0x00];
        let d = detect(&bytes, &opts());
        assert_eq!(d.encoding, DetectedEncoding::Utf16Le);
    }

    #[test]
    fn decodes_plain_ascii() {
        let d = detect(b"data_x\n", &opts());
        let chars = decode(b"data_x\n", &d).unwrap();
        assert_eq!(chars.iter().collect::<String>(), "data_x\n");
    }
}
