//! CIF serialization (`spec.md` §4.4): render a [`Cif`] back to text.
//!
//! There's no writer in the teacher crate to generalize directly — it only
//! parses and validates — so this module is grounded in the teacher's own
//! delimiter/repertoire rules (`crates/cif-parser/src/rules/cif2.rs`,
//! `src/unicode.rs` here) read in reverse: the writer picks the narrowest
//! delimiter a value's text survives unambiguously, the mirror image of what
//! the lexer accepts for that delimiter on the way in.

use crate::container::{Block, Frame, ItemContainer};
use crate::document::Cif;
use crate::error::{CifError, CifErrorCode};
use crate::options::{CifVersion, WriteOptions};
use crate::value::{Table, Value};

/// Serialize `cif` to CIF text per `opts` (`spec.md` §4.4).
///
/// Returns [`CifErrorCode::DisallowedValue`] if `opts.version` is
/// [`CifVersion::V1_1`] and any value is a `LIST` or `TABLE` — those variants
/// are CIF 2.0-only and a silent downgrade (e.g. flattening a list into a
/// delimited string) would misrepresent what was stored, so writing fails
/// outright rather than guess at a lossy encoding.
pub fn write_to_string(cif: &Cif, opts: &WriteOptions) -> Result<String, CifError> {
    let mut out = String::new();
    if opts.version.is_v2() {
        out.push_str("#\\CIF_2.0\n");
    }
    for (i, block) in cif.blocks().iter().enumerate() {
        if i > 0 || opts.version.is_v2() {
            out.push('\n');
        }
        write_block(&mut out, block, opts)?;
    }
    Ok(out)
}

fn write_block(out: &mut String, block: &Block, opts: &WriteOptions) -> Result<(), CifError> {
    out.push_str("data_");
    out.push_str(block.code());
    out.push('\n');
    write_items(out, block.items(), opts)?;
    for frame in block.frames() {
        write_frame(out, frame, opts)?;
    }
    Ok(())
}

fn write_frame(out: &mut String, frame: &Frame, opts: &WriteOptions) -> Result<(), CifError> {
    out.push_str("save_");
    out.push_str(frame.code());
    out.push('\n');
    write_items(out, frame.items(), opts)?;
    out.push_str("save_\n");
    Ok(())
}

fn write_items(out: &mut String, items: &ItemContainer, opts: &WriteOptions) -> Result<(), CifError> {
    if let Some(scalars) = items.scalars_loop() {
        for name in scalars.names() {
            let value = scalars.get_scalar(name).cloned().unwrap_or(Value::Unk);
            out.push_str(name);
            out.push(' ');
            write_value(out, &value, opts)?;
            out.push('\n');
        }
    }
    for l in items.loops() {
        if l.is_scalars() {
            continue;
        }
        out.push_str("loop_\n");
        for name in l.names() {
            out.push_str(name);
            out.push('\n');
        }
        for packet in l.rows() {
            for (i, name) in l.names().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let value = packet.get(name).cloned().unwrap_or(Value::Unk);
                write_value(out, &value, opts)?;
            }
            out.push('\n');
        }
    }
    Ok(())
}

fn write_value(out: &mut String, value: &Value, opts: &WriteOptions) -> Result<(), CifError> {
    match value {
        Value::Unk => {
            out.push('?');
            Ok(())
        }
        Value::Na => {
            out.push('.');
            Ok(())
        }
        Value::Numb(n) => {
            out.push_str(n.text());
            Ok(())
        }
        Value::Char(s) => write_char_value(out, s, opts),
        Value::List(items) => {
            if !opts.version.is_v2() {
                return Err(CifErrorCode::DisallowedValue.into());
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item, opts)?;
            }
            out.push(']');
            Ok(())
        }
        Value::Table(t) => {
            if !opts.version.is_v2() {
                return Err(CifErrorCode::DisallowedValue.into());
            }
            write_table(out, t, opts)
        }
    }
}

fn write_table(out: &mut String, t: &Table, opts: &WriteOptions) -> Result<(), CifError> {
    out.push('{');
    for (i, (key, value)) in t.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_quoted(out, key, '\'');
        out.push(':');
        write_value(out, value, opts)?;
    }
    out.push('}');
    Ok(())
}

/// Choose the narrowest delimiter (bare, single-quoted, double-quoted,
/// triple-quoted, or text field) that round-trips `s` unambiguously
/// (`spec.md` §4.4, "Delimiter selection").
fn write_char_value(out: &mut String, s: &str, opts: &WriteOptions) -> Result<(), CifError> {
    if needs_text_field(s, opts) {
        return write_text_field(out, s, opts);
    }
    if is_safe_bare(s) {
        out.push_str(s);
        return Ok(());
    }
    if !s.contains('\'') {
        write_quoted(out, s, '\'');
        return Ok(());
    }
    if !s.contains('"') {
        write_quoted(out, s, '"');
        return Ok(());
    }
    if opts.version.is_v2() && opts.prefer_triple_quotes && !s.contains("'''") {
        out.push_str("'''");
        out.push_str(s);
        out.push_str("'''");
        return Ok(());
    }
    write_text_field(out, s, opts)
}

/// A value must become a text field if it spans multiple lines, is too long
/// to fit a single physical line, starts with a character that would be
/// misread as a delimiter or reserved word, or (lacking CIF 2.0 triple
/// quotes) contains both quote characters.
fn needs_text_field(s: &str, opts: &WriteOptions) -> bool {
    if s.contains('\n') {
        return true;
    }
    if s.chars().count() > opts.max_line_length {
        return true;
    }
    if !opts.version.is_v2() && s.contains('\'') && s.contains('"') {
        return true;
    }
    if s.is_empty() {
        return true;
    }
    false
}

/// Emit `s` as a `;...;` text field, escaping a leading `;` on any content
/// line with the text-prefix protocol (`spec.md` §4.4: "if a text field's
/// content contains a `;` at the start of a line, apply the text-prefix
/// protocol to escape it"). A line ending in a lone `\` can't safely combine
/// with the prefix protocol here (line-folding would reinterpret it as a
/// continuation on re-parse, per this lexer's documented fold+prefix
/// interaction in `lexer::text_field`), so that combination is an error.
fn write_text_field(out: &mut String, s: &str, opts: &WriteOptions) -> Result<(), CifError> {
    let lines: Vec<&str> = s.split('\n').collect();
    if lines.iter().any(|l| l.starts_with(';')) {
        if lines.iter().any(|l| l.ends_with('\\')) {
            return Err(CifErrorCode::DisallowedValue.into());
        }
        let mut prefix = String::from(">");
        while lines.iter().any(|l| l.starts_with(prefix.as_str())) {
            prefix.push('>');
        }
        out.push(';');
        out.push_str(&prefix);
        out.push('\\');
        out.push('\n');
        for line in &lines {
            out.push_str(&prefix);
            out.push_str(line);
            out.push('\n');
        }
        out.push(';');
        out.push('\n');
        return Ok(());
    }

    // Line-folding (`spec.md` §4.4: "fold long text-field lines as an option
    // in version 2"): only engaged when requested and actually needed, since
    // it changes the on-disk shape of the field. A content line that already
    // ends in `\` can't be told apart from a fold continuation on re-parse,
    // so that combination is rejected rather than silently corrupted.
    let needs_fold = opts.version.is_v2()
        && opts.fold_long_lines
        && lines.iter().any(|l| l.chars().count() > opts.max_line_length);
    if needs_fold {
        if lines.iter().any(|l| l.ends_with('\\')) {
            return Err(CifErrorCode::DisallowedValue.into());
        }
        out.push(';');
        out.push_str("\\\n");
        for line in &lines {
            write_folded_line(out, line, opts.max_line_length);
        }
        out.push(';');
        out.push('\n');
        return Ok(());
    }

    out.push(';');
    out.push('\n');
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push(';');
    out.push('\n');
    Ok(())
}

/// Emit one logical line, splitting it into `max_len`-wide chunks joined by
/// a trailing `\` continuation whenever it's longer than `max_len`
/// (`spec.md` §4.1's line-folding protocol, applied in reverse).
fn write_folded_line(out: &mut String, line: &str, max_len: usize) {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        out.push('\n');
        return;
    }
    let chunk_len = max_len.saturating_sub(1).max(1);
    let mut i = 0;
    while i < chars.len() {
        let end = (i + chunk_len).min(chars.len());
        let chunk: String = chars[i..end].iter().collect();
        out.push_str(&chunk);
        if end == chars.len() {
            out.push('\n');
        } else {
            out.push('\\');
            out.push('\n');
        }
        i = end;
    }
}

/// Whether `s` can be written completely undelimited: non-empty, contains no
/// inline/eol whitespace, doesn't start with a character that would be
/// misparsed as a reserved word or a delimiter, and isn't itself `?`/`.`
/// followed by nothing that would change its classification.
fn is_safe_bare(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if s.chars().any(|c| c.is_whitespace()) {
        return false;
    }
    let mut chars = s.chars();
    let first = chars.next().unwrap();
    if matches!(first, '\'' | '"' | '_' | '#' | '$' | ';' | '[' | ']' | '{' | '}') {
        return false;
    }
    let lower_prefix: String = s.chars().take(5).flat_map(|c| c.to_lowercase()).collect();
    if s.eq_ignore_ascii_case("loop_")
        || s.eq_ignore_ascii_case("stop_")
        || s.eq_ignore_ascii_case("global_")
        || lower_prefix == "data_"
        || lower_prefix == "save_"
    {
        return false;
    }
    // Would otherwise be classified as NUMB, UNK, or NA on read-back.
    if s == "?" || s == "." || crate::number::Number::parse(s).is_ok() {
        return false;
    }
    true
}

fn write_quoted(out: &mut String, s: &str, quote: char) {
    out.push(quote);
    out.push_str(s);
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Block;

    fn opts_v2() -> WriteOptions {
        WriteOptions::default()
    }

    fn opts_v1() -> WriteOptions {
        WriteOptions {
            version: CifVersion::V1_1,
            ..WriteOptions::default()
        }
    }

    #[test]
    fn writes_minimal_v2_document() {
        let cif = Cif::new();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert_eq!(out, "#\\CIF_2.0\n");
    }

    #[test]
    fn writes_scalar_item_bare() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut().set_scalar("_a", Value::Char("hello".into())).unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains("_a hello\n"));
    }

    #[test]
    fn quotes_value_containing_space() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_title", Value::Char("hi there".into()))
            .unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains("_title 'hi there'\n"));
    }

    #[test]
    fn list_under_v1_is_disallowed_value() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_l", Value::List(vec![Value::Unk]))
            .unwrap();
        cif.add_block(b).unwrap();
        let err = write_to_string(&cif, &opts_v1()).unwrap_err();
        assert_eq!(err.code(), CifErrorCode::DisallowedValue);
    }

    #[test]
    fn na_and_unk_round_trip_symbols() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut().set_scalar("_a", Value::Na).unwrap();
        b.items_mut().set_scalar("_b", Value::Unk).unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains("_a .\n"));
        assert!(out.contains("_b ?\n"));
    }

    #[test]
    fn writes_loop_with_multiple_packets() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        let mut l = crate::cif_loop::Loop::new(vec!["_a".to_string(), "_b".to_string()]).unwrap();
        for i in 0..2 {
            let mut p = crate::packet::Packet::new();
            p.insert("_a", Value::Char(i.to_string()));
            p.insert("_b", Value::Char("y".to_string()));
            l.add_packet(&p).unwrap();
        }
        b.items_mut().add_loop(l).unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains("loop_\n_a\n_b\n0 y\n1 y\n"));
    }

    #[test]
    fn multiline_value_becomes_text_field() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_note", Value::Char("line one\nline two".into()))
            .unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains(";\nline one\nline two\n;\n"));
    }

    #[test]
    fn text_field_with_leading_semicolon_line_uses_prefix_protocol() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_note", Value::Char("first\n;gotcha\nlast".into()))
            .unwrap();
        cif.add_block(b).unwrap();
        let out = write_to_string(&cif, &opts_v2()).unwrap();
        assert!(out.contains(";>\\\n>first\n>;gotcha\n>last\n;\n"));

        // Round-trips back to the original content through the parser.
        let mut opts = crate::options::ParseOptions::default();
        opts.default_to_cif2 = true;
        let reparsed = crate::parser::parse_str_to_cif(&out, &mut opts).unwrap();
        assert_eq!(
            reparsed.find_block("x").unwrap().items().get_scalar("_note"),
            Some(&Value::Char("first\n;gotcha\nlast".to_string()))
        );
    }

    #[test]
    fn long_line_is_folded_when_requested_and_round_trips() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        let long = "abcdefghij".repeat(5);
        b.items_mut()
            .set_scalar("_note", Value::Char(long.clone()))
            .unwrap();
        cif.add_block(b).unwrap();

        let opts = WriteOptions {
            fold_long_lines: true,
            max_line_length: 10,
            ..WriteOptions::default()
        };
        let out = write_to_string(&cif, &opts).unwrap();
        assert!(out.contains(";\\\n"));
        assert!(out.lines().any(|l| l.ends_with('\\') && l.len() <= 10));

        let mut popts = crate::options::ParseOptions::default();
        popts.default_to_cif2 = true;
        let reparsed = crate::parser::parse_str_to_cif(&out, &mut popts).unwrap();
        assert_eq!(
            reparsed.find_block("x").unwrap().items().get_scalar("_note"),
            Some(&Value::Char(long))
        );
    }

    #[test]
    fn long_line_is_not_folded_without_the_option() {
        let mut cif = Cif::new();
        let mut b = Block::new("x").unwrap();
        let long = "abcdefghij".repeat(5);
        b.items_mut()
            .set_scalar("_note", Value::Char(long.clone()))
            .unwrap();
        cif.add_block(b).unwrap();
        let opts = WriteOptions {
            max_line_length: 10,
            ..WriteOptions::default()
        };
        let out = write_to_string(&cif, &opts).unwrap();
        assert!(out.contains(&format!(";\n{long}\n;\n")));
    }
}
