//! The CIF lexer (`spec.md` §4.1): version-dispatching token scanner over a
//! decoded code-point stream.
//!
//! Operates downstream of [`crate::encoding`]: by the time a [`Lexer`] is
//! constructed, the byte source has already been sniffed and decoded to a
//! flat `Vec<char>`. Version dispatch is "a small state variable, not
//! separate code paths" (`spec.md` §9): [`crate::options::CifVersion`] is
//! threaded through every call that needs version-conditional behavior
//! (triple-quote/list/table recognition, default folding/prefixing).

mod text_field;

use crate::error::{CifErrorCode, Span};
use crate::options::{CifVersion, Modifier};
use crate::unicode::{is_disallowed_control, is_inline_whitespace, is_noncharacter};

/// One lexical token, its source span, and its raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    DataBlockHeader,
    SaveFrameHeader,
    SaveFrameEnd,
    LoopKw,
    GlobalKw,
    StopKw,
    DataName,
    SingleQuoted,
    DoubleQuoted,
    TripleSingleQuoted,
    TripleDoubleQuoted,
    TextField,
    ListOpen,
    ListClose,
    TableOpen,
    TableClose,
    Colon,
    Comment,
    Whitespace,
    /// An unquoted token whose value classification (`?`, `.`, number, or
    /// plain text) is the parser's job (`spec.md` §4.2, "Value
    /// classification").
    Bare,
    Eof,
    /// A lexical-level error. The lexer has already applied its default
    /// recovery (accept the character, synthesize a delimiter, etc.) and
    /// this token is emitted alongside whatever token recovery produced, so
    /// the parser can drive the error callback without losing forward
    /// progress (`spec.md` §4.2, "Error callback").
    LexError(CifErrorCode),
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    version: CifVersion,
    line_folding_modifier: Modifier,
    text_prefixing_modifier: Modifier,
    max_line_length: usize,
    /// Column at which the current physical line started tracking, used to
    /// detect "`;` at start of a line" for text fields.
    at_line_start: bool,
    /// A protocol-level error (e.g. missing text-prefix) discovered while
    /// decoding the token just returned, retrieved via
    /// [`Lexer::take_pending_error`].
    pending_error: Option<(CifErrorCode, Span, String)>,
    current_line_len: usize,
}

impl Lexer {
    pub fn new(
        decoded: Vec<char>,
        version: CifVersion,
        extra_ws_chars: &[char],
        extra_eol_chars: &[char],
        line_folding_modifier: Modifier,
        text_prefixing_modifier: Modifier,
    ) -> Self {
        let normalized = normalize_lines(&decoded, extra_eol_chars, extra_ws_chars);
        Lexer {
            chars: normalized,
            pos: 0,
            line: 1,
            col: 1,
            version,
            line_folding_modifier,
            text_prefixing_modifier,
            max_line_length: crate::options::MAX_LINE_LENGTH,
            at_line_start: true,
            pending_error: None,
            current_line_len: 0,
        }
    }

    pub fn version(&self) -> CifVersion {
        self.version
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            if self.current_line_len > self.max_line_length && self.pending_error.is_none() {
                self.pending_error = Some((
                    CifErrorCode::OverlengthLine,
                    self.span_from(self.line, 1, self.current_line_len as u32),
                    String::new(),
                ));
            }
            self.current_line_len = 0;
            self.line += 1;
            self.col = 1;
            self.at_line_start = true;
        } else {
            self.current_line_len += 1;
            self.col += 1;
            self.at_line_start = false;
        }
        Some(c)
    }

    fn span_from(&self, start_line: u32, start_col: u32, len: u32) -> Span {
        Span::new(start_line, start_col, len)
    }

    /// Produce the next token. Returns `TokenKind::Eof` forever once input
    /// is exhausted.
    pub fn next_token(&mut self) -> Lexeme {
        let lexeme = self.next_token_inner();
        self.flag_missing_space(&lexeme);
        lexeme
    }

    /// Flag `CIF_MISSING_SPACE` (`spec.md` §4.1/§7) when a closing delimiter
    /// — a quoted string, a text field, or a CIF2 list/table close — is
    /// immediately followed by a non-whitespace character. Recovery assumes
    /// a space was there, so this never changes tokenization, only reports.
    fn flag_missing_space(&mut self, lexeme: &Lexeme) {
        if self.pending_error.is_some() {
            return;
        }
        let closes_a_value = matches!(
            lexeme.kind,
            TokenKind::SingleQuoted
                | TokenKind::DoubleQuoted
                | TokenKind::TripleSingleQuoted
                | TokenKind::TripleDoubleQuoted
                | TokenKind::TextField
                | TokenKind::ListClose
                | TokenKind::TableClose
        );
        if !closes_a_value {
            return;
        }
        if let Some(c) = self.peek() {
            if !is_inline_whitespace(c) && c != '\n' && !is_repertoire_violation(c) {
                self.pending_error = Some((CifErrorCode::MissingSpace, lexeme.span, String::new()));
            }
        }
    }

    fn next_token_inner(&mut self) -> Lexeme {
        let start_line = self.line;
        let start_col = self.col;

        let Some(c) = self.peek() else {
            return Lexeme {
                kind: TokenKind::Eof,
                span: self.span_from(start_line, start_col, 0),
                text: String::new(),
            };
        };

        if is_repertoire_violation(c) {
            self.bump();
            let code = if is_noncharacter(c) {
                CifErrorCode::InvalidChar
            } else {
                CifErrorCode::DisallowedChar
            };
            return Lexeme {
                kind: TokenKind::LexError(code),
                span: self.span_from(start_line, start_col, 1),
                text: c.to_string(),
            };
        }

        if is_inline_whitespace(c) || c == '\n' {
            return self.scan_whitespace(start_line, start_col);
        }

        if c == '#' {
            return self.scan_comment(start_line, start_col);
        }

        if c == ';' && self.at_line_start {
            return self.scan_text_field(start_line, start_col);
        }

        if self.version.is_v2() {
            match c {
                '[' => {
                    self.bump();
                    return self.tok(TokenKind::ListOpen, start_line, start_col, "[");
                }
                ']' => {
                    self.bump();
                    return self.tok(TokenKind::ListClose, start_line, start_col, "]");
                }
                '{' => {
                    self.bump();
                    return self.tok(TokenKind::TableOpen, start_line, start_col, "{");
                }
                '}' => {
                    self.bump();
                    return self.tok(TokenKind::TableClose, start_line, start_col, "}");
                }
                ':' => {
                    self.bump();
                    return self.tok(TokenKind::Colon, start_line, start_col, ":");
                }
                _ => {}
            }
        }

        if c == '\'' || c == '"' {
            return self.scan_quoted(c, start_line, start_col);
        }

        if c == '_' {
            return self.scan_data_name(start_line, start_col);
        }

        self.scan_bare(start_line, start_col)
    }

    fn tok(&self, kind: TokenKind, line: u32, col: u32, text: &str) -> Lexeme {
        Lexeme {
            kind,
            span: self.span_from(line, col, text.chars().count() as u32),
            text: text.to_string(),
        }
    }

    fn scan_whitespace(&mut self, start_line: u32, start_col: u32) -> Lexeme {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_inline_whitespace(c) || c == '\n' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Lexeme {
            kind: TokenKind::Whitespace,
            span: self.span_from(start_line, start_col, text.chars().count() as u32),
            text,
        }
    }

    fn scan_comment(&mut self, start_line: u32, start_col: u32) -> Lexeme {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        Lexeme {
            kind: TokenKind::Comment,
            span: self.span_from(start_line, start_col, text.chars().count() as u32),
            text,
        }
    }

    fn scan_data_name(&mut self, start_line: u32, start_col: u32) -> Lexeme {
        let mut text = String::new();
        text.push(self.bump().unwrap()); // '_'
        while let Some(c) = self.peek() {
            if is_token_terminator(c, self.version) {
                break;
            }
            text.push(c);
            self.bump();
        }
        Lexeme {
            kind: TokenKind::DataName,
            span: self.span_from(start_line, start_col, text.chars().count() as u32),
            text,
        }
    }

    fn scan_bare(&mut self, start_line: u32, start_col: u32) -> Lexeme {
        let first = self.peek().unwrap();
        let invalid_lead = (self.version == CifVersion::V1_1 && (first == '[' || first == ']'))
            || (self.version.is_v2() && first == '$');

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_token_terminator(c, self.version) {
                break;
            }
            text.push(c);
            self.bump();
        }

        let span = self.span_from(start_line, start_col, text.chars().count() as u32);
        if invalid_lead {
            return Lexeme {
                kind: TokenKind::LexError(CifErrorCode::InvalidBareValue),
                span,
                text,
            };
        }

        let lower = text.to_ascii_lowercase();
        if lower.starts_with("data_") {
            return Lexeme {
                kind: TokenKind::DataBlockHeader,
                span,
                text: text[5..].to_string(),
            };
        }
        if lower.starts_with("save_") {
            if text.len() == 5 {
                return Lexeme {
                    kind: TokenKind::SaveFrameEnd,
                    span,
                    text: String::new(),
                };
            }
            return Lexeme {
                kind: TokenKind::SaveFrameHeader,
                span,
                text: text[5..].to_string(),
            };
        }
        if lower == "loop_" {
            return Lexeme {
                kind: TokenKind::LoopKw,
                span,
                text,
            };
        }
        if lower == "global_" {
            return Lexeme {
                kind: TokenKind::GlobalKw,
                span,
                text,
            };
        }
        if lower == "stop_" {
            return Lexeme {
                kind: TokenKind::StopKw,
                span,
                text,
            };
        }

        Lexeme {
            kind: TokenKind::Bare,
            span,
            text,
        }
    }

    fn scan_quoted(&mut self, quote: char, start_line: u32, start_col: u32) -> Lexeme {
        if self.version.is_v2() && self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote)
        {
            return self.scan_triple_quoted(quote, start_line, start_col);
        }

        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Lexeme {
                        kind: TokenKind::LexError(CifErrorCode::MissingEndquote),
                        span: self.span_from(start_line, start_col, text.chars().count() as u32 + 1),
                        text,
                    };
                }
                Some(c) if c == quote => {
                    let next = self.peek_at(1);
                    let terminates = next.is_none()
                        || next.map(|n| is_inline_whitespace(n) || n == '\n').unwrap_or(false);
                    if terminates {
                        self.bump();
                        let kind = if quote == '\'' {
                            TokenKind::SingleQuoted
                        } else {
                            TokenKind::DoubleQuoted
                        };
                        return Lexeme {
                            kind,
                            span: self.span_from(
                                start_line,
                                start_col,
                                text.chars().count() as u32 + 2,
                            ),
                            text,
                        };
                    }
                    text.push(c);
                    self.bump();
                }
                Some('\n') => {
                    return Lexeme {
                        kind: TokenKind::LexError(CifErrorCode::MissingEndquote),
                        span: self.span_from(start_line, start_col, text.chars().count() as u32 + 1),
                        text,
                    };
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn scan_triple_quoted(&mut self, quote: char, start_line: u32, start_col: u32) -> Lexeme {
        self.bump();
        self.bump();
        self.bump();
        let mut text = String::new();
        loop {
            if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                self.bump();
                self.bump();
                self.bump();
                let kind = if quote == '\'' {
                    TokenKind::TripleSingleQuoted
                } else {
                    TokenKind::TripleDoubleQuoted
                };
                return Lexeme {
                    kind,
                    span: self.span_from(start_line, start_col, text.chars().count() as u32 + 6),
                    text,
                };
            }
            match self.bump() {
                Some(c) => text.push(c),
                None => {
                    return Lexeme {
                        kind: TokenKind::LexError(CifErrorCode::UnclosedText),
                        span: self.span_from(start_line, start_col, text.chars().count() as u32 + 3),
                        text,
                    };
                }
            }
        }
    }

    /// Scan a `;`-delimited text field starting at the current position
    /// (guaranteed `at_line_start`). Applies line-folding / text-prefix
    /// decoding per `spec.md` §4.1 and returns the decoded content as the
    /// token text. A missing-prefix condition is reported as a trailing
    /// `LexError` queued for the caller to retrieve via `take_pending_error`.
    fn scan_text_field(&mut self, start_line: u32, start_col: u32) -> Lexeme {
        self.bump(); // opening ';'
        let mut raw_lines: Vec<String> = Vec::new();
        let mut current = String::new();
        loop {
            match self.peek() {
                None => {
                    raw_lines.push(current);
                    let content = raw_lines.join("\n");
                    return Lexeme {
                        kind: TokenKind::LexError(CifErrorCode::UnclosedText),
                        span: self.span_from(start_line, start_col, content.chars().count() as u32),
                        text: content,
                    };
                }
                Some('\n') => {
                    self.bump();
                    if self.peek() == Some(';') {
                        raw_lines.push(std::mem::take(&mut current));
                        self.bump(); // closing ';'
                        let refs: Vec<&str> = raw_lines.iter().map(|s| s.as_str()).collect();
                        let decoded = text_field::decode(
                            &refs,
                            self.line_folding_modifier,
                            self.text_prefixing_modifier,
                            self.version,
                        );
                        let span = self.span_from(
                            start_line,
                            start_col,
                            decoded.content.chars().count() as u32,
                        );
                        if decoded.missing_prefix_lines > 0 {
                            self.pending_error =
                                Some((CifErrorCode::MissingPrefix, span, decoded.content.clone()));
                        }
                        return Lexeme {
                            kind: TokenKind::TextField,
                            span,
                            text: decoded.content,
                        };
                    }
                    raw_lines.push(std::mem::take(&mut current));
                }
                Some(c) => {
                    current.push(c);
                    self.bump();
                }
            }
        }
    }

    /// Retrieve a protocol error (e.g. `MissingPrefix`) discovered mid-scan
    /// of a just-returned token, if any.
    pub fn take_pending_error(&mut self) -> Option<(CifErrorCode, Span, String)> {
        self.pending_error.take()
    }
}

fn is_repertoire_violation(c: char) -> bool {
    is_disallowed_control(c) || is_noncharacter(c)
}

fn is_token_terminator(c: char, version: CifVersion) -> bool {
    if is_inline_whitespace(c) || c == '\n' {
        return true;
    }
    if version.is_v2() {
        matches!(c, '[' | ']' | '{' | '}' | ':')
    } else {
        false
    }
}

/// Collapse CR, CRLF, and caller-supplied extra EOL/whitespace characters to
/// their canonical forms (`spec.md` §4.1, "Line handling").
fn normalize_lines(chars: &[char], extra_eol: &[char], extra_ws: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\r' {
            out.push('\n');
            if chars.get(i + 1) == Some(&'\n') {
                i += 1;
            }
        } else if c == '\n' {
            out.push('\n');
        } else if extra_eol.contains(&c) {
            out.push('\n');
        } else if extra_ws.contains(&c) {
            out.push(' ');
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str, version: CifVersion) -> Vec<Lexeme> {
        let mut lexer = Lexer::new(
            src.chars().collect(),
            version,
            &[],
            &[],
            Modifier::VersionDefault,
            Modifier::VersionDefault,
        );
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token();
            let done = t.kind == TokenKind::Eof;
            out.push(t);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_data_block_header() {
        let toks = lex_all("data_foo\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::DataBlockHeader);
        assert_eq!(toks[0].text, "foo");
    }

    #[test]
    fn scans_save_frame_header_and_terminator() {
        let toks = lex_all("save_bar\nsave_\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::SaveFrameHeader);
        assert_eq!(toks[0].text, "bar");
        let term = toks.iter().find(|t| t.kind == TokenKind::SaveFrameEnd);
        assert!(term.is_some());
    }

    #[test]
    fn scans_single_quoted_string() {
        let toks = lex_all("'don''t stop'\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::SingleQuoted);
    }

    #[test]
    fn single_quote_terminates_only_before_whitespace() {
        let toks = lex_all("'it''s fine' \n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::SingleQuoted);
        assert_eq!(toks[0].text, "it''s fine");
    }

    #[test]
    fn cif1_list_bracket_is_invalid_bare_value() {
        let toks = lex_all("[oops]\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::LexError(CifErrorCode::InvalidBareValue));
    }

    #[test]
    fn cif2_recognizes_list_delimiters() {
        let toks = lex_all("[1 2]\n", CifVersion::V2_0);
        assert_eq!(toks[0].kind, TokenKind::ListOpen);
    }

    #[test]
    fn text_field_is_decoded() {
        let toks = lex_all(";hello\nworld\n;\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::TextField);
        assert_eq!(toks[0].text, "hello\nworld");
    }

    #[test]
    fn unterminated_single_quote_reported() {
        let toks = lex_all("'oops\n", CifVersion::V1_1);
        assert_eq!(toks[0].kind, TokenKind::LexError(CifErrorCode::MissingEndquote));
    }
}
