//! The parser / state machine (`spec.md` §4.2): consumes lexer tokens,
//! enforces grammar, detects errors, invokes callbacks, and (unless running
//! in syntax-only mode) builds the in-memory model.
//!
//! The states named in `spec.md` §4.2 (`TOP`, `BLOCK`, `FRAME`,
//! `LOOP_HEADER`, `LOOP_VALUES`, `VALUE_EXPECTED`, `LIST_VALUES`,
//! `TABLE_ENTRIES`, `TABLE_VALUE`) are not reified as a single enum here;
//! each is a distinct parsing function (`parse_block`, `parse_loop`,
//! `parse_value`, ...) the way a hand-written recursive-descent parser
//! naturally expresses a state machine whose states nest — matching the
//! teacher's `parser/block.rs` / `parser/value.rs` split of one function per
//! grammar production rather than one dispatch loop over an explicit state
//! enum.
//!
//! Handler callbacks (`spec.md` §6.3) need concrete references into the
//! model being built (`&Block`, `&Loop`, ...), so the primary entry points
//! here build directly into an owned [`Cif`] (via [`MemoryStore`]) rather
//! than through the generic [`crate::store::Store`] trait object: that trait
//! remains the documented boundary for store-level operations decoupled
//! from a live parse (see `crate::store`), while parsing itself uses the
//! concrete tree so traversal callbacks have something to hand back.
//! "Syntax-only mode" (`spec.md` §4.2, no sink registered) is implemented by
//! making the destination optional and tracking the same duplicate-code/
//! duplicate-item bookkeeping either way.

use std::collections::HashSet;

use crate::cif_loop::Loop;
use crate::container::{Block, Frame};
use crate::document::Cif;
use crate::error::{CifError, CifErrorCode, Span};
use crate::handler::TraversalControl;
use crate::lexer::{Lexeme, Lexer, TokenKind};
use crate::number::Number;
use crate::options::{CifVersion, ParseOptions};
use crate::packet::Packet;
use crate::store::MemoryStore;
use crate::unicode::normalize;
use crate::value::{Table, Value};

/// Parse `text` with default-constructed options into a freshly built `Cif`.
pub fn parse_str_to_cif(text: &str, opts: &mut ParseOptions) -> Result<Cif, CifError> {
    let mut store = MemoryStore::new();
    parse_str_into(text, opts, Some(&mut store))?;
    Ok(store.into_cif())
}

/// Parse raw bytes (running encoding detection first) into a freshly built
/// `Cif` (`spec.md` §4.1, "Encoding detection").
pub fn parse_bytes_to_cif(bytes: &[u8], opts: &mut ParseOptions) -> Result<Cif, CifError> {
    let detection = crate::encoding::detect(bytes, opts);
    let chars = crate::encoding::decode(bytes, &detection)?;
    if detection.saw_cif2_magic && detection.encoding != crate::encoding::DetectedEncoding::Utf8 {
        log::warn!("CIF 2.0 magic comment seen with a non-UTF-8 encoding");
        if let Some(cb) = opts.error_callback.as_mut() {
            let abort = cb(CifErrorCode::WrongEncoding, 1, 1, "");
            if abort {
                return Err(CifError::new(
                    CifErrorCode::WrongEncoding,
                    Span::point(1, 1),
                    format!("{}", CifErrorCode::WrongEncoding),
                ));
            }
        }
    }
    let version = if detection.saw_cif2_magic || opts.default_to_cif2 {
        CifVersion::V2_0
    } else {
        CifVersion::V1_1
    };
    let mut store = MemoryStore::new();
    let mut parser = Parser::new(chars, version, opts);
    parser.run(opts, Some(&mut store))?;
    Ok(store.into_cif())
}

/// Parse `text` (already decoded) into `store` (or syntax-only if `None`).
pub fn parse_str_into(
    text: &str,
    opts: &mut ParseOptions,
    store: Option<&mut MemoryStore>,
) -> Result<(), CifError> {
    let version = if text.starts_with("#\\CIF_2.0") {
        CifVersion::V2_0
    } else if opts.default_to_cif2 {
        CifVersion::V2_0
    } else {
        CifVersion::V1_1
    };
    let chars: Vec<char> = text.chars().collect();
    let mut parser = Parser::new(chars, version, opts);
    parser.run(opts, store)
}

struct Parser {
    lexer: Lexer,
    version: CifVersion,
    max_frame_depth: i32,
    pending: Option<Lexeme>,
    block_codes: HashSet<String>,
}

impl Parser {
    fn new(chars: Vec<char>, version: CifVersion, opts: &ParseOptions) -> Self {
        let lexer = Lexer::new(
            chars,
            version,
            &opts.extra_ws_chars,
            &opts.extra_eol_chars,
            opts.line_folding_modifier,
            opts.text_prefixing_modifier,
        );
        Parser {
            lexer,
            version,
            max_frame_depth: opts.max_frame_depth,
            pending: None,
            block_codes: HashSet::new(),
        }
    }

    fn report(&mut self, opts: &mut ParseOptions, code: CifErrorCode, span: Span, text: &str) -> Result<(), CifError> {
        if let Some(cb) = opts.error_callback.as_mut() {
            let abort = cb(code, span.line, span.column, text);
            if abort {
                return Err(CifError::new(code, span, format!("{}", code)));
            }
        }
        Ok(())
    }

    /// Interpret a [`TraversalControl`] returned from a handler callback
    /// (`spec.md` §6.3): `Abort` is routed through the error callback and
    /// turned into a hard parse failure; `End` tells the caller to stop
    /// walking the current container early. `SkipCurrent`/`SkipSiblings`
    /// are accepted but, in this streaming single-pass parser, collapse to
    /// `Continue` — there is no already-built sibling subtree to discard,
    /// only tokens still to come off the lexer.
    fn on_control(&mut self, opts: &mut ParseOptions, ctl: TraversalControl, span: Span) -> Result<bool, CifError> {
        match ctl {
            TraversalControl::Abort(code) => {
                self.report(opts, code, span, "")?;
                Err(CifError::new(code, span, format!("{}", code)))
            }
            TraversalControl::End => Ok(true),
            TraversalControl::Continue | TraversalControl::SkipCurrent | TraversalControl::SkipSiblings => Ok(false),
        }
    }

    /// Retrieve the next *significant* token: whitespace/comments are routed
    /// to the whitespace callback and skipped; lexical errors (including
    /// ones discovered mid-scan, e.g. overlength lines or missing prefixes)
    /// are routed to the error callback and then skipped for recovery.
    fn bump(&mut self, opts: &mut ParseOptions) -> Result<Lexeme, CifError> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        loop {
            let t = self.lexer.next_token();
            if let Some((code, span, text)) = self.lexer.take_pending_error() {
                self.report(opts, code, span, &text)?;
            }
            match &t.kind {
                TokenKind::Whitespace | TokenKind::Comment => {
                    if let Some(cb) = opts.whitespace_callback.as_mut() {
                        cb(t.span.line, t.span.column, &t.text);
                    }
                    continue;
                }
                TokenKind::LexError(code) => {
                    self.report(opts, *code, t.span, &t.text)?;
                    continue;
                }
                _ => return Ok(t),
            }
        }
    }

    fn peek(&mut self, opts: &mut ParseOptions) -> Result<Lexeme, CifError> {
        if self.pending.is_none() {
            self.pending = Some(self.bump(opts)?);
        }
        Ok(self.pending.clone().unwrap())
    }

    fn run(&mut self, opts: &mut ParseOptions, mut store: Option<&mut MemoryStore>) -> Result<(), CifError> {
        let start_ctl = opts.handler.as_mut().map(|h| h.cif_start());
        if let Some(ctl) = start_ctl {
            if self.on_control(opts, ctl, Span::point(1, 1))? {
                return Ok(());
            }
        }

        let mut seen_any_token_before_block = false;
        loop {
            let t = self.bump(opts)?;
            match t.kind {
                TokenKind::Eof => break,
                TokenKind::DataBlockHeader => {
                    self.parse_block(opts, t.text, t.span, store.as_deref_mut())?;
                }
                _ => {
                    if !seen_any_token_before_block {
                        self.report(opts, CifErrorCode::NoBlockHeader, t.span, &t.text)?;
                        seen_any_token_before_block = true;
                    }
                }
            }
        }

        let end_ctl = opts.handler.as_mut().map(|h| h.cif_end());
        if let Some(ctl) = end_ctl {
            let _ = self.on_control(opts, ctl, Span::point(1, 1))?;
        }
        Ok(())
    }

    fn parse_block(
        &mut self,
        opts: &mut ParseOptions,
        code: String,
        span: Span,
        mut store: Option<&mut MemoryStore>,
    ) -> Result<(), CifError> {
        let norm = normalize(&code);
        let duplicate = !self.block_codes.insert(norm);
        if duplicate {
            self.report(opts, CifErrorCode::DuplicateBlockCode, span, &code)?;
        }
        if crate::container::validate_code(&code).is_err() {
            self.report(opts, CifErrorCode::InvalidBlockCode, span, &code)?;
        }

        let start_ctl = opts.handler.as_mut().map(|h| h.block_start(&code));
        if let Some(ctl) = start_ctl {
            if self.on_control(opts, ctl, span)? {
                return Ok(());
            }
        }

        if !duplicate {
            if let Some(s) = store.as_deref_mut() {
                let _ = s.cif_mut().add_block(Block::new(code.as_str()).unwrap_or_else(|_| {
                    // validate_code already reported; fall back to a
                    // synthesized placeholder code so the model stays
                    // structurally valid for recovery.
                    Block::new("_invalid").expect("placeholder code is valid")
                }));
            }
        }

        let mut frame_codes: HashSet<String> = HashSet::new();
        loop {
            let t = self.peek(opts)?;
            match t.kind {
                TokenKind::Eof | TokenKind::DataBlockHeader => break,
                TokenKind::SaveFrameHeader => {
                    self.bump(opts)?;
                    self.parse_frame(opts, t.text, t.span, &code, &mut frame_codes, store.as_deref_mut(), 1)?;
                }
                TokenKind::SaveFrameEnd => {
                    self.bump(opts)?;
                    self.report(opts, CifErrorCode::UnexpectedTerm, t.span, "save_")?;
                }
                TokenKind::LoopKw => {
                    self.bump(opts)?;
                    self.parse_loop(opts, &code, None, store.as_deref_mut())?;
                }
                TokenKind::DataName => {
                    self.bump(opts)?;
                    self.parse_scalar_item(opts, &code, None, t, store.as_deref_mut())?;
                }
                _ => {
                    self.bump(opts)?;
                    if is_reserved_kind(&t.kind) {
                        self.report(opts, CifErrorCode::ReservedWord, t.span, &t.text)?;
                    } else {
                        self.report(opts, CifErrorCode::MissingValue, t.span, &t.text)?;
                    }
                }
            }
        }

        if let Some(s) = store.as_deref_mut() {
            if let Some(b) = s.cif_mut().find_block_mut(&code) {
                b.items_mut().prune_empty_loops();
            }
        }
        let end_ctl = match (opts.handler.as_mut(), store.as_deref()) {
            (Some(h), Some(s)) => s.cif().find_block(&code).map(|b| h.block_end(b)),
            _ => None,
        };
        if let Some(ctl) = end_ctl {
            let _ = self.on_control(opts, ctl, span)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_frame(
        &mut self,
        opts: &mut ParseOptions,
        code: String,
        span: Span,
        block_code: &str,
        frame_codes: &mut HashSet<String>,
        mut store: Option<&mut MemoryStore>,
        depth: i32,
    ) -> Result<(), CifError> {
        if self.max_frame_depth == 0 {
            self.report(opts, CifErrorCode::FrameNotAllowed, span, &code)?;
            return Ok(());
        }
        if self.max_frame_depth > 0 && depth > self.max_frame_depth {
            self.report(opts, CifErrorCode::FrameNotAllowed, span, &code)?;
            return Ok(());
        }

        let norm = normalize(&code);
        let duplicate = !frame_codes.insert(norm);
        if duplicate {
            self.report(opts, CifErrorCode::DuplicateFrameCode, span, &code)?;
        }

        let start_ctl = opts.handler.as_mut().map(|h| h.frame_start(&code));
        if let Some(ctl) = start_ctl {
            if self.on_control(opts, ctl, span)? {
                return Ok(());
            }
        }

        if !duplicate {
            if let Some(s) = store.as_deref_mut() {
                if let Some(b) = s.cif_mut().find_block_mut(block_code) {
                    let _ = b.add_frame(Frame::new(code.as_str()).unwrap_or_else(|_| {
                        Frame::new("_invalid").expect("placeholder code is valid")
                    }));
                }
            }
        }

        loop {
            let t = self.peek(opts)?;
            match t.kind {
                TokenKind::Eof => {
                    self.report(opts, CifErrorCode::EofInFrame, t.span, "")?;
                    break;
                }
                TokenKind::SaveFrameEnd => {
                    self.bump(opts)?;
                    break;
                }
                TokenKind::DataBlockHeader | TokenKind::SaveFrameHeader => {
                    self.report(opts, CifErrorCode::NoFrameTerm, t.span, &t.text)?;
                    break;
                }
                TokenKind::LoopKw => {
                    self.bump(opts)?;
                    self.parse_loop(opts, block_code, Some(&code), store.as_deref_mut())?;
                }
                TokenKind::DataName => {
                    self.bump(opts)?;
                    self.parse_scalar_item(opts, block_code, Some(&code), t, store.as_deref_mut())?;
                }
                _ => {
                    self.bump(opts)?;
                    if is_reserved_kind(&t.kind) {
                        self.report(opts, CifErrorCode::ReservedWord, t.span, &t.text)?;
                    } else {
                        self.report(opts, CifErrorCode::MissingValue, t.span, &t.text)?;
                    }
                }
            }
        }

        if let Some(s) = store.as_deref_mut() {
            if let Some(b) = s.cif_mut().find_block_mut(block_code) {
                if let Some(f) = b.find_frame_mut(&code) {
                    f.items_mut().prune_empty_loops();
                }
            }
        }
        let end_ctl = match (opts.handler.as_mut(), store.as_deref()) {
            (Some(h), Some(s)) => s
                .cif()
                .find_block(block_code)
                .and_then(|b| b.find_frame(&code))
                .map(|f| h.frame_end(f)),
            _ => None,
        };
        if let Some(ctl) = end_ctl {
            let _ = self.on_control(opts, ctl, span)?;
        }
        Ok(())
    }

    fn parse_scalar_item(
        &mut self,
        opts: &mut ParseOptions,
        block_code: &str,
        frame_code: Option<&str>,
        name_tok: Lexeme,
        mut store: Option<&mut MemoryStore>,
    ) -> Result<(), CifError> {
        let next = self.peek(opts)?;
        if is_reserved_kind(&next.kind) {
            self.bump(opts)?;
            self.report(opts, CifErrorCode::ReservedWord, next.span, &next.text)?;
            return Ok(());
        }
        if !is_value_start(&next.kind, self.version) {
            self.report(opts, CifErrorCode::MissingValue, name_tok.span, &name_tok.text)?;
            return Ok(());
        }
        let value = self.parse_value(opts)?;

        // Reject a stray second value directly following a scalar value
        // (`spec.md` §4.2: "otherwise... CIF_UNEXPECTED_VALUE (stray extra
        // value)").
        let maybe_extra = self.peek(opts)?;
        if is_value_start(&maybe_extra.kind, self.version) {
            self.bump(opts)?;
            self.report(opts, CifErrorCode::UnexpectedValue, maybe_extra.span, &maybe_extra.text)?;
        }

        let item_ctl = opts.handler.as_mut().map(|h| h.item(&name_tok.text, &value));
        let skip_store = match item_ctl {
            Some(ctl) => self.on_control(opts, ctl, name_tok.span)? || ctl == TraversalControl::SkipCurrent,
            None => false,
        };
        if skip_store {
            return Ok(());
        }

        if let Some(s) = store.as_deref_mut() {
            let items = match frame_code {
                None => s.cif_mut().find_block_mut(block_code).map(|b| b.items_mut()),
                Some(fc) => s
                    .cif_mut()
                    .find_block_mut(block_code)
                    .and_then(|b| b.find_frame_mut(fc))
                    .map(|f| f.items_mut()),
            };
            if let Some(items) = items {
                if let Err(code) = items.set_scalar(&name_tok.text, value) {
                    self.report(opts, code, name_tok.span, &name_tok.text)?;
                }
            }
        }
        Ok(())
    }

    fn parse_loop(
        &mut self,
        opts: &mut ParseOptions,
        block_code: &str,
        frame_code: Option<&str>,
        mut store: Option<&mut MemoryStore>,
    ) -> Result<(), CifError> {
        let mut names: Vec<String> = Vec::new();
        loop {
            let t = self.peek(opts)?;
            if t.kind == TokenKind::DataName {
                self.bump(opts)?;
                names.push(t.text);
            } else {
                break;
            }
        }

        if names.is_empty() {
            let t = self.peek(opts)?;
            self.report(opts, CifErrorCode::NullLoop, t.span, &t.text)?;
            return Ok(());
        }

        let names_span = {
            let t = self.peek(opts)?;
            t.span
        };
        let start_ctl = opts.handler.as_mut().map(|h| h.loop_start(&names));
        if let Some(ctl) = start_ctl {
            if self.on_control(opts, ctl, names_span)? {
                return Ok(());
            }
        }

        let mut values: Vec<Value> = Vec::new();
        loop {
            let t = self.peek(opts)?;
            if !is_value_start(&t.kind, self.version) {
                break;
            }
            values.push(self.parse_value(opts)?);
        }

        if values.is_empty() {
            let t = self.peek(opts)?;
            self.report(opts, CifErrorCode::EmptyLoop, t.span, &t.text)?;
            return Ok(());
        }

        if values.len() % names.len() != 0 {
            let t = self.peek(opts)?;
            self.report(opts, CifErrorCode::PartialPacket, t.span, &t.text)?;
        }

        let full_packets = values.len() / names.len();
        let mut cif_loop = match Loop::new(names.clone()) {
            Ok(l) => l,
            Err(code) => {
                let t = self.peek(opts)?;
                self.report(opts, code, t.span, &t.text)?;
                return Ok(());
            }
        };

        let mut stop_early = false;
        for pi in 0..full_packets {
            let mut packet = Packet::new();
            for (ni, name) in names.iter().enumerate() {
                packet.insert(name.clone(), values[pi * names.len() + ni].clone());
            }

            let packet_start_ctl = opts.handler.as_mut().map(|h| h.packet_start());
            if let Some(ctl) = packet_start_ctl {
                if self.on_control(opts, ctl, names_span)? {
                    stop_early = true;
                    break;
                }
            }

            let mut item_stop = false;
            if let Some(h) = opts.handler.as_mut() {
                for (name, value) in packet.iter() {
                    let ctl = h.item(name, value);
                    if ctl == TraversalControl::End {
                        item_stop = true;
                        break;
                    }
                    if let TraversalControl::Abort(code) = ctl {
                        return Err(CifError::new(code, names_span, format!("{}", code)));
                    }
                }
            }

            let packet_end_ctl = opts.handler.as_mut().map(|h| h.packet_end(&packet));
            if let Some(ctl) = packet_end_ctl {
                if self.on_control(opts, ctl, names_span)? {
                    item_stop = true;
                }
            }

            let _ = cif_loop.add_packet(&packet);

            if item_stop {
                stop_early = true;
                break;
            }
        }

        let end_ctl = opts.handler.as_mut().map(|h| h.loop_end(&cif_loop));
        if let (Some(ctl), false) = (end_ctl, stop_early) {
            let _ = self.on_control(opts, ctl, names_span)?;
        }

        if let Some(s) = store.as_deref_mut() {
            let items = match frame_code {
                None => s.cif_mut().find_block_mut(block_code).map(|b| b.items_mut()),
                Some(fc) => s
                    .cif_mut()
                    .find_block_mut(block_code)
                    .and_then(|b| b.find_frame_mut(fc))
                    .map(|f| f.items_mut()),
            };
            if let Some(items) = items {
                if items.add_loop(cif_loop).is_err() {
                    let t = self.peek(opts)?;
                    self.report(opts, CifErrorCode::DuplicateItemName, t.span, &t.text)?;
                }
            }
        }

        Ok(())
    }

    /// `spec.md` §4.2, "Value classification" + list/table literals.
    fn parse_value(&mut self, opts: &mut ParseOptions) -> Result<Value, CifError> {
        let t = self.bump(opts)?;
        match t.kind {
            TokenKind::SingleQuoted
            | TokenKind::DoubleQuoted
            | TokenKind::TripleSingleQuoted
            | TokenKind::TripleDoubleQuoted
            | TokenKind::TextField => Ok(Value::Char(t.text)),
            TokenKind::ListOpen => self.parse_list(opts),
            TokenKind::TableOpen => self.parse_table(opts),
            TokenKind::Bare => Ok(classify_bare(&t.text)),
            _ => {
                self.report(opts, CifErrorCode::MissingValue, t.span, &t.text)?;
                Ok(Value::Unk)
            }
        }
    }

    fn parse_list(&mut self, opts: &mut ParseOptions) -> Result<Value, CifError> {
        let mut items = Vec::new();
        loop {
            let t = self.peek(opts)?;
            match t.kind {
                TokenKind::ListClose => {
                    self.bump(opts)?;
                    break;
                }
                TokenKind::Eof => {
                    self.report(opts, CifErrorCode::MissingDelim, t.span, "]")?;
                    break;
                }
                _ if is_value_start(&t.kind, self.version) => {
                    items.push(self.parse_value(opts)?);
                }
                _ => {
                    self.bump(opts)?;
                    if is_reserved_kind(&t.kind) {
                        self.report(opts, CifErrorCode::ReservedWord, t.span, &t.text)?;
                    } else {
                        self.report(opts, CifErrorCode::UnexpectedDelim, t.span, &t.text)?;
                    }
                }
            }
        }
        Ok(Value::List(items))
    }

    fn parse_table(&mut self, opts: &mut ParseOptions) -> Result<Value, CifError> {
        let mut table = Table::new();
        loop {
            let t = self.peek(opts)?;
            match t.kind {
                TokenKind::TableClose => {
                    self.bump(opts)?;
                    break;
                }
                TokenKind::Eof => {
                    self.report(opts, CifErrorCode::MissingDelim, t.span, "}")?;
                    break;
                }
                TokenKind::Colon => {
                    self.bump(opts)?;
                    self.report(opts, CifErrorCode::NullKey, t.span, ":")?;
                    let _ = self.parse_value(opts)?;
                }
                TokenKind::ListOpen | TokenKind::TableOpen => {
                    // A list/table literal in key position (`spec.md` §4.2,
                    // "Table-key restriction"). Must still go through
                    // `parse_value` to consume its matching close delimiter —
                    // treating just the open token as the key would desync
                    // the token stream for everything that follows.
                    let key_span = t.span;
                    let _ = self.parse_value(opts)?;
                    self.report(opts, CifErrorCode::DisallowedValue, key_span, &t.text)?;

                    let colon = self.peek(opts)?;
                    if colon.kind == TokenKind::Colon {
                        self.bump(opts)?;
                        let _ = self.parse_value(opts)?;
                    }
                }
                _ if is_value_start(&t.kind, self.version) => {
                    let key_tok = self.bump(opts)?;
                    let key_kind_ok = matches!(
                        key_tok.kind,
                        TokenKind::SingleQuoted | TokenKind::DoubleQuoted
                    );
                    let key_kind_misquoted = matches!(
                        key_tok.kind,
                        TokenKind::TripleSingleQuoted | TokenKind::TripleDoubleQuoted | TokenKind::TextField
                    );
                    if !key_kind_ok {
                        let code = if key_kind_misquoted {
                            CifErrorCode::MisquotedKey
                        } else {
                            CifErrorCode::UnquotedKey
                        };
                        self.report(opts, code, key_tok.span, &key_tok.text)?;
                    }

                    let colon = self.peek(opts)?;
                    if colon.kind != TokenKind::Colon {
                        self.report(opts, CifErrorCode::MissingKey, colon.span, &colon.text)?;
                        table.insert(key_tok.text, Value::Unk);
                        continue;
                    }
                    self.bump(opts)?; // consume ':'
                    let value = self.parse_value(opts)?;
                    table.insert(key_tok.text, value);
                }
                _ => {
                    self.bump(opts)?;
                    if is_reserved_kind(&t.kind) {
                        self.report(opts, CifErrorCode::ReservedWord, t.span, &t.text)?;
                    } else {
                        self.report(opts, CifErrorCode::UnexpectedDelim, t.span, &t.text)?;
                    }
                }
            }
        }
        Ok(Value::Table(table))
    }
}

/// `global_`/`stop_` (`spec.md` §4.2, "Reserved words"): legal nowhere in
/// either CIF grammar, so any appearance where a construct is expected is
/// unconditionally `CIF_RESERVED_WORD`. `data_`/`save_`/loop_` headers are
/// deliberately excluded here — they remain legitimate structural recovery
/// points at every position this helper is consulted from, and flagging them
/// too would either double-report (the grammar already has a dedicated arm
/// for them) or discard a real block/frame/loop by consuming its header.
fn is_reserved_kind(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::GlobalKw | TokenKind::StopKw)
}

fn is_value_start(kind: &TokenKind, version: CifVersion) -> bool {
    match kind {
        TokenKind::SingleQuoted
        | TokenKind::DoubleQuoted
        | TokenKind::TripleSingleQuoted
        | TokenKind::TripleDoubleQuoted
        | TokenKind::TextField
        | TokenKind::Bare => true,
        TokenKind::ListOpen | TokenKind::TableOpen => version.is_v2(),
        _ => false,
    }
}

fn classify_bare(text: &str) -> Value {
    match text {
        "?" => Value::Unk,
        "." => Value::Na,
        _ => match Number::parse(text) {
            Ok(n) => Value::Numb(n),
            Err(_) => Value::Char(text.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NullHandler;

    fn parse(text: &str) -> Cif {
        let mut opts = ParseOptions::default();
        parse_str_to_cif(text, &mut opts).unwrap()
    }

    #[test]
    fn minimal_cif2_has_zero_blocks() {
        let cif = parse("#\\CIF_2.0\n");
        assert_eq!(cif.blocks().len(), 0);
    }

    #[test]
    fn block_code_uniqueness_under_normalization() {
        let mut errors = Vec::new();
        let mut opts = ParseOptions::default();
        let mut cb = |code: CifErrorCode, _l: u32, _c: u32, _t: &str| {
            errors.push(code);
            false
        };
        opts.error_callback = Some(&mut cb);
        let cif = parse_str_to_cif("data_ABC\ndata_abc\n", &mut opts).unwrap();
        assert!(errors.contains(&CifErrorCode::DuplicateBlockCode));
        assert_eq!(cif.blocks().len(), 1);
    }

    #[test]
    fn parses_scalar_items_and_numbers() {
        let cif = parse("data_x\n_cell_length_a 10.250(3)\n_title 'hi there'\n");
        let b = cif.find_block("x").unwrap();
        let v = b.items().get_scalar("_cell_length_a").unwrap();
        assert!(v.is_numb());
        let t = b.items().get_scalar("_title").unwrap();
        assert_eq!(t, &Value::Char("hi there".to_string()));
    }

    #[test]
    fn parses_loop_with_three_packets() {
        let cif = parse("data_x\nloop_\n_item1\n_item2\n1 a\n2 b\n3 c\n");
        let b = cif.find_block("x").unwrap();
        let l = b
            .items()
            .loops()
            .iter()
            .find(|l| !l.is_scalars())
            .unwrap();
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn parses_save_frame() {
        let cif = parse("data_x\nsave_frm\n_a 1\nsave_\n");
        let b = cif.find_block("x").unwrap();
        assert_eq!(b.frames().len(), 1);
        assert_eq!(b.frames()[0].code(), "frm");
    }

    #[test]
    fn parses_list_and_table_in_cif2() {
        let mut opts = ParseOptions::default();
        opts.default_to_cif2 = true;
        let cif = parse_str_to_cif(
            "data_x\n_item [1 2 3]\n_tbl {'a':1 'b':2}\n",
            &mut opts,
        )
        .unwrap();
        let b = cif.find_block("x").unwrap();
        let list = b.items().get_scalar("_item").unwrap();
        assert!(list.is_list());
        let tbl = b.items().get_scalar("_tbl").unwrap();
        assert!(tbl.is_table());
    }

    #[test]
    fn unquoted_handler_is_noop_default() {
        let mut h = NullHandler::default();
        assert_eq!(h.cif_start(), TraversalControl::Continue);
    }
}
