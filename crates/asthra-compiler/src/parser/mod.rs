//! Parser: recursive-descent with one-token lookahead (two for a few
//! disambiguations), producing a lossless Rowan CST (spec.md §4.3). Every
//! production attaches a span by construction — Rowan nodes always cover
//! exactly the tokens (and trivia) they were built from.
//!
//! On error the parser records a diagnostic, wraps the offending tokens in
//! an `Error` node, and resynchronizes; it never panics and always finishes
//! a tree, so downstream passes have as much AST as possible to work with.

pub mod ast;
pub mod cst;
mod grammar;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use crate::diagnostics::{DiagnosticKind, Diagnostics, Suggestion};
use crate::lexer::{self, Token};
use crate::source::SourceId;

use cst::{SyntaxKind, SyntaxNode, TokenSet};

/// Default recursion depth before the parser gives up on a pathologically
/// nested input rather than overflowing the native stack.
pub const DEFAULT_RECURSION_LIMIT: u32 = 256;

pub struct ParseOutput {
    pub green: GreenNode,
    pub diagnostics: Diagnostics,
}

impl ParseOutput {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }
}

/// Lex and parse one file into a lossless CST plus the diagnostics
/// accumulated along the way.
pub fn parse_source(source_id: SourceId, source: &str) -> ParseOutput {
    let mut diagnostics = Diagnostics::new();
    let tokens = lexer::tokenize(source_id, source, &mut diagnostics);
    let mut parser = Parser::new(source_id, source, tokens, diagnostics);
    grammar::source_file(&mut parser);
    let (green, diagnostics) = parser.finish();
    ParseOutput { green, diagnostics }
}

pub(crate) struct Parser<'src> {
    source_id: SourceId,
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    trivia_buffer: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    diagnostics: Diagnostics,
    depth: u32,
    last_error_pos: Option<TextSize>,
    /// Disabled while parsing the condition of `if`/`while`/`for`/`match`,
    /// so `if x { ... }` doesn't swallow the block as a struct literal.
    allow_struct_literal: bool,
}

impl<'src> Parser<'src> {
    fn new(source_id: SourceId, source: &'src str, tokens: Vec<Token>, diagnostics: Diagnostics) -> Self {
        Self {
            source_id,
            source,
            tokens,
            pos: 0,
            trivia_buffer: Vec::with_capacity(4),
            builder: GreenNodeBuilder::new(),
            diagnostics,
            depth: 0,
            last_error_pos: None,
            allow_struct_literal: true,
        }
    }

    fn finish(mut self) -> (GreenNode, Diagnostics) {
        self.drain_trivia();
        (self.builder.finish(), self.diagnostics)
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// True once nothing but trivia remains — checked after skipping
    /// trivia, so trailing whitespace/comments at end of file don't look
    /// like one more token to a caller's `while !p.should_stop()` loop.
    pub(crate) fn should_stop(&mut self) -> bool {
        self.current() == SyntaxKind::Error
    }

    fn raw_nth(&self, lookahead: usize) -> SyntaxKind {
        self.tokens.get(self.pos + lookahead).map_or(SyntaxKind::Error, |t| t.kind)
    }

    fn skip_trivia_to_buffer(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.trivia_buffer.push(self.tokens[self.pos]);
            self.pos += 1;
        }
    }

    /// Current significant (non-trivia) token kind.
    pub(crate) fn current(&mut self) -> SyntaxKind {
        self.skip_trivia_to_buffer();
        self.raw_nth(0)
    }

    /// `n`-th significant token kind ahead of `current()` (0 == current).
    pub(crate) fn nth(&mut self, n: usize) -> SyntaxKind {
        self.skip_trivia_to_buffer();
        let mut seen = 0usize;
        let mut idx = self.pos;
        while idx < self.tokens.len() {
            if !self.tokens[idx].kind.is_trivia() {
                if seen == n {
                    return self.tokens[idx].kind;
                }
                seen += 1;
            }
            idx += 1;
        }
        SyntaxKind::Error
    }

    pub(crate) fn current_span(&mut self) -> TextRange {
        self.skip_trivia_to_buffer();
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(TextSize::from(self.source.len() as u32)), |t| t.span)
    }

    pub(crate) fn currently_is(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn currently_is_one_of(&mut self, set: TokenSet) -> bool {
        set.contains(self.current())
    }

    /// Source text of the current significant token, or `""` at EOF.
    pub(crate) fn current_text(&mut self) -> &str {
        self.skip_trivia_to_buffer();
        self.tokens.get(self.pos).map_or("", |t| t.text(self.source))
    }

    pub(crate) fn at_wildcard_ident(&mut self) -> bool {
        self.currently_is(SyntaxKind::Ident) && self.current_text() == "_"
    }

    /// Force any buffered trivia into the tree as children of whatever node
    /// is currently open. Only the `SourceFile` production needs this
    /// directly, to attach trailing trivia before closing the root — every
    /// other node relies on the next `start_node`/`bump` to claim it first.
    pub(crate) fn drain_pending_trivia(&mut self) {
        self.drain_trivia();
    }

    fn drain_trivia(&mut self) {
        for token in self.trivia_buffer.drain(..) {
            self.builder.token(token.kind.into(), token.text(self.source));
        }
    }

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.start_node(kind.into());
    }

    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    pub(crate) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.drain_trivia();
        self.builder.checkpoint()
    }

    /// Consume the current significant token into the tree.
    pub(crate) fn bump(&mut self) {
        self.skip_trivia_to_buffer();
        if self.eof() {
            return;
        }
        self.drain_trivia();
        let token = self.tokens[self.pos];
        self.builder.token(token.kind.into(), token.text(self.source));
        self.pos += 1;
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.currently_is(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or emit `ExpectedToken`/`what` without consuming —
    /// lets the caller decide how to recover.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_msg(DiagnosticKind::ExpectedToken, format!("expected {what}"));
        false
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind) {
        self.error_msg(kind, kind.default_message());
    }

    pub(crate) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let range = self.current_span();
        if self.last_error_pos == Some(range.start()) {
            return;
        }
        self.last_error_pos = Some(range.start());
        self.diagnostics.report(self.source_id, kind, range).message(message).emit();
    }

    /// Emit a grammar-compliance fix: deterministic replacement, high
    /// confidence (spec.md §4.8).
    pub(crate) fn error_with_fix(
        &mut self,
        kind: DiagnosticKind,
        message: impl Into<String>,
        replacement: impl Into<String>,
        rationale: impl Into<String>,
    ) {
        let range = self.current_span();
        if self.last_error_pos == Some(range.start()) {
            return;
        }
        self.last_error_pos = Some(range.start());
        self.diagnostics
            .report(self.source_id, kind, range)
            .message(message)
            .suggest(Suggestion {
                range: TextRange::empty(range.start()),
                replacement: replacement.into(),
                confidence: crate::diagnostics::Confidence::High,
                rationale: rationale.into(),
            })
            .emit();
    }

    /// Record the current token as an `Error` node and consume it.
    pub(crate) fn error_and_bump(&mut self, kind: DiagnosticKind) {
        self.error_and_bump_with_hint(kind, kind.default_message());
    }

    pub(crate) fn error_and_bump_with_hint(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.error_msg(kind, message);
        if !self.eof() {
            self.start_node(SyntaxKind::ErrorNode);
            self.bump();
            self.finish_node();
        }
    }

    /// Resynchronize: wrap tokens up to (excluding) the next member of
    /// `recovery` in an `Error` node.
    pub(crate) fn recover_until(&mut self, recovery: TokenSet) {
        if self.currently_is_one_of(recovery) || self.should_stop() {
            return;
        }
        self.start_node(SyntaxKind::ErrorNode);
        while !self.currently_is_one_of(recovery) && !self.should_stop() {
            self.bump();
        }
        self.finish_node();
    }

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.depth >= DEFAULT_RECURSION_LIMIT {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceManager;

    fn parse(src: &str) -> ParseOutput {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        parse_source(id, src)
    }

    #[test]
    fn empty_source_produces_source_file_node() {
        let out = parse("");
        assert_eq!(out.syntax().kind(), SyntaxKind::SourceFile);
    }

    #[test]
    fn syntax_tree_text_round_trips_source() {
        let src = "pub fn main(none) -> i32 { return 0; }\n";
        let out = parse(src);
        assert_eq!(out.syntax().text().to_string(), src);
    }

    #[test]
    fn minimal_program_has_no_diagnostics() {
        let src = "package demo;\n\npub fn main(none) -> i32 {\n    return 0;\n}\n";
        let out = parse(src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    }
}
