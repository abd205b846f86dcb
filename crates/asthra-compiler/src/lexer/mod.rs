//! Lexer.
//!
//! A lazy token source over one file's bytes (spec.md §4.2): UTF-8 aware,
//! keywords/identifiers/literals/punctuation all live in one
//! [`SyntaxKind`](crate::parser::cst::SyntaxKind) so the raw token stream and
//! the Rowan tree share a single alphabet, keeping the raw token stream and
//! the `cst` module's node kinds in one enum.
//!
//! Stateful constructs (nested block comments, multi-line strings, char
//! escapes) can't be expressed as a single Logos regex, so they're handled by
//! callbacks that `bump` through the lexer's remainder by hand and record any
//! lexical error onto a side channel ([`LexErrors`]) rather than aborting the
//! match — per spec.md §4.2, "the lexer never aborts; it emits an error
//! diagnostic, synthesizes an error token, and resynchronizes".

mod literal;

pub use literal::{decode_char, decode_escapes, decode_number, normalize_multiline_indent, NumberValue};

use std::ops::Range;

use logos::Logos;
use rowan::TextRange;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::cst::SyntaxKind;
use crate::source::SourceId;

/// Zero-copy token: kind + span. Text is sliced from source on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl Token {
    pub fn new(kind: SyntaxKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span: TextRange::new((span.start as u32).into(), (span.end as u32).into()),
        }
    }

    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[Range::<usize>::from(self.span)]
    }
}

/// Side channel Logos callbacks use to report lexical errors without
/// aborting the token match they're attached to.
#[derive(Default)]
pub struct LexErrors(Vec<(DiagnosticKind, Range<usize>)>);

impl LexErrors {
    pub(crate) fn push(&mut self, kind: DiagnosticKind, range: Range<usize>) {
        self.0.push((kind, range));
    }
}

/// Tokenize `source`, coalescing consecutive unrecognized bytes into single
/// `Garbage` tokens (so malformed input produces one diagnostic per run, not
/// one per byte).
pub fn lex(source: &str) -> (Vec<Token>, LexErrors) {
    let mut tokens = Vec::new();
    let mut lexer = SyntaxKind::lexer(source);
    let mut garbage_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(SyntaxKind::Garbage, start..lexer.span().start));
                }
                tokens.push(Token::new(kind, lexer.span()));
            }
            Some(Err(())) => {
                garbage_start.get_or_insert(lexer.span().start);
            }
            None => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(SyntaxKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    (tokens, lexer.extras)
}

/// Tokenize `source` and report every lexical error (including coalesced
/// `Garbage` runs) into `diagnostics`, keyed to `source_id`.
pub fn tokenize(source_id: SourceId, source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let (tokens, errors) = lex(source);

    for (kind, range) in errors.0 {
        diagnostics
            .report(source_id, kind, text_range(range))
            .emit();
    }
    for token in &tokens {
        if token.kind == SyntaxKind::Garbage {
            diagnostics
                .report(source_id, DiagnosticKind::InvalidCharacter, token.span)
                .message(format!("unrecognized input `{}`", token.text(source)))
                .emit();
        }
    }

    tokens
}

fn text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

/// Whether a line comment's lexeme (including the leading `//`) is a
/// documentation comment to be retained as trivia attached to the next
/// declaration (spec.md §4.2).
pub fn is_doc_comment(lexeme: &str) -> bool {
    lexeme.starts_with("///") && !lexeme.starts_with("////")
}

struct ScanOutcome {
    /// Bytes consumed from the lexer's remainder, including the terminator
    /// if one was found.
    consumed: usize,
    terminated: bool,
    /// Byte ranges of invalid escapes, relative to the scanned text.
    bad_escapes: Vec<Range<usize>>,
}

/// Scan `rest` for `terminator`, honoring the shared character/string escape
/// table (`\n \t \r \\ \' \" \0`, `\xNN`, `\u{...}`). When `break_on_newline`
/// is set (single-line strings and char literals), an unescaped newline ends
/// the scan as unterminated rather than being consumed.
fn scan_escaped(rest: &str, terminator: &str, break_on_newline: bool) -> ScanOutcome {
    let chars: Vec<(usize, char)> = rest.char_indices().collect();
    let mut idx = 0usize;
    let mut bad_escapes = Vec::new();

    while idx < chars.len() {
        let (byte_pos, c) = chars[idx];
        if rest[byte_pos..].starts_with(terminator) {
            return ScanOutcome {
                consumed: byte_pos + terminator.len(),
                terminated: true,
                bad_escapes,
            };
        }
        if break_on_newline && c == '\n' {
            return ScanOutcome {
                consumed: byte_pos,
                terminated: false,
                bad_escapes,
            };
        }
        if c != '\\' {
            idx += 1;
            continue;
        }

        let Some(&(esc_byte, esc_ch)) = chars.get(idx + 1) else {
            return ScanOutcome {
                consumed: rest.len(),
                terminated: false,
                bad_escapes,
            };
        };

        if matches!(esc_ch, 'n' | 't' | 'r' | '\\' | '\'' | '"' | '0') {
            idx += 2;
            continue;
        }

        if esc_ch == 'x' {
            let h0 = chars.get(idx + 2).map(|&(_, c)| c.is_ascii_hexdigit());
            let h1 = chars.get(idx + 3).map(|&(_, c)| c.is_ascii_hexdigit());
            if h0 == Some(true) && h1 == Some(true) {
                idx += 4;
            } else {
                let end = chars.get(idx + 2).map(|&(b, _)| b).unwrap_or(rest.len());
                bad_escapes.push(byte_pos..end.max(esc_byte + esc_ch.len_utf8()));
                idx += 2;
            }
            continue;
        }

        if esc_ch == 'u' {
            let mut j = idx + 2;
            let mut ok = false;
            if chars.get(j).map(|&(_, c)| c) == Some('{') {
                j += 1;
                let hex_start = j;
                while chars.get(j).map(|&(_, c)| c.is_ascii_hexdigit()).unwrap_or(false) {
                    j += 1;
                }
                if j > hex_start && chars.get(j).map(|&(_, c)| c) == Some('}') {
                    j += 1;
                    ok = true;
                }
            }
            if ok {
                idx = j;
            } else {
                let end = chars.get(j).map(|&(b, _)| b).unwrap_or(rest.len());
                bad_escapes.push(byte_pos..end);
                idx = j.max(idx + 2);
            }
            continue;
        }

        let end = esc_byte + esc_ch.len_utf8();
        bad_escapes.push(byte_pos..end);
        idx += 2;
    }

    ScanOutcome {
        consumed: rest.len(),
        terminated: false,
        bad_escapes,
    }
}

fn report_bad_escapes(lex: &mut logos::Lexer<SyntaxKind>, rest_start: usize, bad: Vec<Range<usize>>) {
    for range in bad {
        lex.extras.push(
            DiagnosticKind::InvalidEscape,
            (rest_start + range.start)..(rest_start + range.end),
        );
    }
}

pub(crate) fn lex_char(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest_start = lex.span().end;
    let rest = lex.remainder();
    let outcome = scan_escaped(rest, "'", true);
    lex.bump(outcome.consumed);
    report_bad_escapes(lex, rest_start, outcome.bad_escapes);

    if !outcome.terminated {
        let span = lex.span();
        lex.extras.push(DiagnosticKind::UnterminatedString, span);
        return;
    }

    let content = &rest[..outcome.consumed - 1];
    let is_single_unit = content.starts_with('\\') || content.chars().count() == 1;
    if !is_single_unit {
        let span = lex.span();
        lex.extras.push(DiagnosticKind::InvalidCharacter, span);
    }
}

pub(crate) fn lex_single_line_string(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest_start = lex.span().end;
    let rest = lex.remainder();
    let outcome = scan_escaped(rest, "\"", true);
    lex.bump(outcome.consumed);
    report_bad_escapes(lex, rest_start, outcome.bad_escapes);
    if !outcome.terminated {
        let span = lex.span();
        lex.extras.push(DiagnosticKind::UnterminatedString, span);
    }
}

pub(crate) fn lex_triple_string_processed(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest_start = lex.span().end;
    let rest = lex.remainder();
    let outcome = scan_escaped(rest, "\"\"\"", false);
    lex.bump(outcome.consumed);
    report_bad_escapes(lex, rest_start, outcome.bad_escapes);
    if !outcome.terminated {
        let span = lex.span();
        lex.extras.push(DiagnosticKind::UnterminatedString, span);
    }
}

pub(crate) fn lex_triple_string_raw(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest = lex.remainder();
    match rest.find("\"\"\"") {
        Some(pos) => lex.bump(pos + 3),
        None => {
            lex.bump(rest.len());
            let span = lex.span();
            lex.extras.push(DiagnosticKind::UnterminatedString, span);
        }
    }
}

pub(crate) fn lex_block_comment(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut depth = 1i32;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return;
            }
        } else {
            i += 1;
        }
    }

    lex.bump(rest.len());
    let span = lex.span();
    lex.extras.push(DiagnosticKind::UnterminatedComment, span);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<SyntaxKind> {
        let (tokens, _) = lex(source);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("pub fn main"),
            vec![
                SyntaxKind::KwPub,
                SyntaxKind::Whitespace,
                SyntaxKind::KwFn,
                SyntaxKind::Whitespace,
                SyntaxKind::Ident,
            ]
        );
    }

    #[test]
    fn integer_literal_radixes() {
        assert_eq!(kinds("42"), vec![SyntaxKind::IntLiteral]);
        assert_eq!(kinds("0x2A"), vec![SyntaxKind::IntLiteral]);
        assert_eq!(kinds("0o52"), vec![SyntaxKind::IntLiteral]);
        assert_eq!(kinds("0b101010"), vec![SyntaxKind::IntLiteral]);
    }

    #[test]
    fn float_literal_with_exponent() {
        assert_eq!(kinds("3.14e10"), vec![SyntaxKind::FloatLiteral]);
    }

    #[test]
    fn trailing_ident_after_number_is_flagged() {
        let (tokens, errors) = lex("0x2Azz");
        assert_eq!(tokens[0].kind, SyntaxKind::IntLiteral);
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0[0].0, DiagnosticKind::InvalidNumericLiteral);
    }

    #[test]
    fn single_line_string_round_trips() {
        let src = r#""hello \n world""#;
        let (tokens, errors) = lex(src);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert_eq!(tokens[0].text(src), src);
        assert!(errors.0.is_empty());
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (tokens, errors) = lex("\"abc");
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert_eq!(errors.0[0].0, DiagnosticKind::UnterminatedString);
    }

    #[test]
    fn invalid_escape_is_reported() {
        let (_, errors) = lex(r#""bad \q escape""#);
        assert_eq!(errors.0[0].0, DiagnosticKind::InvalidEscape);
    }

    #[test]
    fn processed_triple_string_spans_newlines() {
        let src = "\"\"\"\nline one\nline two\n\"\"\"";
        let (tokens, errors) = lex(src);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert!(errors.0.is_empty());
    }

    #[test]
    fn raw_triple_string_ignores_backslashes() {
        let src = r#"r"""C:\no\escapes""""#;
        let (tokens, errors) = lex(src);
        assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
        assert!(errors.0.is_empty());
    }

    #[test]
    fn nested_block_comments() {
        let src = "/* outer /* inner */ still outer */";
        let (tokens, errors) = lex(src);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, SyntaxKind::BlockComment);
        assert_eq!(tokens[0].text(src), src);
        assert!(errors.0.is_empty());
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let (_, errors) = lex("/* never closes");
        assert_eq!(errors.0[0].0, DiagnosticKind::UnterminatedComment);
    }

    #[test]
    fn char_literal_escape() {
        let (tokens, errors) = lex(r"'\n'");
        assert_eq!(tokens[0].kind, SyntaxKind::CharLiteral);
        assert!(errors.0.is_empty());
    }

    #[test]
    fn char_literal_with_multiple_codepoints_is_flagged() {
        let (_, errors) = lex("'ab'");
        assert_eq!(errors.0[0].0, DiagnosticKind::InvalidCharacter);
    }

    #[test]
    fn garbage_bytes_coalesce_into_one_token() {
        assert_eq!(kinds("(foo) $%^& (bar)").iter().filter(|k| **k == SyntaxKind::Garbage).count(), 1);
    }

    #[test]
    fn doc_comment_detection() {
        assert!(is_doc_comment("/// does a thing"));
        assert!(!is_doc_comment("// plain comment"));
        assert!(!is_doc_comment("//// separator"));
    }
}
