//! Syntax kinds for Asthra.
//!
//! `SyntaxKind` serves dual roles: token kinds (recognized by the Logos
//! lexer) and node kinds (produced by the parser). Logos derives token
//! recognition directly on this enum; node-kind variants carry no
//! `#[token]`/`#[regex]` attribute and are only ever pushed by the parser.
//! `AsthraLang` implements Rowan's `Language` trait so the green/red tree
//! types below are parameterized by this single enum.

use logos::Logos;
use rowan::Language;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[logos(extras = crate::lexer::LexErrors)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- Punctuation & operators ---
    #[token("(")]
    LParen = 0,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("::")]
    ColonColon,
    #[token(":")]
    Colon,
    #[token("..=")]
    DotDotEq,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<=")]
    Le,
    #[token("<")]
    Lt,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,
    #[token("+=")]
    PlusEq,
    #[token("+")]
    Plus,
    #[token("-=")]
    MinusEq,
    #[token("-")]
    Minus,
    #[token("*=")]
    StarEq,
    #[token("*")]
    Star,
    #[token("/=")]
    SlashEq,
    #[token("/")]
    Slash,
    #[token("%=")]
    PercentEq,
    #[token("%")]
    Percent,
    #[token("&&")]
    AmpAmp,
    #[token("&=")]
    AmpEq,
    #[token("&")]
    Amp,
    #[token("||")]
    PipePipe,
    #[token("|=")]
    PipeEq,
    #[token("|")]
    Pipe,
    #[token("^=")]
    CaretEq,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("#")]
    Hash,
    #[token("@")]
    At,

    // --- Keywords (closed set, GLOSSARY) ---
    #[token("package")]
    KwPackage,
    #[token("import")]
    KwImport,
    #[token("pub")]
    KwPub,
    #[token("priv")]
    KwPriv,
    #[token("fn")]
    KwFn,
    #[token("struct")]
    KwStruct,
    #[token("enum")]
    KwEnum,
    #[token("impl")]
    KwImpl,
    #[token("self")]
    KwSelf,
    #[token("let")]
    KwLet,
    #[token("mut")]
    KwMut,
    #[token("const")]
    KwConst,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("match")]
    KwMatch,
    #[token("for")]
    KwFor,
    #[token("while")]
    KwWhile,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("return")]
    KwReturn,
    #[token("unsafe")]
    KwUnsafe,
    #[token("extern")]
    KwExtern,
    #[token("spawn_with_handle")]
    KwSpawnWithHandle,
    #[token("spawn")]
    KwSpawn,
    #[token("await")]
    KwAwait,
    #[token("send")]
    KwSend,
    #[token("recv")]
    KwRecv,
    #[token("select")]
    KwSelect,
    #[token("channel")]
    KwChannel,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("null")]
    KwNull,
    #[token("none")]
    KwNone,
    #[token("void")]
    KwVoid,
    #[token("as")]
    KwAs,
    #[token("in")]
    KwIn,
    #[token("range")]
    KwRange,

    // --- Identifiers & literals ---
    /// ASCII identifier. Unicode identifiers beyond this profile degrade to
    /// `Error`/`Garbage` rather than being rejected outright.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F_]+", reject_trailing_ident)]
    #[regex(r"0[oO][0-7_]+", reject_trailing_ident)]
    #[regex(r"0[bB][01_]+", reject_trailing_ident)]
    IntLiteral,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    FloatLiteral,

    #[token("'", crate::lexer::lex_char)]
    CharLiteral,

    #[token("r\"\"\"", crate::lexer::lex_triple_string_raw)]
    #[token("\"\"\"", crate::lexer::lex_triple_string_processed)]
    #[token("\"", crate::lexer::lex_single_line_string)]
    StringLiteral,

    // --- Trivia ---
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", crate::lexer::lex_block_comment)]
    BlockComment,

    /// Coalesced run of bytes that matched nothing above.
    Garbage,
    /// Synthesized in place of a token the parser expected but didn't find.
    Error,

    // --- Node kinds (non-terminals); never matched by Logos ---
    SourceFile,
    PackageDecl,
    ImportDecl,
    FunctionDecl,
    ExternDecl,
    StructDecl,
    StructField,
    EnumDecl,
    EnumVariant,
    ImplBlock,
    ConstDecl,
    ParamList,
    Param,
    Block,

    LetStmt,
    AssignStmt,
    ReturnStmt,
    IfStmt,
    ElseBranch,
    MatchStmt,
    MatchArm,
    ForStmt,
    WhileStmt,
    BreakStmt,
    ContinueStmt,
    UnsafeStmt,
    SpawnStmt,
    ExprStmt,

    LiteralExpr,
    IdentExpr,
    PathExpr,
    FieldAccessExpr,
    IndexExpr,
    CallExpr,
    MethodCallExpr,
    BinaryExpr,
    UnaryExpr,
    MutRefExpr,
    CastExpr,
    StructExpr,
    StructExprField,
    ArrayExpr,
    RangeExpr,
    AwaitExpr,
    ReceiveExpr,
    SelectExpr,
    SelectArm,
    GenericInstExpr,
    ArgList,
    ParenExpr,

    WildcardPat,
    IdentPat,
    LiteralPat,
    StructPat,
    StructPatField,
    EnumVariantPat,
    TuplePat,

    NamedType,
    GenericType,
    PointerType,
    SliceType,
    ArrayType,
    FunctionType,
    TupleType,
    NeverType,
    VoidType,
    TypeArgList,

    Annotation,
    AnnotationArgList,

    ErrorNode,

    /// Sentinel; must stay last for `kind_from_raw`'s bounds check.
    #[doc(hidden)]
    __Last,
}

fn reject_trailing_ident(lex: &mut logos::Lexer<SyntaxKind>) {
    let rest = lex.remainder();
    let trailing: usize = rest
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .count();
    if trailing > 0 {
        let bump = rest
            .char_indices()
            .nth(trailing)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        lex.bump(bump);
        let end = lex.span().end;
        let start = lex.span().start;
        lex.extras
            .push(crate::diagnostics::DiagnosticKind::InvalidNumericLiteral, start..end);
    }
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | LineComment | BlockComment)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Error | Garbage)
    }

    #[inline]
    pub fn is_keyword(self) -> bool {
        (KwPackage as u16..=KwRange as u16).contains(&(self as u16))
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AsthraLang {}

impl Language for AsthraLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __Last as u16);
        // SAFETY: bounds-checked above, and `SyntaxKind` is `repr(u16)`.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<AsthraLang>;
pub type SyntaxToken = rowan::SyntaxToken<AsthraLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// A small set of `SyntaxKind`s, for FIRST-set and recovery-set membership
/// tests. Implemented as a linear scan rather than a bitset: the combined
/// token+node alphabet comfortably exceeds 64 variants.
#[derive(Clone, Copy)]
pub struct TokenSet(&'static [SyntaxKind]);

impl TokenSet {
    pub const fn new(kinds: &'static [SyntaxKind]) -> Self {
        TokenSet(kinds)
    }

    #[inline]
    pub fn contains(&self, kind: SyntaxKind) -> bool {
        self.0.iter().any(|&k| k == kind)
    }
}

pub mod token_sets {
    use super::*;

    pub const TRIVIA: TokenSet = TokenSet::new(&[Whitespace, LineComment, BlockComment]);

    pub const EXPR_FIRST: TokenSet = TokenSet::new(&[
        LParen,
        LBracket,
        Ident,
        IntLiteral,
        FloatLiteral,
        CharLiteral,
        StringLiteral,
        KwTrue,
        KwFalse,
        KwNull,
        KwSelf,
        Minus,
        Bang,
        Star,
        Amp,
        KwUnsafe,
        KwSpawn,
        KwSpawnWithHandle,
        KwAwait,
        KwRecv,
        KwSelect,
    ]);

    pub const STMT_RECOVERY: TokenSet = TokenSet::new(&[
        Semicolon, RBrace, KwLet, KwReturn, KwIf, KwMatch, KwFor, KwWhile, KwBreak, KwContinue,
        KwUnsafe,
    ]);

    pub const ITEM_FIRST: TokenSet =
        TokenSet::new(&[KwPub, KwPriv, KwFn, KwStruct, KwEnum, KwImpl, KwConst, KwExtern, Hash]);

    pub const TYPE_FIRST: TokenSet =
        TokenSet::new(&[Ident, Star, LBracket, LParen, Bang, KwVoid]);
}
