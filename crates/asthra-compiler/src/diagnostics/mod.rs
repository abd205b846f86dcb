//! Diagnostic Engine.
//!
//! Collects structured diagnostics from every pipeline stage, ranks
//! suggestions, and renders them either for a terminal or as the stable JSON
//! schema described in spec.md §6. Diagnostics are *values*, never
//! exceptions: a stage that hits a source-level problem records one here and
//! keeps going, exactly as spec.md §7 requires.

mod render;
mod suggest;

pub use render::{DiagnosticsPrinter, JsonDiagnostic};
pub use suggest::suggest_similar;

use rowan::TextRange;

use crate::source::SourceId;

/// How serious a diagnostic is.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        }
    }
}

/// Broad classification used by the JSON schema's `metadata.category` field.
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Semantic,
    Syntax,
    TypeSystem,
    Grammar,
    Ffi,
    Security,
}

/// How confident the Diagnostic Engine is in a suggested fix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Every diagnosable condition the core can report, per spec.md §7's error
/// taxonomy. Each carries a stable machine-readable code and a default
/// severity/category; call sites may still override severity for the rare
/// case (e.g. promoting a warning under `--warnings-as-errors`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DiagnosticKind {
    // Lexical
    UnterminatedString,
    UnterminatedComment,
    InvalidEscape,
    InvalidNumericLiteral,
    InvalidCharacter,
    // Syntactic
    ExpectedToken,
    UnexpectedToken,
    MissingVisibility,
    MissingParameterList,
    MissingStructContent,
    MissingVariantArguments,
    MissingArrayMarker,
    MissingAnnotationArgs,
    // Name resolution
    UndefinedSymbol,
    AmbiguousSymbol,
    DuplicateSymbol,
    ForbiddenInternalImport,
    PrivateFieldAccess,
    PrivateSymbolAccess,
    // Type system
    TypeMismatch,
    WrongArity,
    NotCallable,
    NotIndexable,
    NonExhaustivePatterns,
    UnreachablePattern,
    AmbiguousMethod,
    GenericArgumentMismatch,
    // Annotation / safety
    UnsafeRequired,
    ConstantTimeViolation,
    FfiAnnotationMismatch,
    OwnershipConflict,
    // Immutability
    AssignmentToImmutable,
    BorrowMutFromImmutable,
    // Internal
    InternalError,
}

impl DiagnosticKind {
    /// Stable machine-readable code, e.g. `ASTHRA_E001`.
    pub fn code(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            UnterminatedString => "ASTHRA_E001",
            UnterminatedComment => "ASTHRA_E002",
            InvalidEscape => "ASTHRA_E003",
            InvalidNumericLiteral => "ASTHRA_E004",
            InvalidCharacter => "ASTHRA_E005",
            ExpectedToken => "ASTHRA_E010",
            UnexpectedToken => "ASTHRA_E011",
            MissingVisibility => "ASTHRA_E012",
            MissingParameterList => "ASTHRA_E013",
            MissingStructContent => "ASTHRA_E014",
            MissingVariantArguments => "ASTHRA_E015",
            MissingArrayMarker => "ASTHRA_E016",
            MissingAnnotationArgs => "ASTHRA_E017",
            UndefinedSymbol => "ASTHRA_E020",
            AmbiguousSymbol => "ASTHRA_E021",
            DuplicateSymbol => "ASTHRA_E022",
            ForbiddenInternalImport => "ASTHRA_E023",
            PrivateFieldAccess => "ASTHRA_E024",
            PrivateSymbolAccess => "ASTHRA_E025",
            TypeMismatch => "ASTHRA_E030",
            WrongArity => "ASTHRA_E031",
            NotCallable => "ASTHRA_E032",
            NotIndexable => "ASTHRA_E033",
            NonExhaustivePatterns => "ASTHRA_E034",
            UnreachablePattern => "ASTHRA_W001",
            AmbiguousMethod => "ASTHRA_E035",
            GenericArgumentMismatch => "ASTHRA_E036",
            UnsafeRequired => "ASTHRA_E040",
            ConstantTimeViolation => "ASTHRA_E041",
            FfiAnnotationMismatch => "ASTHRA_E042",
            OwnershipConflict => "ASTHRA_E043",
            AssignmentToImmutable => "ASTHRA_E050",
            BorrowMutFromImmutable => "ASTHRA_E051",
            InternalError => "ASTHRA_E999",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::UnreachablePattern => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn category(self) -> Category {
        use DiagnosticKind::*;
        match self {
            UnterminatedString | UnterminatedComment | InvalidEscape | InvalidNumericLiteral
            | InvalidCharacter | ExpectedToken | UnexpectedToken => Category::Syntax,
            MissingVisibility
            | MissingParameterList
            | MissingStructContent
            | MissingVariantArguments
            | MissingArrayMarker
            | MissingAnnotationArgs => Category::Grammar,
            UndefinedSymbol
            | AmbiguousSymbol
            | DuplicateSymbol
            | ForbiddenInternalImport
            | PrivateFieldAccess
            | PrivateSymbolAccess
            | AssignmentToImmutable
            | BorrowMutFromImmutable => Category::Semantic,
            TypeMismatch
            | WrongArity
            | NotCallable
            | NotIndexable
            | NonExhaustivePatterns
            | UnreachablePattern
            | AmbiguousMethod
            | GenericArgumentMismatch => Category::TypeSystem,
            UnsafeRequired | ConstantTimeViolation => Category::Security,
            FfiAnnotationMismatch | OwnershipConflict => Category::Ffi,
            InternalError => Category::Semantic,
        }
    }

    /// Default human-facing message for kinds whose wording doesn't depend
    /// on call-site context. Call sites needing interpolation (symbol
    /// names, types) build their own via `ReportBuilder::message`.
    pub fn default_message(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            UnterminatedString => "unterminated string literal",
            UnterminatedComment => "unterminated block comment",
            InvalidEscape => "invalid escape sequence",
            InvalidNumericLiteral => "invalid numeric literal",
            InvalidCharacter => "invalid character literal",
            ExpectedToken => "expected a different token here",
            UnexpectedToken => "unexpected token",
            MissingVisibility => "declaration is missing required visibility (`pub` or `priv`)",
            MissingParameterList => "empty parameter list must be written `(none)`",
            MissingStructContent => "empty struct/enum body must be written `{ none }`",
            MissingVariantArguments => "enum variant payload must be explicit: `(void)` or `(args)`",
            MissingArrayMarker => "empty array must be written `[void]`",
            MissingAnnotationArgs => "annotation arguments must be explicit: `(args)` or `(void)`",
            UndefinedSymbol => "undefined symbol",
            AmbiguousSymbol => "ambiguous symbol",
            DuplicateSymbol => "duplicate symbol in this scope",
            ForbiddenInternalImport => "`internal/` packages may only be imported by stdlib/internal packages",
            PrivateFieldAccess => "field is private to its defining package",
            PrivateSymbolAccess => "symbol is private to its defining package",
            TypeMismatch => "type mismatch",
            WrongArity => "wrong number of arguments",
            NotCallable => "value is not callable",
            NotIndexable => "value is not indexable",
            NonExhaustivePatterns => "match does not cover every variant",
            UnreachablePattern => "unreachable match arm",
            AmbiguousMethod => "ambiguous method call",
            GenericArgumentMismatch => "generic argument mismatch",
            UnsafeRequired => "operation requires an `unsafe` block",
            ConstantTimeViolation => "data-dependent branch in a `#[constant_time]` function",
            FfiAnnotationMismatch => "FFI ownership annotation does not match parameter direction",
            OwnershipConflict => "conflicting ownership annotations",
            AssignmentToImmutable => "assignment to immutable binding",
            BorrowMutFromImmutable => "cannot take `&mut` of an immutable binding",
            InternalError => "internal compiler error",
        }
    }
}

/// A secondary span attached to a diagnostic, with an explanatory label.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Label {
    pub range: TextRange,
    pub text: String,
}

/// A proposed fix. `range` is the span to replace (zero-length for pure
/// insertions, e.g. inserting `pub `).
#[derive(Clone, Debug, serde::Serialize)]
pub struct Suggestion {
    pub range: TextRange,
    pub replacement: String,
    pub confidence: Confidence,
    pub rationale: String,
}

/// Extra structured context beyond the message, mirroring the JSON schema's
/// `metadata` object.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct Metadata {
    pub similar_symbols: Vec<String>,
    pub inferred_types: Vec<String>,
}

/// A single structured diagnostic.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub source_id: SourceId,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub primary: TextRange,
    pub labels: Vec<Label>,
    pub suggestions: Vec<Suggestion>,
    pub metadata: Metadata,
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }
}

/// Accumulates diagnostics for one compilation unit.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a diagnostic. Nothing is recorded until `.emit()` is
    /// called on the returned builder.
    pub fn report(&mut self, source_id: SourceId, kind: DiagnosticKind, primary: TextRange) -> ReportBuilder<'_> {
        let severity = kind.default_severity();
        let message = kind.default_message().to_string();
        ReportBuilder {
            sink: self,
            diagnostic: Diagnostic {
                source_id,
                kind,
                severity,
                message,
                primary,
                labels: Vec::new(),
                suggestions: Vec::new(),
                metadata: Metadata::default(),
            },
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn merge(&mut self, mut other: Diagnostics) {
        self.items.append(&mut other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.severity.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Diagnostics in non-decreasing primary-span order, as spec.md §7/§8
    /// require for rendering (source order, not discovery order).
    pub fn sorted(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.items.iter().collect();
        sorted.sort_by_key(|d| (d.source_id, d.primary.start(), d.primary.end()));
        sorted
    }

    /// Drop diagnostics whose category is in `suppressed`, and — when
    /// `warnings_as_errors` — promote remaining warnings to errors. Applied
    /// at render/exit-code time only, never by the passes that create
    /// diagnostics (spec.md §9's "passed as explicit configuration, not a
    /// singleton").
    pub fn apply_policy(&mut self, suppressed: &[Category], warnings_as_errors: bool) {
        self.items.retain(|d| !suppressed.contains(&d.category()));
        if warnings_as_errors {
            for d in &mut self.items {
                if d.severity == Severity::Warning {
                    d.severity = Severity::Error;
                }
            }
        }
    }
}

/// Builder returned by `Diagnostics::report`; nothing is recorded until
/// `.emit()`.
pub struct ReportBuilder<'d> {
    sink: &'d mut Diagnostics,
    diagnostic: Diagnostic,
}

impl ReportBuilder<'_> {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.diagnostic.message = message.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.diagnostic.severity = severity;
        self
    }

    pub fn label(mut self, range: TextRange, text: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label {
            range,
            text: text.into(),
        });
        self
    }

    pub fn suggest(mut self, suggestion: Suggestion) -> Self {
        self.diagnostic.suggestions.push(suggestion);
        self
    }

    pub fn similar_symbols(mut self, symbols: Vec<String>) -> Self {
        self.diagnostic.metadata.similar_symbols = symbols;
        self
    }

    pub fn inferred_types(mut self, types: Vec<String>) -> Self {
        self.diagnostic.metadata.inferred_types = types;
        self
    }

    pub fn emit(self) {
        self.sink.items.push(self.diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextSize;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn report_emit_records_diagnostic() {
        let mut diags = Diagnostics::new();
        diags
            .report(SourceId::from(0), DiagnosticKind::UndefinedSymbol, range(0, 3))
            .message("undefined symbol `foo`")
            .emit();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.iter().next().unwrap().code(), "ASTHRA_E020");
    }

    #[test]
    fn unreachable_pattern_defaults_to_warning() {
        let mut diags = Diagnostics::new();
        diags
            .report(SourceId::from(0), DiagnosticKind::UnreachablePattern, range(0, 1))
            .emit();
        assert_eq!(diags.error_count(), 0);
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn sorted_is_in_span_order() {
        let mut diags = Diagnostics::new();
        diags
            .report(SourceId::from(0), DiagnosticKind::UnexpectedToken, range(10, 12))
            .emit();
        diags
            .report(SourceId::from(0), DiagnosticKind::UnexpectedToken, range(0, 2))
            .emit();
        let sorted = diags.sorted();
        assert_eq!(sorted[0].primary, range(0, 2));
        assert_eq!(sorted[1].primary, range(10, 12));
    }

    #[test]
    fn apply_policy_suppresses_category() {
        let mut diags = Diagnostics::new();
        diags
            .report(SourceId::from(0), DiagnosticKind::UnreachablePattern, range(0, 1))
            .emit();
        diags.apply_policy(&[Category::TypeSystem], false);
        assert!(diags.is_empty());
    }

    #[test]
    fn apply_policy_warnings_as_errors() {
        let mut diags = Diagnostics::new();
        diags
            .report(SourceId::from(0), DiagnosticKind::UnreachablePattern, range(0, 1))
            .emit();
        diags.apply_policy(&[], true);
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 0);
    }
}
