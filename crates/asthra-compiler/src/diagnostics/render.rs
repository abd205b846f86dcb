//! Rendering: human-readable text (via `annotate-snippets`, with a snippet
//! excerpt and caret underline) and the stable JSON export schema, both
//! required by spec.md §4.8 and §6.

use annotate_snippets::{Level, Renderer, Snippet};
use serde::Serialize;

use super::{Diagnostic, Diagnostics, Severity};
use crate::source::{LineCol, SourceId, SourceManager};

/// Renders a `Diagnostics` collection against the `SourceManager` that
/// produced the spans it references.
pub struct DiagnosticsPrinter<'a> {
    sources: &'a SourceManager,
    color: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(sources: &'a SourceManager, color: bool) -> Self {
        Self { sources, color }
    }

    /// Render every diagnostic, in source order, as human-readable text.
    pub fn render_human(&self, diagnostics: &Diagnostics) -> String {
        let renderer = if self.color {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut out = String::new();
        for diag in diagnostics.sorted() {
            out.push_str(&self.render_one(diag, &renderer));
            out.push('\n');
        }
        out
    }

    fn render_one(&self, diag: &Diagnostic, renderer: &Renderer) -> String {
        let level = severity_level(diag.severity);
        let origin = self.sources.name(diag.source_id);
        let text = self.sources.text(diag.source_id);
        let start = u32::from(diag.primary.start()) as usize;
        let end = u32::from(diag.primary.end()) as usize;
        let title = format!("[{}] {}", diag.code(), diag.message);
        let label_texts: Vec<String> = diag.labels.iter().map(|l| l.text.clone()).collect();

        let mut snippet = Snippet::source(text)
            .origin(origin)
            .fold(true)
            .annotation(level.span(start..end).label(&diag.message));

        for (label, text) in diag.labels.iter().zip(&label_texts) {
            let s = u32::from(label.range.start()) as usize;
            let e = u32::from(label.range.end()) as usize;
            snippet = snippet.annotation(Level::Note.span(s..e).label(text));
        }

        let message = level.title(&title).snippet(snippet);
        renderer.render(message).to_string()
    }

    /// Render every diagnostic as the stable JSON schema from spec.md §6.
    pub fn render_json(&self, diagnostics: &Diagnostics) -> serde_json::Value {
        let items: Vec<JsonDiagnostic> = diagnostics
            .sorted()
            .into_iter()
            .map(|d| self.to_json(d))
            .collect();
        serde_json::to_value(items).expect("diagnostic JSON is always serializable")
    }

    fn pos(&self, source_id: SourceId, offset: rowan::TextSize) -> JsonPos {
        let LineCol { line, column } = self.sources.resolve(source_id, offset);
        JsonPos { line, col: column }
    }

    fn span(&self, source_id: SourceId, range: rowan::TextRange) -> JsonSpan {
        JsonSpan {
            file: self.sources.name(source_id).to_string(),
            start: self.pos(source_id, range.start()),
            end: self.pos(source_id, range.end()),
        }
    }

    fn to_json(&self, diag: &Diagnostic) -> JsonDiagnostic {
        JsonDiagnostic {
            code: diag.code().to_string(),
            severity: diag.severity.as_str().to_string(),
            message: diag.message.clone(),
            primary: self.span(diag.source_id, diag.primary),
            labels: diag
                .labels
                .iter()
                .map(|l| JsonLabel {
                    span: self.span(diag.source_id, l.range),
                    label: l.text.clone(),
                })
                .collect(),
            suggestions: diag
                .suggestions
                .iter()
                .map(|s| JsonSuggestion {
                    span: self.span(diag.source_id, s.range),
                    replacement: s.replacement.clone(),
                    confidence: format!("{:?}", s.confidence).to_lowercase(),
                    rationale: s.rationale.clone(),
                })
                .collect(),
            metadata: JsonMetadata {
                category: category_str(diag.category()).to_string(),
                similar_symbols: diag.metadata.similar_symbols.clone(),
                inferred_types: diag.metadata.inferred_types.clone(),
            },
        }
    }
}

fn severity_level(severity: Severity) -> Level {
    match severity {
        Severity::Error => Level::Error,
        Severity::Warning => Level::Warning,
        Severity::Note => Level::Note,
        Severity::Help => Level::Help,
    }
}

fn category_str(category: super::Category) -> &'static str {
    use super::Category::*;
    match category {
        Semantic => "semantic",
        Syntax => "syntax",
        TypeSystem => "type_system",
        Grammar => "grammar",
        Ffi => "ffi",
        Security => "security",
    }
}

#[derive(Serialize)]
pub struct JsonPos {
    pub line: u32,
    pub col: u32,
}

#[derive(Serialize)]
pub struct JsonSpan {
    pub file: String,
    pub start: JsonPos,
    pub end: JsonPos,
}

#[derive(Serialize)]
pub struct JsonLabel {
    pub span: JsonSpan,
    pub label: String,
}

#[derive(Serialize)]
pub struct JsonSuggestion {
    pub span: JsonSpan,
    pub replacement: String,
    pub confidence: String,
    pub rationale: String,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub category: String,
    pub similar_symbols: Vec<String>,
    pub inferred_types: Vec<String>,
}

#[derive(Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    pub primary: JsonSpan,
    pub labels: Vec<JsonLabel>,
    pub suggestions: Vec<JsonSuggestion>,
    pub metadata: JsonMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use rowan::{TextRange, TextSize};

    #[test]
    fn json_schema_has_expected_shape() {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", "package p;\nreturn user_name;\n");

        let mut diags = Diagnostics::new();
        diags
            .report(
                id,
                DiagnosticKind::UndefinedSymbol,
                TextRange::new(TextSize::from(18), TextSize::from(27)),
            )
            .message("undefined symbol `user_name`")
            .emit();

        let printer = DiagnosticsPrinter::new(&sources, false);
        let json = printer.render_json(&diags);
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["code"], "ASTHRA_E020");
        assert_eq!(arr[0]["severity"], "error");
        assert_eq!(arr[0]["metadata"]["category"], "semantic");
        assert_eq!(arr[0]["primary"]["start"]["line"], 2);
    }

    #[test]
    fn human_render_includes_code_and_message() {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", "fn main() -> i32 { return 0; }\n");

        let mut diags = Diagnostics::new();
        diags
            .report(
                id,
                DiagnosticKind::MissingVisibility,
                TextRange::new(TextSize::from(0), TextSize::from(2)),
            )
            .emit();

        let printer = DiagnosticsPrinter::new(&sources, false);
        let rendered = printer.render_human(&diags);
        assert!(rendered.contains("ASTHRA_E012"));
        assert!(rendered.contains("visibility"));
    }
}
