//! The single entry point downstream consumers (`asthra-cli` and friends)
//! call: thread each source file through `parse_source` → `analyze` →
//! `ir::lower_module`, merging diagnostics along the way, and honor
//! cooperative cancellation between files (spec.md §9's "long-running
//! queries poll a flag rather than spawning their own cancellation
//! machinery").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analyze::analyze;
use crate::diagnostics::{Category, Diagnostics};
use crate::ir::{self, Module};
use crate::parser::ast::{AstNode, SourceFile};
use crate::parser::parse_source;
use crate::source::SourceId;

/// Configuration for one [`compile`] call. Severity/suppression policy is
/// applied once at the end, over the merged diagnostic set — never by
/// individual passes (mirrors `Diagnostics::apply_policy`'s own doc comment).
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub target: String,
    pub suppressed_categories: Vec<Category>,
    pub warnings_as_errors: bool,
    pub coverage_instrumentation: bool,
    /// Polled between files; a caller (e.g. an editor's background build)
    /// flips this to abandon an in-flight compile without tearing down the
    /// whole process.
    pub cancellation: Arc<AtomicBool>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: default_target().to_string(),
            suppressed_categories: Vec::new(),
            warnings_as_errors: false,
            coverage_instrumentation: false,
            cancellation: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn default_target() -> &'static str {
    "x86_64-unknown-linux-gnu"
}

#[derive(Debug)]
pub enum CompileOutput {
    /// `ir` holds one lowered [`Module`] per source file, in input order.
    Done { modules: Vec<Module>, diagnostics: Diagnostics },
    /// `cancellation` fired before every file finished lowering; `diagnostics`
    /// still holds whatever was collected up to that point.
    Cancelled { diagnostics: Diagnostics },
}

impl CompileOutput {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            CompileOutput::Done { diagnostics, .. } => diagnostics,
            CompileOutput::Cancelled { diagnostics } => diagnostics,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompileOutput::Cancelled { .. })
    }
}

/// Runs the full parse → analyze → lower pipeline over every `(id, text)`
/// pair in `sources`, in order, folding each file's diagnostics into one
/// sink (same fold-as-you-go discipline as [`crate::analyze::analyze`]).
///
/// `sources` carries the raw text alongside its `SourceId` because
/// `SourceManager` owns that text and this module has no reason to depend
/// on it — callers that already manage a `SourceManager` pass
/// `(id, manager.text(id))` pairs straight through.
pub fn compile(sources: &[(SourceId, &str)], options: &CompileOptions) -> CompileOutput {
    let mut diagnostics = Diagnostics::new();
    let mut modules = Vec::with_capacity(sources.len());

    for &(source_id, text) in sources {
        if options.cancellation.load(Ordering::Relaxed) {
            diagnostics.apply_policy(&options.suppressed_categories, options.warnings_as_errors);
            return CompileOutput::Cancelled { diagnostics };
        }

        let parsed = parse_source(source_id, text);
        let Some(file) = SourceFile::cast(parsed.syntax()) else {
            diagnostics.merge(parsed.diagnostics);
            continue;
        };
        diagnostics.merge(parsed.diagnostics);

        let analysis = analyze(source_id, &file, &mut diagnostics);
        let module = ir::lower_module(source_id, &file, &analysis.types, &mut diagnostics);
        modules.push(module);
    }

    diagnostics.apply_policy(&options.suppressed_categories, options.warnings_as_errors);
    CompileOutput::Done { modules, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceManager;

    #[test]
    fn compiles_a_single_clean_file() {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", "pub fn f(none) -> i32 { return 1; }\n");
        let text = sources.text(id).to_string();
        let out = compile(&[(id, &text)], &CompileOptions::default());
        match out {
            CompileOutput::Done { modules, diagnostics } => {
                assert!(!diagnostics.has_errors());
                assert_eq!(modules.len(), 1);
                assert_eq!(modules[0].functions.len(), 1);
            }
            CompileOutput::Cancelled { .. } => panic!("should not cancel"),
        }
    }

    #[test]
    fn cancellation_flag_stops_before_the_next_file() {
        let mut sources = SourceManager::new();
        let a = sources.add("a.as", "pub fn f(none) -> i32 { return 1; }\n");
        let b = sources.add("b.as", "pub fn g(none) -> i32 { return 2; }\n");
        let text_a = sources.text(a).to_string();
        let text_b = sources.text(b).to_string();

        let mut options = CompileOptions::default();
        options.cancellation = Arc::new(AtomicBool::new(true));
        let out = compile(&[(a, &text_a), (b, &text_b)], &options);
        assert!(out.is_cancelled());
    }

    #[test]
    fn suppressed_categories_are_dropped() {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", "pub fn f(none) -> i32 { return \"nope\"; }\n");
        let text = sources.text(id).to_string();
        let mut options = CompileOptions::default();
        options.suppressed_categories.push(Category::TypeSystem);
        let out = compile(&[(id, &text)], &options);
        assert!(out.diagnostics().iter().all(|d| d.category() != Category::TypeSystem));
    }
}
