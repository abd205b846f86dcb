//! Semantic analysis: name resolution, type checking, and the validation
//! passes that run once the typed tree is complete (spec.md §4.4–§4.8).
//!
//! [`analyze`] runs the whole pipeline over one parsed file and folds every
//! stage's diagnostics into a single [`Diagnostics`] sink, exactly the way
//! [`crate::parser::parse_source`] folds lexer and parser diagnostics.

pub mod symbol_table;
pub mod type_check;
pub mod types;
pub mod validation;
pub mod visitor;

use crate::diagnostics::Diagnostics;
use crate::parser::ast::SourceFile;
use crate::source::SourceId;

use symbol_table::SymbolTable;
use type_check::AnalyzedTypes;

/// Everything downstream passes (IR lowering) need from semantic analysis.
pub struct AnalysisOutput {
    pub symbols: SymbolTable,
    pub types: AnalyzedTypes,
}

/// Runs name resolution, type checking, and validation over `file` in
/// sequence, folding each stage's diagnostics into `diagnostics` rather than
/// bailing out after the first stage with errors — spec.md §7 wants every
/// diagnosable problem reported in one pass wherever possible.
pub fn analyze(source_id: SourceId, file: &SourceFile, diagnostics: &mut Diagnostics) -> AnalysisOutput {
    let mut interner = asthra_core::Interner::new();
    let symbols = symbol_table::build(source_id, file, &mut interner, diagnostics);
    let types = type_check::analyze_types(source_id, file, diagnostics);
    validation::validate(source_id, file, &types, diagnostics);
    AnalysisOutput { symbols, types }
}
