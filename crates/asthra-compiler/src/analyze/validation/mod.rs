//! Post-typecheck validation passes (spec.md §4.7, §4.8): match
//! exhaustiveness, mutability discipline, annotation consistency, and
//! `unsafe` block discipline. Each pass is independent and only reads the
//! typed tree; none of them mutate `AnalyzedTypes`.

mod annotations;
mod exhaustiveness;
mod immutability;
mod unsafe_discipline;

use crate::analyze::type_check::AnalyzedTypes;
use crate::diagnostics::Diagnostics;
use crate::parser::ast::SourceFile;
use crate::source::SourceId;

pub fn validate(source_id: SourceId, file: &SourceFile, types: &AnalyzedTypes, diagnostics: &mut Diagnostics) {
    exhaustiveness::check(source_id, file, types, diagnostics);
    immutability::check(source_id, file, diagnostics);
    annotations::check(source_id, file, diagnostics);
    unsafe_discipline::check(source_id, file, types, diagnostics);
}
