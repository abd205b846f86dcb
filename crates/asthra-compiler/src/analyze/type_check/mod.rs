//! Type checking: signature collection, local inference, and the typed
//! walk that attaches a `TypeId` to every expression (spec.md §4.5, §4.6).

mod analyzer;

pub use analyzer::{AnalyzedTypes, FunctionSig, analyze_types, name_symbol};
