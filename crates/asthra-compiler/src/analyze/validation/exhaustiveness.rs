//! Match exhaustiveness (spec.md §4.7): every `match` on a `bool` must cover
//! both `true` and `false`; every `match` on an enum must cover every
//! variant. A wildcard or bare identifier pattern covers the rest. An arm
//! reachable only after the scrutinee is already fully covered is flagged
//! as `UnreachablePattern`.

use crate::analyze::type_check::{name_symbol, AnalyzedTypes};
use crate::analyze::types::Type;
use crate::analyze::visitor::{self, Visitor};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{AstNode, MatchArm, MatchStmt, Pattern, SourceFile, Stmt};
use crate::source::SourceId;

pub fn check(source_id: SourceId, file: &SourceFile, types: &AnalyzedTypes, diagnostics: &mut Diagnostics) {
    let mut checker = ExhaustivenessChecker { source_id, types, diagnostics };
    checker.visit_source_file(file);
}

struct ExhaustivenessChecker<'a> {
    source_id: SourceId,
    types: &'a AnalyzedTypes,
    diagnostics: &'a mut Diagnostics,
}

impl Visitor for ExhaustivenessChecker<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Match(m) = stmt {
            self.check_match(m);
        }
        visitor::walk_stmt(self, stmt);
    }
}

impl ExhaustivenessChecker<'_> {
    fn check_match(&mut self, stmt: &MatchStmt) {
        let Some(scrutinee) = stmt.scrutinee() else { return };
        let Some(&scrutinee_ty) = self.types.expr_types.get(&scrutinee.syntax().text_range()) else { return };
        let resolved = self.types.ctx.resolve(scrutinee_ty);

        let arms: Vec<MatchArm> = stmt.arms().collect();
        let mut catch_all_seen = false;
        let mut covered_variants: Vec<String> = Vec::new();
        let mut covered_bools: Vec<bool> = Vec::new();

        for arm in &arms {
            let Some(pattern) = arm.pattern() else { continue };
            if catch_all_seen {
                self.diagnostics.report(self.source_id, DiagnosticKind::UnreachablePattern, pattern.syntax().text_range()).emit();
                continue;
            }
            match &pattern {
                Pattern::Wildcard(_) | Pattern::Ident(_) => catch_all_seen = true,
                Pattern::Literal(lit) => {
                    if let Some(tok) = lit.token() {
                        use crate::parser::cst::SyntaxKind::{KwFalse, KwTrue};
                        match tok.kind() {
                            KwTrue if !covered_bools.contains(&true) => covered_bools.push(true),
                            KwFalse if !covered_bools.contains(&false) => covered_bools.push(false),
                            KwTrue | KwFalse => {
                                self.diagnostics.report(self.source_id, DiagnosticKind::UnreachablePattern, pattern.syntax().text_range()).emit();
                            }
                            _ => {}
                        }
                    }
                }
                Pattern::EnumVariant(v) => {
                    if let Some(name) = v.variant_name() {
                        if covered_variants.contains(&name) {
                            self.diagnostics.report(self.source_id, DiagnosticKind::UnreachablePattern, pattern.syntax().text_range()).emit();
                        } else {
                            covered_variants.push(name);
                        }
                    }
                }
                Pattern::Struct(_) | Pattern::Tuple(_) => catch_all_seen = true,
            }
        }

        if catch_all_seen {
            return;
        }

        match self.types.ctx.get(resolved) {
            Type::Bool => {
                if covered_bools.len() < 2 {
                    self.diagnostics.report(self.source_id, DiagnosticKind::NonExhaustivePatterns, stmt.syntax().text_range()).message("match does not cover both `true` and `false`").emit();
                }
            }
            Type::Enum { def, .. } => {
                let Some((_, variants)) = self.types.enum_variants.iter().find(|(name, _)| name_symbol(name) == *def) else { return };
                let missing: Vec<&str> = variants.iter().map(|(name, _)| name.as_str()).filter(|name| !covered_variants.iter().any(|c| c == name)).collect();
                if !missing.is_empty() {
                    self.diagnostics
                        .report(self.source_id, DiagnosticKind::NonExhaustivePatterns, stmt.syntax().text_range())
                        .message(format!("match does not cover variant(s): {}", missing.join(", ")))
                        .emit();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::type_check::analyze_types;
    use crate::parser::ast::SourceFile;
    use crate::parser::parse_source;
    use crate::source::SourceManager;

    fn diagnose(src: &str) -> Vec<DiagnosticKind> {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        let out = parse_source(id, src);
        let file = SourceFile::cast(out.syntax()).unwrap();
        let mut diagnostics = out.diagnostics;
        let types = analyze_types(id, &file, &mut diagnostics);
        check(id, &file, &types, &mut diagnostics);
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn bool_match_missing_false_arm_is_flagged() {
        let src = "pub fn f(b: bool) -> i32 { match b { true => 1, } }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::NonExhaustivePatterns));
    }

    #[test]
    fn bool_match_covering_both_arms_is_clean() {
        let src = "pub fn f(b: bool) -> i32 { match b { true => 1, false => 0, } }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::NonExhaustivePatterns));
    }

    #[test]
    fn bool_match_with_wildcard_is_clean() {
        let src = "pub fn f(b: bool) -> i32 { match b { true => 1, _ => 0, } }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::NonExhaustivePatterns));
    }

    #[test]
    fn duplicate_bool_arm_is_unreachable() {
        let src = "pub fn f(b: bool) -> i32 { match b { true => 1, true => 2, false => 0, } }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::UnreachablePattern));
    }

    #[test]
    fn arm_after_wildcard_is_unreachable() {
        let src = "pub fn f(b: bool) -> i32 { match b { _ => 0, true => 1, } }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::UnreachablePattern));
    }
}
