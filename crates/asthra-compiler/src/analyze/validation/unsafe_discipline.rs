//! Unsafe discipline (spec.md §4.7): raw-pointer dereference, pointer
//! arithmetic, and `extern` calls are only permitted inside an
//! `unsafe { ... }` block.

use std::collections::HashSet;

use crate::analyze::type_check::AnalyzedTypes;
use crate::analyze::types::Type;
use crate::analyze::visitor::{self, Visitor};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{AstNode, Expr, SourceFile, Stmt};
use crate::parser::cst::SyntaxKind;
use crate::source::SourceId;

pub fn check(source_id: SourceId, file: &SourceFile, types: &AnalyzedTypes, diagnostics: &mut Diagnostics) {
    let externs: HashSet<String> = file.externs().filter_map(|e| e.name()).collect();
    let mut checker = UnsafeChecker { source_id, types, diagnostics, externs, depth: 0 };
    checker.visit_source_file(file);
}

struct UnsafeChecker<'a> {
    source_id: SourceId,
    types: &'a AnalyzedTypes,
    diagnostics: &'a mut Diagnostics,
    externs: HashSet<String>,
    depth: u32,
}

impl Visitor for UnsafeChecker<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Unsafe(s) = stmt {
            self.depth += 1;
            if let Some(body) = s.body() {
                self.visit_block(&body);
            }
            self.depth -= 1;
            return;
        }
        visitor::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if self.depth == 0 {
            self.check_expr(expr);
        }
        visitor::walk_expr(self, expr);
    }
}

impl UnsafeChecker<'_> {
    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Unary(u) if u.op() == Some(SyntaxKind::Star) => {
                self.diagnostics
                    .report(self.source_id, DiagnosticKind::UnsafeRequired, expr.syntax().text_range())
                    .message("raw-pointer dereference requires an `unsafe` block")
                    .emit();
            }
            Expr::Binary(b) if matches!(b.op(), Some(SyntaxKind::Plus) | Some(SyntaxKind::Minus)) => {
                let operands: Vec<Expr> = b.operands().collect();
                if operands.iter().any(|o| self.is_pointer(o)) {
                    self.diagnostics
                        .report(self.source_id, DiagnosticKind::UnsafeRequired, expr.syntax().text_range())
                        .message("pointer arithmetic requires an `unsafe` block")
                        .emit();
                }
            }
            Expr::Call(c) => {
                if let Some(Expr::Ident(ident)) = c.callee()
                    && let Some(name) = ident.name()
                    && self.externs.contains(&name)
                {
                    self.diagnostics
                        .report(self.source_id, DiagnosticKind::UnsafeRequired, expr.syntax().text_range())
                        .message(format!("call to extern function `{name}` requires an `unsafe` block"))
                        .emit();
                }
            }
            _ => {}
        }
    }

    fn is_pointer(&self, expr: &Expr) -> bool {
        self.types
            .expr_types
            .get(&expr.syntax().text_range())
            .map(|&ty| matches!(self.types.ctx.get(self.types.ctx.resolve(ty)), Type::Pointer { .. }))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::type_check::analyze_types;
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
    fn deref_outside_unsafe_is_flagged() {
        let src = "pub fn f(p: *i32) -> i32 { return *p; }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::UnsafeRequired));
    }

    #[test]
    fn deref_inside_unsafe_is_clean() {
        let src = "pub fn f(p: *i32) -> i32 { unsafe { return *p; } }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::UnsafeRequired));
    }

    #[test]
    fn extern_call_outside_unsafe_is_flagged() {
        let src = "priv extern fn raw(none) -> i32;\npub fn f(none) -> i32 { return raw(); }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::UnsafeRequired));
    }

    #[test]
    fn extern_call_inside_unsafe_is_clean() {
        let src = "priv extern fn raw(none) -> i32;\npub fn f(none) -> i32 { unsafe { return raw(); } }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::UnsafeRequired));
    }
}
