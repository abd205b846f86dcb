//! Mutability discipline (spec.md §4.3, §4.7): assigning through a binding,
//! or through a field/index chain rooted in one, requires the root binding
//! to have been declared `mut`.

use std::collections::HashMap;

use crate::analyze::visitor::{self, Visitor};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{self, AstNode, Expr, FunctionDecl, SourceFile, Stmt};
use crate::source::SourceId;

pub fn check(source_id: SourceId, file: &SourceFile, diagnostics: &mut Diagnostics) {
    let mut checker = ImmutabilityChecker { source_id, diagnostics, scopes: vec![HashMap::new()] };
    checker.visit_source_file(file);
}

struct ImmutabilityChecker<'a> {
    source_id: SourceId,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
}

impl Visitor for ImmutabilityChecker<'_> {
    fn visit_function(&mut self, func: &FunctionDecl) {
        self.scopes.push(HashMap::new());
        if let Some(params) = func.params() {
            for p in params.params() {
                if let Some(name) = p.name() {
                    self.declare(name, p.is_mut());
                }
            }
        }
        visitor::walk_function(self, func);
        self.scopes.pop();
    }

    fn visit_block(&mut self, block: &ast::Block) {
        self.scopes.push(HashMap::new());
        visitor::walk_block(self, block);
        self.scopes.pop();
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(s) => {
                if let Some(init) = s.init() {
                    self.visit_expr(&init);
                }
                if let Some(name) = s.name() {
                    self.declare(name, s.is_mut());
                }
                return;
            }
            Stmt::Assign(s) => {
                if let Some(target) = s.target() {
                    self.check_lvalue(&target);
                }
                if let Some(value) = s.value() {
                    self.visit_expr(&value);
                }
                return;
            }
            _ => {}
        }
        visitor::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::MutRef(m) = expr {
            if let Some(operand) = m.operand() {
                self.check_mut_borrow(&operand, expr);
            }
        }
        visitor::walk_expr(self, expr);
    }
}

impl ImmutabilityChecker<'_> {
    fn declare(&mut self, name: String, is_mut: bool) {
        self.scopes.last_mut().unwrap().insert(name, is_mut);
    }

    fn lookup(&self, name: &str) -> Option<bool> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    /// Resolve the root identifier of an lvalue (`a`, `a.b`, `a.b[0]`, ...)
    /// and flag the assignment if that root is an immutable binding. A
    /// target whose root can't be determined (e.g. a call result) is left
    /// to the type checker's own diagnostics.
    fn check_lvalue(&mut self, target: &Expr) {
        let mut current = target.clone();
        loop {
            current = match current {
                Expr::FieldAccess(f) => match f.base() {
                    Some(base) => base,
                    None => return,
                },
                Expr::Index(idx) => match idx.base() {
                    Some(base) => base,
                    None => return,
                },
                Expr::Paren(p) => match p.inner() {
                    Some(inner) => inner,
                    None => return,
                },
                Expr::Unary(u) => match u.operand() {
                    Some(operand) => operand,
                    None => return,
                },
                Expr::Ident(ident) => {
                    if let Some(name) = ident.name()
                        && let Some(is_mut) = self.lookup(&name)
                        && !is_mut
                    {
                        self.diagnostics
                            .report(self.source_id, DiagnosticKind::AssignmentToImmutable, target.syntax().text_range())
                            .message(format!("cannot assign to immutable binding `{name}`"))
                            .emit();
                    }
                    return;
                }
                _ => return,
            };
        }
    }

    /// As `check_lvalue`, but for the operand of `&mut`: resolves down to
    /// the root binding and flags `BorrowMutFromImmutable` when it isn't
    /// `mut`. `context` is the `&mut ...` expression itself, used for the
    /// diagnostic span.
    fn check_mut_borrow(&mut self, operand: &Expr, context: &Expr) {
        let mut current = operand.clone();
        loop {
            current = match current {
                Expr::FieldAccess(f) => match f.base() {
                    Some(base) => base,
                    None => return,
                },
                Expr::Index(idx) => match idx.base() {
                    Some(base) => base,
                    None => return,
                },
                Expr::Paren(p) => match p.inner() {
                    Some(inner) => inner,
                    None => return,
                },
                Expr::Ident(ident) => {
                    if let Some(name) = ident.name()
                        && let Some(is_mut) = self.lookup(&name)
                        && !is_mut
                    {
                        self.diagnostics
                            .report(self.source_id, DiagnosticKind::BorrowMutFromImmutable, context.syntax().text_range())
                            .message(format!("cannot take `&mut` of immutable binding `{name}`"))
                            .emit();
                    }
                    return;
                }
                _ => return,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::parser::parse_source;
    use crate::source::SourceManager;

    fn diagnose(src: &str) -> Vec<DiagnosticKind> {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        let out = parse_source(id, src);
        let file = SourceFile::cast(out.syntax()).unwrap();
        let mut diagnostics: Diagnostics = out.diagnostics;
        check(id, &file, &mut diagnostics);
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn assigning_to_immutable_let_is_flagged() {
        let src = "pub fn f(none) -> i32 { let x: i32 = 1; x = 2; return x; }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::AssignmentToImmutable));
    }

    #[test]
    fn assigning_to_mut_let_is_clean() {
        let src = "pub fn f(none) -> i32 { let mut x: i32 = 1; x = 2; return x; }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::AssignmentToImmutable));
    }

    #[test]
    fn assigning_to_immutable_param_is_flagged() {
        let src = "pub fn f(x: i32) -> i32 { x = 2; return x; }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::AssignmentToImmutable));
    }

    #[test]
    fn assigning_through_field_access_checks_the_root_binding() {
        let src = "pub fn f(mut p: Point) -> i32 { p.x = 2; return 0; }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::AssignmentToImmutable));
    }

    #[test]
    fn mut_borrow_of_immutable_binding_is_flagged() {
        let src = "pub fn f(none) -> i32 { let x: i32 = 1; let p: *mut i32 = &mut x; return x; }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::BorrowMutFromImmutable));
    }

    #[test]
    fn mut_borrow_of_mut_binding_is_clean() {
        let src = "pub fn f(none) -> i32 { let mut x: i32 = 1; let p: *mut i32 = &mut x; return x; }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::BorrowMutFromImmutable));
    }
}
