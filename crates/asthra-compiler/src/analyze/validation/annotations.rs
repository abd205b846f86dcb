//! Annotation semantics (spec.md §4.7): `#[constant_time]` forbids
//! data-dependent branches on function parameters; FFI ownership
//! annotations (`transfer_full`, `transfer_none`, `borrowed`) must name a
//! pointer-typed `extern` parameter, and a parameter may carry only one.
//! `#[human_review]` and `#[volatile_memory]` are recorded as metadata for
//! downstream consumers (review tooling, IR lowering) and checked for
//! nothing here.

use std::collections::HashMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{self, AstNode, Expr, FunctionDecl, SourceFile, Stmt, TypeRef};
use crate::source::SourceId;

const OWNERSHIP_KINDS: [&str; 3] = ["transfer_full", "transfer_none", "borrowed"];

pub fn check(source_id: SourceId, file: &SourceFile, diagnostics: &mut Diagnostics) {
    for func in file.functions() {
        check_constant_time(source_id, &func, diagnostics);
    }
    for imp in file.impls() {
        for method in imp.methods() {
            check_constant_time(source_id, &method, diagnostics);
        }
    }
    for ext in file.externs() {
        check_ownership_annotations(source_id, &ext, diagnostics);
    }
}

fn check_constant_time(source_id: SourceId, func: &FunctionDecl, diagnostics: &mut Diagnostics) {
    let is_constant_time = func.annotations().any(|a| a.name().as_deref() == Some("constant_time"));
    if !is_constant_time {
        return;
    }
    let params: Vec<String> = func.params().into_iter().flat_map(|p| p.params()).filter_map(|p| p.name()).collect();
    let Some(body) = func.body() else { return };
    for stmt in body.statements() {
        check_stmt_for_tainted_branch(source_id, &stmt, &params, diagnostics);
    }
}

fn check_stmt_for_tainted_branch(source_id: SourceId, stmt: &Stmt, params: &[String], diagnostics: &mut Diagnostics) {
    match stmt {
        Stmt::If(s) => {
            if let Some(cond) = s.condition()
                && derives_from_param(&cond, params)
            {
                report_violation(source_id, &cond, diagnostics);
            }
        }
        Stmt::Match(s) => {
            if let Some(scrutinee) = s.scrutinee()
                && derives_from_param(&scrutinee, params)
            {
                report_violation(source_id, &scrutinee, diagnostics);
            }
        }
        _ => {}
    }
}

fn report_violation(source_id: SourceId, expr: &Expr, diagnostics: &mut Diagnostics) {
    diagnostics
        .report(source_id, DiagnosticKind::ConstantTimeViolation, expr.syntax().text_range())
        .message("branch condition derives from a `#[constant_time]` function's parameter")
        .emit();
}

/// Conservative syntactic taint check: does `expr` reference one of `params`
/// anywhere in its subtree? No data-flow tracking through locals.
fn derives_from_param(expr: &Expr, params: &[String]) -> bool {
    match expr {
        Expr::Ident(i) => i.name().is_some_and(|n| params.iter().any(|p| p == &n)),
        Expr::FieldAccess(e) => e.base().is_some_and(|b| derives_from_param(&b, params)),
        Expr::Index(e) => e.exprs().any(|o| derives_from_param(&o, params)),
        Expr::Call(e) => e.args().into_iter().flat_map(|a| a.args()).any(|a| derives_from_param(&a, params)),
        Expr::MethodCall(e) => {
            e.receiver().is_some_and(|r| derives_from_param(&r, params))
                || e.args().into_iter().flat_map(|a| a.args()).any(|a| derives_from_param(&a, params))
        }
        Expr::Binary(e) => e.operands().any(|o| derives_from_param(&o, params)),
        Expr::Unary(e) => e.operand().is_some_and(|o| derives_from_param(&o, params)),
        Expr::MutRef(e) => e.operand().is_some_and(|o| derives_from_param(&o, params)),
        Expr::Cast(e) => e.expr().is_some_and(|i| derives_from_param(&i, params)),
        Expr::Paren(e) => e.inner().is_some_and(|i| derives_from_param(&i, params)),
        Expr::GenericInst(e) => e.base().is_some_and(|b| derives_from_param(&b, params)),
        _ => false,
    }
}

fn check_ownership_annotations(source_id: SourceId, ext: &ast::ExternDecl, diagnostics: &mut Diagnostics) {
    let params: HashMap<String, TypeRef> =
        ext.params().into_iter().flat_map(|p| p.params()).filter_map(|p| Some((p.name()?, p.ty()?))).collect();

    let mut seen: HashMap<String, &'static str> = HashMap::new();
    for annotation in ext.annotations() {
        let Some(kind) = annotation.name() else { continue };
        let Some(&kind) = OWNERSHIP_KINDS.iter().find(|k| **k == kind) else { continue };
        for arg in annotation.args() {
            let Expr::Ident(ident) = &arg else { continue };
            let Some(param_name) = ident.name() else { continue };

            match params.get(&param_name) {
                Some(TypeRef::Pointer(_)) => {}
                _ => {
                    diagnostics
                        .report(source_id, DiagnosticKind::FfiAnnotationMismatch, arg.syntax().text_range())
                        .message(format!("`#[{kind}]` names `{param_name}`, which is not a pointer parameter"))
                        .emit();
                    continue;
                }
            }

            if let Some(prior) = seen.insert(param_name.clone(), kind)
                && prior != kind
            {
                diagnostics
                    .report(source_id, DiagnosticKind::OwnershipConflict, arg.syntax().text_range())
                    .message(format!("`{param_name}` already carries a `#[{prior}]` annotation"))
                    .emit();
            }
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
    fn branch_on_constant_time_param_is_flagged() {
        let src = "#[constant_time(void)]\npub fn f(secret: i32) -> i32 { if secret == 0 { return 1; } return 0; }\n";
        assert!(diagnose(src).contains(&DiagnosticKind::ConstantTimeViolation));
    }

    #[test]
    fn branch_on_unrelated_condition_is_clean() {
        let src = "#[constant_time(void)]\npub fn f(secret: i32) -> i32 { if true { return 1; } return 0; }\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::ConstantTimeViolation));
    }

    #[test]
    fn transfer_annotation_on_non_pointer_param_is_flagged() {
        let src = "#[transfer_full(n)]\npriv extern fn take(n: i32) -> void;\n";
        assert!(diagnose(src).contains(&DiagnosticKind::FfiAnnotationMismatch));
    }

    #[test]
    fn transfer_annotation_on_pointer_param_is_clean() {
        let src = "#[transfer_full(p)]\npriv extern fn take(p: *i32) -> void;\n";
        assert!(!diagnose(src).contains(&DiagnosticKind::FfiAnnotationMismatch));
    }

    #[test]
    fn conflicting_ownership_annotations_are_flagged() {
        let src = "#[transfer_full(p)]\n#[borrowed(p)]\npriv extern fn take(p: *i32) -> void;\n";
        assert!(diagnose(src).contains(&DiagnosticKind::OwnershipConflict));
    }
}
