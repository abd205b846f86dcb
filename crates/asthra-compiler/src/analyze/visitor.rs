//! AST visitor pattern over the typed layer (`parser::ast`).
//!
//! Implement `Visitor` and override the `visit_*` methods you care about;
//! call the matching `walk_*` free function to keep descending, or omit it
//! to prune that subtree.

use crate::parser::ast::{
    AstNode, Block, Expr, FunctionDecl, MatchArm, Pattern, SourceFile, Stmt,
};

pub trait Visitor: Sized {
    fn visit_source_file(&mut self, file: &SourceFile) {
        walk_source_file(self, file);
    }

    fn visit_function(&mut self, func: &FunctionDecl) {
        walk_function(self, func);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_pattern(&mut self, _pattern: &Pattern) {}
}

pub fn walk_source_file<V: Visitor>(visitor: &mut V, file: &SourceFile) {
    for func in file.functions() {
        visitor.visit_function(&func);
    }
    for imp in file.impls() {
        for method in imp.methods() {
            visitor.visit_function(&method);
        }
    }
}

pub fn walk_function<V: Visitor>(visitor: &mut V, func: &FunctionDecl) {
    if let Some(body) = func.body() {
        visitor.visit_block(&body);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in block.statements() {
        visitor.visit_stmt(&stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Let(s) => {
            if let Some(init) = s.init() {
                visitor.visit_expr(&init);
            }
        }
        Stmt::Assign(s) => {
            if let Some(target) = s.target() {
                visitor.visit_expr(&target);
            }
            if let Some(value) = s.value() {
                visitor.visit_expr(&value);
            }
        }
        Stmt::Return(s) => {
            if let Some(value) = s.value() {
                visitor.visit_expr(&value);
            }
        }
        Stmt::If(s) => {
            if let Some(cond) = s.condition() {
                visitor.visit_expr(&cond);
            }
            if let Some(then_branch) = s.then_branch() {
                visitor.visit_block(&then_branch);
            }
            let mut else_branch = s.else_branch();
            while let Some(branch) = else_branch {
                if let Some(block) = branch.block() {
                    visitor.visit_block(&block);
                    break;
                }
                if let Some(else_if) = branch.else_if() {
                    if let Some(cond) = else_if.condition() {
                        visitor.visit_expr(&cond);
                    }
                    if let Some(then_branch) = else_if.then_branch() {
                        visitor.visit_block(&then_branch);
                    }
                    else_branch = else_if.else_branch();
                } else {
                    break;
                }
            }
        }
        Stmt::Match(s) => {
            if let Some(scrutinee) = s.scrutinee() {
                visitor.visit_expr(&scrutinee);
            }
            for arm in s.arms() {
                walk_match_arm(visitor, &arm);
            }
        }
        Stmt::For(s) => {
            if let Some(iterable) = s.iterable() {
                visitor.visit_expr(&iterable);
            }
            if let Some(body) = s.body() {
                visitor.visit_block(&body);
            }
        }
        Stmt::While(s) => {
            if let Some(cond) = s.condition() {
                visitor.visit_expr(&cond);
            }
            if let Some(body) = s.body() {
                visitor.visit_block(&body);
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) => {}
        Stmt::Unsafe(s) => {
            if let Some(body) = s.body() {
                visitor.visit_block(&body);
            }
        }
        Stmt::Spawn(s) => {
            if let Some(call) = s.call() {
                visitor.visit_expr(&call);
            }
        }
        Stmt::Expr(s) => {
            if let Some(expr) = s.expr() {
                visitor.visit_expr(&expr);
            }
        }
    }
}

fn walk_match_arm<V: Visitor>(visitor: &mut V, arm: &MatchArm) {
    if let Some(pattern) = arm.pattern() {
        visitor.visit_pattern(&pattern);
    }
    if let Some(expr) = arm.body_expr() {
        visitor.visit_expr(&expr);
    }
    if let Some(block) = arm.body_block() {
        visitor.visit_block(&block);
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Literal(_) | Expr::Ident(_) | Expr::Path(_) => {}
        Expr::FieldAccess(e) => {
            if let Some(base) = e.base() {
                visitor.visit_expr(&base);
            }
        }
        Expr::Index(e) => {
            for operand in e.exprs() {
                visitor.visit_expr(&operand);
            }
        }
        Expr::Call(e) => {
            if let Some(callee) = e.callee() {
                visitor.visit_expr(&callee);
            }
            if let Some(args) = e.args() {
                for arg in args.args() {
                    visitor.visit_expr(&arg);
                }
            }
        }
        Expr::MethodCall(e) => {
            if let Some(receiver) = e.receiver() {
                visitor.visit_expr(&receiver);
            }
            if let Some(args) = e.args() {
                for arg in args.args() {
                    visitor.visit_expr(&arg);
                }
            }
        }
        Expr::Binary(e) => {
            for operand in e.operands() {
                visitor.visit_expr(&operand);
            }
        }
        Expr::Unary(e) => {
            if let Some(operand) = e.operand() {
                visitor.visit_expr(&operand);
            }
        }
        Expr::MutRef(e) => {
            if let Some(operand) = e.operand() {
                visitor.visit_expr(&operand);
            }
        }
        Expr::Cast(e) => {
            if let Some(inner) = e.expr() {
                visitor.visit_expr(&inner);
            }
        }
        Expr::Struct(e) => {
            for field in e.fields() {
                if let Some(value) = field.value() {
                    visitor.visit_expr(&value);
                }
            }
        }
        Expr::Array(e) => {
            for element in e.elements() {
                visitor.visit_expr(&element);
            }
        }
        Expr::Range(e) => {
            for bound in e.bounds() {
                visitor.visit_expr(&bound);
            }
        }
        Expr::Await(e) => {
            if let Some(inner) = e.expr() {
                visitor.visit_expr(&inner);
            }
        }
        Expr::Receive(e) => {
            if let Some(channel) = e.channel() {
                visitor.visit_expr(&channel);
            }
        }
        Expr::Select(e) => {
            for arm in e.arms() {
                if let Some(channel) = arm.channel() {
                    visitor.visit_expr(&channel);
                }
                if let Some(body) = arm.body() {
                    visitor.visit_block(&body);
                }
            }
        }
        Expr::GenericInst(e) => {
            if let Some(base) = e.base() {
                visitor.visit_expr(&base);
            }
        }
        Expr::Paren(e) => {
            if let Some(inner) = e.inner() {
                visitor.visit_expr(&inner);
            }
        }
    }
}
