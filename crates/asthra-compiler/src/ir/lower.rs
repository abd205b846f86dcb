//! AST → IR lowering (spec.md §4.7, §6): walks the typed tree and produces
//! `ir::Module` — one [`Function`] per source function/method plus a
//! dedup'd string pool. A function whose signature wasn't recorded by
//! type-checking (already diagnosed elsewhere) is skipped rather than
//! guessed at; everything else lowers even if a subtree carries `TYPE_ERROR`,
//! degrading to [`Rvalue::Error`] instead of panicking.

use std::collections::HashMap;

use crate::analyze::type_check::{name_symbol, AnalyzedTypes};
use crate::analyze::types::{Type, TypeId, TYPE_ERROR, TYPE_I32};
use crate::diagnostics::Diagnostics;
use crate::lexer::{decode_char, decode_escapes, decode_number, NumberValue};
use crate::parser::ast::{self, AstNode, Expr, FunctionDecl, Pattern, SourceFile, Stmt};
use crate::parser::cst::SyntaxKind;
use crate::source::SourceId;

use super::{Attribute, BasicBlock, BinOp, Const, DataPool, Function, Instr, Label, LocalId, Module, Param, Rvalue, SwitchValue, Terminator, UnOp};

pub fn lower_module(_source_id: SourceId, file: &SourceFile, types: &AnalyzedTypes, _diagnostics: &mut Diagnostics) -> Module {
    let package = file.package().map(|p| p.path());
    let mut data_pool = DataPool::default();
    let mut functions = Vec::new();

    for func in file.functions() {
        if let Some(lowered) = lower_function(&package, None, &func, types, &mut data_pool) {
            functions.push(lowered);
        }
    }
    for imp in file.impls() {
        let target = imp.target_type();
        for method in imp.methods() {
            if let Some(lowered) = lower_function(&package, target.as_deref(), &method, types, &mut data_pool) {
                functions.push(lowered);
            }
        }
    }

    Module { functions, data_pool }
}

fn qualify(package: &Option<String>, target: Option<&str>, name: &str) -> String {
    let mut parts = Vec::new();
    if let Some(p) = package {
        if !p.is_empty() {
            parts.push(p.clone());
        }
    }
    if let Some(t) = target {
        parts.push(t.to_string());
    }
    parts.push(name.to_string());
    parts.join(".")
}

fn lower_function(
    package: &Option<String>,
    target: Option<&str>,
    func: &FunctionDecl,
    types: &AnalyzedTypes,
    data_pool: &mut DataPool,
) -> Option<Function> {
    let name = func.name()?;
    let sig = match target {
        Some(t) => types.methods.get(&(t.to_string(), name.clone()))?,
        None => types.functions.get(&name)?,
    };
    let qualified_name = qualify(package, target, &name);

    let mut ctx = LowerCtx {
        types,
        data_pool,
        locals: Vec::new(),
        names: vec![HashMap::new()],
        blocks: Vec::new(),
        next_label: 0,
        current: None,
        loop_stack: Vec::new(),
        return_type: sig.ret,
    };

    let mut params = Vec::new();
    for (pname, pty, _is_mut) in &sig.params {
        ctx.declare_local(pname.clone(), *pty);
        params.push(Param { name: pname.clone(), ty: *pty });
    }

    let entry = ctx.fresh_label();
    ctx.open(entry);
    if let Some(body) = func.body() {
        ctx.lower_function_body(&body);
    }
    ctx.terminate(Terminator::Return(None));

    let attributes = func.annotations().filter_map(|a| a.name()).map(|name| Attribute { name }).collect();

    Some(Function {
        qualified_name,
        params,
        return_type: sig.ret,
        locals: ctx.locals,
        blocks: ctx.blocks,
        attributes,
    })
}

struct LowerCtx<'a> {
    types: &'a AnalyzedTypes,
    data_pool: &'a mut DataPool,
    locals: Vec<TypeId>,
    names: Vec<HashMap<String, LocalId>>,
    blocks: Vec<BasicBlock>,
    next_label: u32,
    current: Option<(Label, Vec<Instr>)>,
    loop_stack: Vec<(Label, Label)>,
    return_type: TypeId,
}

impl LowerCtx<'_> {
    fn fresh_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn declare_local(&mut self, name: String, ty: TypeId) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(ty);
        self.names.last_mut().unwrap().insert(name, id);
        id
    }

    fn lookup_local(&self, name: &str) -> Option<LocalId> {
        self.names.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    fn push_scope(&mut self) {
        self.names.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.names.pop();
    }

    fn is_open(&self) -> bool {
        self.current.is_some()
    }

    fn emit(&mut self, instr: Instr) {
        if let Some((_, instructions)) = &mut self.current {
            instructions.push(instr);
        }
    }

    fn open(&mut self, label: Label) {
        debug_assert!(self.current.is_none());
        self.current = Some((label, Vec::new()));
    }

    /// Finalizes the open block with `term`; a no-op if nothing is open
    /// (the preceding statement already terminated it, e.g. `return`/`break`
    /// inside it — the rest of the enclosing block is unreachable).
    fn terminate(&mut self, term: Terminator) {
        if let Some((label, instructions)) = self.current.take() {
            self.blocks.push(BasicBlock { label, instructions, terminator: term });
        }
    }

    fn expr_ty(&self, expr: &Expr) -> Option<TypeId> {
        self.types.expr_types.get(&expr.syntax().text_range()).copied()
    }

    /// The function body gets one extra rule ordinary blocks don't: a
    /// trailing bare-expression statement in a non-`void` function is the
    /// function's return value (spec.md §4.7's "implicit returns are
    /// canonicalized" into an explicit `Return` terminator).
    fn lower_function_body(&mut self, body: &ast::Block) {
        let stmts: Vec<Stmt> = body.statements().collect();
        let void_return = matches!(self.types.ctx.get(self.return_type), Type::Void);
        for (i, stmt) in stmts.iter().enumerate() {
            if !self.is_open() {
                break;
            }
            let is_last = i + 1 == stmts.len();
            if is_last && !void_return {
                if let Stmt::Expr(s) = stmt {
                    if let Some(expr) = s.expr() {
                        let value = self.lower_expr(&expr);
                        self.terminate(Terminator::Return(Some(value)));
                        continue;
                    }
                }
            }
            self.lower_stmt(stmt);
        }
    }

    fn lower_block_stmts(&mut self, block: &ast::Block) {
        self.push_scope();
        for stmt in block.statements() {
            if !self.is_open() {
                break;
            }
            self.lower_stmt(&stmt);
        }
        self.pop_scope();
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        if !self.is_open() {
            return;
        }
        match stmt {
            Stmt::Let(s) => self.lower_let(s),
            Stmt::Assign(s) => self.lower_assign(s),
            Stmt::Return(s) => {
                let value = s.value().map(|e| self.lower_expr(&e));
                self.terminate(Terminator::Return(value));
            }
            Stmt::If(s) => self.lower_if(s),
            Stmt::Match(s) => self.lower_match(s),
            Stmt::For(s) => self.lower_for(s),
            Stmt::While(s) => self.lower_while(s),
            Stmt::Break(_) => {
                if let Some(&(exit, _)) = self.loop_stack.last() {
                    self.terminate(Terminator::Goto(exit));
                }
            }
            Stmt::Continue(_) => {
                if let Some(&(_, header)) = self.loop_stack.last() {
                    self.terminate(Terminator::Goto(header));
                }
            }
            Stmt::Unsafe(s) => {
                if let Some(body) = s.body() {
                    self.lower_block_stmts(&body);
                }
            }
            Stmt::Spawn(s) => {
                if let Some(call) = s.call() {
                    let value = self.lower_expr(&call);
                    self.emit(Instr::Eval(value));
                }
            }
            Stmt::Expr(s) => {
                if let Some(expr) = s.expr() {
                    let value = self.lower_expr(&expr);
                    self.emit(Instr::Eval(value));
                }
            }
        }
    }

    fn lower_let(&mut self, s: &ast::LetStmt) {
        let init = s.init();
        let ty = init.as_ref().and_then(|e| self.expr_ty(e)).unwrap_or(TYPE_ERROR);
        let value = init.map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
        let Some(name) = s.name() else { return };
        let local = self.declare_local(name, ty);
        self.emit(Instr::Assign { dest: local, value });
    }

    fn lower_assign(&mut self, s: &ast::AssignStmt) {
        let Some(target) = s.target() else { return };
        let place = self.lower_expr(&target);
        let rhs = s.value().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
        let value = match compound_binop(s.op()) {
            Some(op) => fold_binary(op, place.clone(), rhs),
            None => rhs,
        };
        self.emit(Instr::Store { place, value });
    }

    fn lower_if(&mut self, s: &ast::IfStmt) {
        let cond = s.condition().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
        let then_label = self.fresh_label();
        let else_label = self.fresh_label();
        let merge_label = self.fresh_label();
        self.terminate(Terminator::Branch { cond, then_block: then_label, else_block: else_label });

        self.open(then_label);
        if let Some(then_branch) = s.then_branch() {
            self.lower_block_stmts(&then_branch);
        }
        self.terminate(Terminator::Goto(merge_label));

        self.open(else_label);
        self.lower_else_chain(s.else_branch(), merge_label);

        self.open(merge_label);
    }

    fn lower_else_chain(&mut self, else_branch: Option<ast::ElseBranch>, merge_label: Label) {
        let Some(branch) = else_branch else {
            self.terminate(Terminator::Goto(merge_label));
            return;
        };

        if let Some(block) = branch.block() {
            self.lower_block_stmts(&block);
            self.terminate(Terminator::Goto(merge_label));
            return;
        }

        let Some(else_if) = branch.else_if() else {
            self.terminate(Terminator::Goto(merge_label));
            return;
        };

        let cond = else_if.condition().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
        let then_label = self.fresh_label();
        let else_label = self.fresh_label();
        self.terminate(Terminator::Branch { cond, then_block: then_label, else_block: else_label });

        self.open(then_label);
        if let Some(then_branch) = else_if.then_branch() {
            self.lower_block_stmts(&then_branch);
        }
        self.terminate(Terminator::Goto(merge_label));

        self.open(else_label);
        self.lower_else_chain(else_if.else_branch(), merge_label);
    }

    fn lower_while(&mut self, s: &ast::WhileStmt) {
        let header = self.fresh_label();
        let body = self.fresh_label();
        let exit = self.fresh_label();

        self.terminate(Terminator::Goto(header));
        self.open(header);
        let cond = s.condition().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
        self.terminate(Terminator::Branch { cond, then_block: body, else_block: exit });

        self.open(body);
        self.loop_stack.push((exit, header));
        if let Some(b) = s.body() {
            self.lower_block_stmts(&b);
        }
        self.loop_stack.pop();
        self.terminate(Terminator::Goto(header));

        self.open(exit);
    }

    /// Non-`range` iterables (arrays, slices) have no desugaring at this IR
    /// depth yet — the same gap DESIGN.md decision 12 records at the type
    /// level. The iterable is still evaluated once for side effects; the
    /// loop body is never lowered, rather than guessing at a wrong count.
    fn lower_for(&mut self, s: &ast::ForStmt) {
        let Some(iterable) = s.iterable() else { return };
        if let Expr::Range(range) = iterable.clone() {
            self.lower_for_range(s, &range);
            return;
        }
        let value = self.lower_expr(&iterable);
        self.emit(Instr::Eval(value));
    }

    fn lower_for_range(&mut self, s: &ast::ForStmt, range: &ast::RangeExpr) {
        let Some(binding) = s.binding() else { return };
        let start = range.start().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Const(Const::Int(0)));
        let end = range.end().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Const(Const::Int(0)));
        let inclusive = range.is_inclusive();

        self.push_scope();
        let loop_var = self.declare_local(binding, TYPE_I32);
        self.emit(Instr::Assign { dest: loop_var, value: start });

        let header = self.fresh_label();
        let body = self.fresh_label();
        let exit = self.fresh_label();

        self.terminate(Terminator::Goto(header));
        self.open(header);
        let cmp = if inclusive { BinOp::Le } else { BinOp::Lt };
        let cond = fold_binary(cmp, Rvalue::Local(loop_var), end);
        self.terminate(Terminator::Branch { cond, then_block: body, else_block: exit });

        self.open(body);
        self.loop_stack.push((exit, header));
        if let Some(b) = s.body() {
            self.lower_block_stmts(&b);
        }
        self.loop_stack.pop();
        let incremented = fold_binary(BinOp::Add, Rvalue::Local(loop_var), Rvalue::Const(Const::Int(1)));
        self.emit(Instr::Assign { dest: loop_var, value: incremented });
        self.terminate(Terminator::Goto(header));

        self.open(exit);
        self.pop_scope();
    }

    /// Compiles the scrutinee into a decision tree: a variant-tag `Switch`
    /// for enums, a two-way `Switch` for `bool`, degrading anything else to
    /// a single `default` arm (spec.md §4.7; mirrors the catch-all
    /// simplification `analyze::validation::exhaustiveness` already applies
    /// to struct/tuple patterns).
    fn lower_match(&mut self, s: &ast::MatchStmt) {
        let Some(scrutinee_expr) = s.scrutinee() else { return };
        let scrutinee = self.lower_expr(&scrutinee_expr);
        let resolved_ty = self.expr_ty(&scrutinee_expr).map(|t| self.types.ctx.resolve(t));

        let is_bool = resolved_ty.map(|t| matches!(self.types.ctx.get(t), Type::Bool)).unwrap_or(false);
        let enum_variants: Option<Vec<(String, Vec<TypeId>)>> = resolved_ty.and_then(|t| match self.types.ctx.get(t) {
            Type::Enum { def, .. } => self.types.enum_variants.iter().find(|(name, _)| name_symbol(name) == *def).map(|(_, v)| v.clone()),
            _ => None,
        });

        let merge = self.fresh_label();
        let arms: Vec<ast::MatchArm> = s.arms().collect();
        let arm_labels: Vec<Label> = arms.iter().map(|_| self.fresh_label()).collect();

        let mut switch_arms = Vec::new();
        let mut default_label = None;

        for (arm, &label) in arms.iter().zip(arm_labels.iter()) {
            let Some(pattern) = arm.pattern() else { continue };
            match &pattern {
                Pattern::Wildcard(_) | Pattern::Ident(_) | Pattern::Struct(_) | Pattern::Tuple(_) => {
                    if default_label.is_none() {
                        default_label = Some(label);
                    }
                }
                Pattern::Literal(lit) => {
                    if is_bool {
                        if let Some(tok) = lit.token() {
                            match tok.kind() {
                                SyntaxKind::KwTrue => switch_arms.push((SwitchValue::Bool(true), label)),
                                SyntaxKind::KwFalse => switch_arms.push((SwitchValue::Bool(false), label)),
                                _ => {}
                            }
                        }
                    }
                }
                Pattern::EnumVariant(v) => {
                    if let Some(variants) = &enum_variants {
                        if let Some(name) = v.variant_name() {
                            if let Some(index) = variants.iter().position(|(vn, _)| vn == &name) {
                                switch_arms.push((SwitchValue::VariantTag(index as u32), label));
                            }
                        }
                    }
                }
            }
        }

        let synthesized_default = default_label.is_none();
        let default = default_label.unwrap_or_else(|| self.fresh_label());
        self.terminate(Terminator::Switch { scrutinee, arms: switch_arms, default });

        for (arm, &label) in arms.iter().zip(arm_labels.iter()) {
            self.open(label);
            self.push_scope();
            if let Some(expr) = arm.body_expr() {
                let value = self.lower_expr(&expr);
                self.emit(Instr::Eval(value));
            }
            if let Some(block) = arm.body_block() {
                self.lower_block_stmts(&block);
            }
            self.pop_scope();
            self.terminate(Terminator::Goto(merge));
        }

        if synthesized_default {
            // Exhaustiveness is already checked by `analyze::validation`;
            // reaching here means a tag the type checker didn't know about.
            self.open(default);
            self.terminate(Terminator::Unreachable);
        }

        self.open(merge);
    }

    fn lower_literal(&mut self, lit: &ast::LiteralExpr) -> Rvalue {
        let Some(tok) = lit.token() else { return Rvalue::Error };
        match tok.kind() {
            SyntaxKind::IntLiteral | SyntaxKind::FloatLiteral => match decode_number(tok.text()) {
                Some(NumberValue::Int(v)) => Rvalue::Const(Const::Int(v as i64)),
                Some(NumberValue::Float(v)) => Rvalue::Const(Const::Float(v)),
                None => Rvalue::Error,
            },
            SyntaxKind::StringLiteral => {
                let text = tok.text();
                let inner = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(text);
                let id = self.data_pool.intern(&decode_escapes(inner));
                Rvalue::Const(Const::Str(id))
            }
            SyntaxKind::CharLiteral => {
                let text = tok.text();
                let inner = text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).unwrap_or(text);
                match decode_char(inner) {
                    Some(c) => Rvalue::Const(Const::Int(c as i64)),
                    None => Rvalue::Error,
                }
            }
            SyntaxKind::KwTrue => Rvalue::Const(Const::Bool(true)),
            SyntaxKind::KwFalse => Rvalue::Const(Const::Bool(false)),
            SyntaxKind::KwNull => Rvalue::Const(Const::Void),
            _ => Rvalue::Error,
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Rvalue {
        match expr {
            Expr::Literal(lit) => self.lower_literal(lit),
            Expr::Ident(ident) => {
                let Some(name) = ident.name() else { return Rvalue::Error };
                match self.lookup_local(&name) {
                    Some(id) => Rvalue::Local(id),
                    None => Rvalue::Call(name, Vec::new()),
                }
            }
            Expr::Path(p) => Rvalue::Call(p.segments().collect::<Vec<_>>().join("."), Vec::new()),
            Expr::FieldAccess(f) => {
                let base = f.base().map(|b| self.lower_expr(&b)).unwrap_or(Rvalue::Error);
                Rvalue::Field(Box::new(base), f.field().unwrap_or_default())
            }
            Expr::Index(idx) => {
                let base = idx.base().map(|b| self.lower_expr(&b)).unwrap_or(Rvalue::Error);
                let index = idx.index().map(|i| self.lower_expr(&i)).unwrap_or(Rvalue::Error);
                Rvalue::Index(Box::new(base), Box::new(index))
            }
            Expr::Call(c) => {
                let name = match c.callee() {
                    Some(Expr::Ident(ident)) => ident.name().unwrap_or_default(),
                    Some(Expr::Path(p)) => p.segments().collect::<Vec<_>>().join("."),
                    Some(other) => {
                        self.lower_expr(&other);
                        String::new()
                    }
                    None => String::new(),
                };
                let args = c.args().into_iter().flat_map(|a| a.args()).map(|a| self.lower_expr(&a)).collect();
                Rvalue::Call(name, args)
            }
            Expr::MethodCall(m) => {
                let receiver = m.receiver().map(|r| self.lower_expr(&r)).unwrap_or(Rvalue::Error);
                let method = m.method().unwrap_or_default();
                let args = m.args().into_iter().flat_map(|a| a.args()).map(|a| self.lower_expr(&a)).collect();
                Rvalue::MethodCall(Box::new(receiver), method, args)
            }
            Expr::Binary(b) => {
                let op = lower_binop(b.op());
                let lhs = b.lhs().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
                let rhs = b.rhs().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
                fold_binary(op, lhs, rhs)
            }
            Expr::Unary(u) => {
                let op = lower_unop(u.op());
                let operand = u.operand().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
                fold_unary(op, operand)
            }
            Expr::MutRef(m) => {
                let operand = m.operand().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
                fold_unary(UnOp::AddrOf, operand)
            }
            Expr::Cast(c) => {
                let inner = c.expr().map(|e| self.lower_expr(&e)).unwrap_or(Rvalue::Error);
                let ty = self.expr_ty(expr).unwrap_or(TYPE_ERROR);
                Rvalue::Cast(Box::new(inner), ty)
            }
            Expr::Struct(s) => {
                let name = s.name().unwrap_or_default();
                let fields = s.fields().filter_map(|f| Some((f.name()?, f.value().map(|v| self.lower_expr(&v)).unwrap_or(Rvalue::Error)))).collect();
                Rvalue::Struct(name, fields)
            }
            Expr::Array(a) => Rvalue::Array(a.elements().map(|e| self.lower_expr(&e)).collect()),
            // Ranges used as loop iterables are handled directly by
            // `lower_for_range`; as a bare value, and concurrency
            // primitives (`await`/receive/`select`), are outside this IR's
            // depth (spec.md §6 describes only the sequential CFG shape).
            Expr::Range(_) | Expr::Await(_) | Expr::Receive(_) | Expr::Select(_) => Rvalue::Error,
            Expr::GenericInst(g) => g.base().map(|b| self.lower_expr(&b)).unwrap_or(Rvalue::Error),
            Expr::Paren(p) => p.inner().map(|i| self.lower_expr(&i)).unwrap_or(Rvalue::Error),
        }
    }
}

fn lower_binop(op: Option<SyntaxKind>) -> BinOp {
    match op {
        Some(SyntaxKind::Plus) => BinOp::Add,
        Some(SyntaxKind::Minus) => BinOp::Sub,
        Some(SyntaxKind::Star) => BinOp::Mul,
        Some(SyntaxKind::Slash) => BinOp::Div,
        Some(SyntaxKind::Percent) => BinOp::Rem,
        Some(SyntaxKind::EqEq) => BinOp::Eq,
        Some(SyntaxKind::Ne) => BinOp::Ne,
        Some(SyntaxKind::Lt) => BinOp::Lt,
        Some(SyntaxKind::Le) => BinOp::Le,
        Some(SyntaxKind::Gt) => BinOp::Gt,
        Some(SyntaxKind::Ge) => BinOp::Ge,
        Some(SyntaxKind::AmpAmp) => BinOp::And,
        Some(SyntaxKind::PipePipe) => BinOp::Or,
        Some(SyntaxKind::Amp) => BinOp::BitAnd,
        Some(SyntaxKind::Pipe) => BinOp::BitOr,
        Some(SyntaxKind::Caret) => BinOp::BitXor,
        Some(SyntaxKind::Shl) => BinOp::Shl,
        Some(SyntaxKind::Shr) => BinOp::Shr,
        _ => BinOp::Add,
    }
}

/// The `BinOp` a compound assignment operator desugars to (`x += 1` becomes
/// `x = x + 1`); `None` for plain `=`, which has no operand to fold in.
fn compound_binop(op: Option<SyntaxKind>) -> Option<BinOp> {
    Some(match op {
        Some(SyntaxKind::PlusEq) => BinOp::Add,
        Some(SyntaxKind::MinusEq) => BinOp::Sub,
        Some(SyntaxKind::StarEq) => BinOp::Mul,
        Some(SyntaxKind::SlashEq) => BinOp::Div,
        Some(SyntaxKind::PercentEq) => BinOp::Rem,
        Some(SyntaxKind::AmpEq) => BinOp::BitAnd,
        Some(SyntaxKind::PipeEq) => BinOp::BitOr,
        Some(SyntaxKind::CaretEq) => BinOp::BitXor,
        Some(SyntaxKind::ShlEq) => BinOp::Shl,
        Some(SyntaxKind::ShrEq) => BinOp::Shr,
        _ => return None,
    })
}

fn lower_unop(op: Option<SyntaxKind>) -> UnOp {
    match op {
        Some(SyntaxKind::Minus) => UnOp::Neg,
        Some(SyntaxKind::Bang) => UnOp::Not,
        Some(SyntaxKind::Star) => UnOp::Deref,
        Some(SyntaxKind::Amp) => UnOp::AddrOf,
        _ => UnOp::Not,
    }
}

/// Folds `lhs op rhs` when both sides are already constants (spec.md §4.7:
/// "simple constant sub-expressions are folded"); otherwise builds the
/// unevaluated node.
fn fold_binary(op: BinOp, lhs: Rvalue, rhs: Rvalue) -> Rvalue {
    if let (Rvalue::Const(a), Rvalue::Const(b)) = (&lhs, &rhs) {
        if let Some(folded) = fold_const_binary(op, a, b) {
            return Rvalue::Const(folded);
        }
    }
    Rvalue::Binary(op, Box::new(lhs), Box::new(rhs))
}

fn fold_const_binary(op: BinOp, a: &Const, b: &Const) -> Option<Const> {
    use Const::*;
    match (a, b) {
        (Int(x), Int(y)) => match op {
            BinOp::Add => Some(Int(x.wrapping_add(*y))),
            BinOp::Sub => Some(Int(x.wrapping_sub(*y))),
            BinOp::Mul => Some(Int(x.wrapping_mul(*y))),
            BinOp::Div if *y != 0 => Some(Int(x / y)),
            BinOp::Rem if *y != 0 => Some(Int(x % y)),
            BinOp::Eq => Some(Bool(x == y)),
            BinOp::Ne => Some(Bool(x != y)),
            BinOp::Lt => Some(Bool(x < y)),
            BinOp::Le => Some(Bool(x <= y)),
            BinOp::Gt => Some(Bool(x > y)),
            BinOp::Ge => Some(Bool(x >= y)),
            BinOp::BitAnd => Some(Int(x & y)),
            BinOp::BitOr => Some(Int(x | y)),
            BinOp::BitXor => Some(Int(x ^ y)),
            BinOp::Shl => Some(Int(x.wrapping_shl(*y as u32))),
            BinOp::Shr => Some(Int(x.wrapping_shr(*y as u32))),
            _ => None,
        },
        (Float(x), Float(y)) => match op {
            BinOp::Add => Some(Float(x + y)),
            BinOp::Sub => Some(Float(x - y)),
            BinOp::Mul => Some(Float(x * y)),
            BinOp::Div => Some(Float(x / y)),
            BinOp::Eq => Some(Bool(x == y)),
            BinOp::Ne => Some(Bool(x != y)),
            BinOp::Lt => Some(Bool(x < y)),
            BinOp::Le => Some(Bool(x <= y)),
            BinOp::Gt => Some(Bool(x > y)),
            BinOp::Ge => Some(Bool(x >= y)),
            _ => None,
        },
        (Bool(x), Bool(y)) => match op {
            BinOp::And => Some(Bool(*x && *y)),
            BinOp::Or => Some(Bool(*x || *y)),
            BinOp::Eq => Some(Bool(x == y)),
            BinOp::Ne => Some(Bool(x != y)),
            _ => None,
        },
        _ => None,
    }
}

fn fold_unary(op: UnOp, operand: Rvalue) -> Rvalue {
    if let Rvalue::Const(c) = &operand {
        match (op, c) {
            (UnOp::Neg, Const::Int(v)) => return Rvalue::Const(Const::Int(v.wrapping_neg())),
            (UnOp::Neg, Const::Float(v)) => return Rvalue::Const(Const::Float(-v)),
            (UnOp::Not, Const::Bool(v)) => return Rvalue::Const(Const::Bool(!v)),
            _ => {}
        }
    }
    Rvalue::Unary(op, Box::new(operand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use crate::parser::parse_source;
    use crate::source::SourceManager;

    fn lower(src: &str) -> Module {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        let out = parse_source(id, src);
        let file = SourceFile::cast(out.syntax()).unwrap();
        let mut diagnostics = out.diagnostics;
        let analysis = analyze(id, &file, &mut diagnostics);
        lower_module(id, &file, &analysis.types, &mut diagnostics)
    }

    #[test]
    fn simple_function_lowers_one_block_with_return() {
        let module = lower("pub fn f(none) -> i32 { return 1; }\n");
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.blocks.len(), 1);
        assert!(matches!(f.blocks[0].terminator, Terminator::Return(Some(Rvalue::Const(Const::Int(1))))));
    }

    #[test]
    fn trailing_expression_becomes_implicit_return() {
        let module = lower("pub fn f(none) -> i32 { 1 + 2; }\n");
        let f = &module.functions[0];
        match &f.blocks[0].terminator {
            Terminator::Return(Some(Rvalue::Const(Const::Int(3)))) => {}
            other => panic!("expected folded implicit return, got {other:?}"),
        }
    }

    #[test]
    fn constant_arithmetic_is_folded() {
        let module = lower("pub fn f(none) -> i32 { let x: i32 = 2 * 3; return x; }\n");
        let f = &module.functions[0];
        assert!(matches!(&f.blocks[0].instructions[0], Instr::Assign { value: Rvalue::Const(Const::Int(6)), .. }));
    }

    #[test]
    fn if_else_lowers_to_three_blocks_plus_merge() {
        let module = lower("pub fn f(b: bool) -> i32 { if b { return 1; } else { return 0; } return 2; }\n");
        let f = &module.functions[0];
        assert!(f.blocks.iter().any(|b| matches!(b.terminator, Terminator::Branch { .. })));
    }

    #[test]
    fn while_loop_has_header_body_exit() {
        let module = lower("pub fn f(none) -> i32 { let mut i: i32 = 0; while i < 10 { i = i + 1; } return i; }\n");
        let f = &module.functions[0];
        let gotos = f.blocks.iter().filter(|b| matches!(b.terminator, Terminator::Goto(_))).count();
        assert!(gotos >= 2);
    }

    #[test]
    fn range_for_desugars_into_a_counting_loop() {
        let module = lower("pub fn f(none) -> i32 { let mut sum: i32 = 0; for i in 0..3 { sum = sum + i; } return sum; }\n");
        let f = &module.functions[0];
        assert_eq!(f.locals.len(), 2);
        assert!(f.blocks.iter().any(|b| matches!(b.terminator, Terminator::Branch { .. })));
    }

    #[test]
    fn bool_match_compiles_to_two_way_switch() {
        let src = "pub fn f(b: bool) -> i32 { match b { true => 1, false => 0, } return 0; }\n";
        let module = lower(src);
        let f = &module.functions[0];
        let switch = f.blocks.iter().find_map(|b| match &b.terminator {
            Terminator::Switch { arms, .. } => Some(arms.clone()),
            _ => None,
        });
        assert_eq!(switch.unwrap().len(), 2);
    }

    #[test]
    fn compound_assignment_synthesizes_the_operator_instead_of_dropping_it() {
        let module = lower("pub fn f(none) -> i32 { let mut x: i32 = 1; x += 2; return x; }\n");
        let f = &module.functions[0];
        let store = f.blocks[0].instructions.iter().find_map(|i| match i {
            Instr::Store { place, value } => Some((place, value)),
            _ => None,
        });
        let (place, value) = store.expect("x += 2 lowers to a Store");
        let Rvalue::Local(place_id) = place else { panic!("expected a local place, got {place:?}") };
        match value {
            Rvalue::Binary(BinOp::Add, lhs, rhs) => {
                assert!(matches!(lhs.as_ref(), Rvalue::Local(id) if *id == *place_id), "lhs of the synthesized `+` must read the prior value of `x`");
                assert!(matches!(rhs.as_ref(), Rvalue::Const(Const::Int(2))));
            }
            other => panic!("expected `x + 2`, got {other:?}"),
        }
    }

    #[test]
    fn string_literals_are_deduplicated() {
        let src = r#"pub fn f(none) -> void { let a: string = "hi"; let b: string = "hi"; return; }"#;
        let module = lower(src);
        assert_eq!(module.data_pool.len(), 1);
    }
}
