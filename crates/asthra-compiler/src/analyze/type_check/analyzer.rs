//! The semantic analyzer's typed walk (spec.md §4.6): resolves identifiers
//! against locals-then-module scope, infers/checks expression types with
//! Go-style local inference (no cross-function unification — every
//! function signature must be fully annotated), and writes the result into
//! an `AnalyzedTypes` for the IR lowering pass to consume.

use std::collections::HashMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{self, AstNode, Expr, SourceFile, Stmt, TypeRef};
use crate::source::SourceId;

use super::super::symbol_table::SymbolId;
use super::super::types::{FloatWidth, IntWidth, Type, TypeContext, TypeId, TYPE_BOOL, TYPE_ERROR, TYPE_I32, TYPE_NEVER, TYPE_STRING, TYPE_VOID};

/// Struct/enum identity for `Type::Struct`/`Type::Enum`, keyed by name. This
/// analyzer works one file at a time and never shares a `SymbolTable`, so it
/// derives a stable `SymbolId` from the name itself rather than a real scope
/// lookup; any two structs sharing a name already collide at declaration
/// time (`DuplicateSymbol`), so the derived id stays unique in practice.
pub fn name_symbol(name: &str) -> SymbolId {
    let mut hash: u32 = 0x811c9dc5;
    for b in name.bytes() {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    SymbolId::from_raw(hash)
}

#[derive(Clone, Debug)]
pub struct FunctionSig {
    pub params: Vec<(String, TypeId, bool)>,
    pub ret: TypeId,
}

#[derive(Debug, Default)]
pub struct AnalyzedTypes {
    pub ctx: TypeContext,
    pub functions: HashMap<String, FunctionSig>,
    pub methods: HashMap<(String, String), FunctionSig>,
    pub struct_fields: HashMap<String, Vec<(String, TypeId)>>,
    pub enum_variants: HashMap<String, Vec<(String, Vec<TypeId>)>>,
    /// Per-expression resolved type, keyed by the expression's text range
    /// (stable across the immutable tree; there is exactly one expression
    /// node per source span).
    pub expr_types: HashMap<rowan::TextRange, TypeId>,
}

impl AnalyzedTypes {
    fn record(&mut self, expr: &Expr, ty: TypeId) -> TypeId {
        self.expr_types.insert(expr.syntax().text_range(), ty);
        ty
    }
}

pub fn analyze_types(source_id: SourceId, file: &SourceFile, diagnostics: &mut Diagnostics) -> AnalyzedTypes {
    let mut out = AnalyzedTypes { ctx: TypeContext::new(), ..Default::default() };
    collect_signatures(source_id, file, &mut out, diagnostics);

    for func in file.functions() {
        check_function(source_id, &func, None, &out.functions.clone(), &mut out, diagnostics);
    }
    for imp in file.impls() {
        let Some(target) = imp.target_type() else { continue };
        for method in imp.methods() {
            check_function(source_id, &method, Some(&target), &out.functions.clone(), &mut out, diagnostics);
        }
    }

    out
}

/// The set of struct/enum names visible while lowering `TypeRef`s. Populated
/// with every declared name before any field/signature is lowered, so
/// forward references (a struct field typed as an enum declared later in
/// the file, and vice versa) resolve correctly.
#[derive(Clone, Copy)]
struct Names<'a> {
    structs: &'a HashMap<String, Vec<(String, TypeId)>>,
    enums: &'a HashMap<String, Vec<(String, Vec<TypeId>)>>,
}

fn lower_type_ref(ty: &TypeRef, ctx: &mut TypeContext, names: Names<'_>) -> TypeId {
    match ty {
        TypeRef::Void(_) => TYPE_VOID,
        TypeRef::Never(_) => TYPE_NEVER,
        TypeRef::Named(n) => named_type(n.name().as_deref(), ctx, names),
        TypeRef::Generic(g) => {
            // No user-declared generics are lowered to a concrete shape yet
            // (monomorphization happens at call sites during IR lowering);
            // surface as the base named type so arity/field checks still work.
            named_type(g.name().as_deref(), ctx, names)
        }
        TypeRef::Pointer(p) => {
            let inner = p.pointee().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_ERROR);
            ctx.intern(Type::Pointer { inner, mutable: p.is_mut() })
        }
        TypeRef::Slice(s) => {
            let inner = s.element().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_ERROR);
            ctx.intern(Type::Slice(inner))
        }
        TypeRef::Array(a) => {
            let inner = a.element().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_ERROR);
            // Array length is a const expression; without constant
            // evaluation wired up yet, 0 is a placeholder distinct enough
            // to still let slice/array mismatches be caught structurally.
            ctx.intern(Type::Array { element: inner, len: 0 })
        }
        TypeRef::Tuple(t) => {
            let elems = t.elements().map(|e| lower_type_ref(&e, ctx, names)).collect();
            ctx.intern(Type::Tuple(elems))
        }
        TypeRef::Function(f) => {
            let params = f.params().iter().map(|p| lower_type_ref(p, ctx, names)).collect();
            let ret = f.return_type().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_VOID);
            ctx.intern(Type::Function { params, ret, extern_abi: false })
        }
    }
}

fn named_type(name: Option<&str>, ctx: &mut TypeContext, names: Names<'_>) -> TypeId {
    match name {
        Some("bool") => TYPE_BOOL,
        Some("string") => TYPE_STRING,
        Some("char") => ctx.intern(Type::Char),
        Some("i8") => ctx.intern(Type::Int { signed: true, width: IntWidth::W8 }),
        Some("i16") => ctx.intern(Type::Int { signed: true, width: IntWidth::W16 }),
        Some("i32") => ctx.intern(Type::Int { signed: true, width: IntWidth::W32 }),
        Some("i64") => ctx.intern(Type::Int { signed: true, width: IntWidth::W64 }),
        Some("i128") => ctx.intern(Type::Int { signed: true, width: IntWidth::W128 }),
        Some("isize") => ctx.intern(Type::Int { signed: true, width: IntWidth::Size }),
        Some("u8") => ctx.intern(Type::Int { signed: false, width: IntWidth::W8 }),
        Some("u16") => ctx.intern(Type::Int { signed: false, width: IntWidth::W16 }),
        Some("u32") => ctx.intern(Type::Int { signed: false, width: IntWidth::W32 }),
        Some("u64") => ctx.intern(Type::Int { signed: false, width: IntWidth::W64 }),
        Some("u128") => ctx.intern(Type::Int { signed: false, width: IntWidth::W128 }),
        Some("usize") => ctx.intern(Type::Int { signed: false, width: IntWidth::Size }),
        Some("f32") => ctx.intern(Type::Float(FloatWidth::W32)),
        Some("f64") => ctx.intern(Type::Float(FloatWidth::W64)),
        Some(other) if names.structs.contains_key(other) => ctx.intern(Type::Struct { def: name_symbol(other), args: Vec::new() }),
        Some(other) if names.enums.contains_key(other) => ctx.intern(Type::Enum { def: name_symbol(other), args: Vec::new() }),
        Some(_) => TYPE_ERROR,
        None => TYPE_ERROR,
    }
}

fn collect_signatures(source_id: SourceId, file: &SourceFile, out: &mut AnalyzedTypes, diagnostics: &mut Diagnostics) {
    // Forward-declare every struct/enum name before lowering any field or
    // signature, so type references don't depend on declaration order.
    for st in file.structs() {
        if let Some(name) = st.name() {
            out.struct_fields.entry(name).or_default();
        }
    }
    for en in file.enums() {
        if let Some(name) = en.name() {
            out.enum_variants.entry(name).or_default();
        }
    }

    for st in file.structs() {
        let Some(name) = st.name() else { continue };
        let fields = st
            .fields()
            .filter_map(|f| {
                let fname = f.name()?;
                let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
                let ty = f.ty().map(|t| lower_type_ref(&t, &mut out.ctx, names)).unwrap_or(TYPE_ERROR);
                Some((fname, ty))
            })
            .collect();
        out.struct_fields.insert(name, fields);
    }

    for en in file.enums() {
        let Some(name) = en.name() else { continue };
        let variants = en
            .variants()
            .filter_map(|v| {
                let vname = v.name()?;
                let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
                let payload = v.payload_types().map(|t| lower_type_ref(&t, &mut out.ctx, names)).collect();
                Some((vname, payload))
            })
            .collect();
        out.enum_variants.insert(name, variants);
    }

    for func in file.functions() {
        let Some(name) = func.name() else { continue };
        let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
        let sig = lower_signature(&func, &mut out.ctx, names);
        out.functions.insert(name, sig);
    }
    for ext in file.externs() {
        let Some(name) = ext.name() else { continue };
        let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
        let params = ext
            .params()
            .map(|pl| pl.params().map(|p| (p.name().unwrap_or_default(), p.ty().map(|t| lower_type_ref(&t, &mut out.ctx, names)).unwrap_or(TYPE_ERROR), p.is_mut())).collect())
            .unwrap_or_default();
        let ret = ext.return_type().map(|t| lower_type_ref(&t, &mut out.ctx, names)).unwrap_or(TYPE_VOID);
        out.functions.insert(name, FunctionSig { params, ret });
    }
    for imp in file.impls() {
        let Some(target) = imp.target_type() else { continue };
        for method in imp.methods() {
            let Some(mname) = method.name() else { continue };
            let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
            let sig = lower_signature(&method, &mut out.ctx, names);
            out.methods.insert((target.clone(), mname), sig);
        }
    }
    let _ = (source_id, diagnostics);
}

fn lower_signature(func: &ast::FunctionDecl, ctx: &mut TypeContext, names: Names<'_>) -> FunctionSig {
    let params = func
        .params()
        .map(|pl| {
            pl.params()
                .filter(|p| p.name().as_deref() != Some("self"))
                .map(|p| (p.name().unwrap_or_default(), p.ty().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_ERROR), p.is_mut()))
                .collect()
        })
        .unwrap_or_default();
    let ret = func.return_type().map(|t| lower_type_ref(&t, ctx, names)).unwrap_or(TYPE_VOID);
    FunctionSig { params, ret }
}

struct Locals {
    scopes: Vec<HashMap<String, (TypeId, bool)>>,
}

impl Locals {
    fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: String, ty: TypeId, is_mut: bool) {
        self.scopes.last_mut().unwrap().insert(name, (ty, is_mut));
    }

    fn lookup(&self, name: &str) -> Option<(TypeId, bool)> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }
}

fn check_function(
    source_id: SourceId,
    func: &ast::FunctionDecl,
    self_type: Option<&str>,
    functions: &HashMap<String, FunctionSig>,
    out: &mut AnalyzedTypes,
    diagnostics: &mut Diagnostics,
) {
    let Some(body) = func.body() else { return };
    let sig = if let Some(self_type) = self_type {
        let Some(name) = func.name() else { return };
        out.methods.get(&(self_type.to_string(), name)).cloned()
    } else {
        func.name().and_then(|n| out.functions.get(&n).cloned())
    };
    let Some(sig) = sig else { return };

    let mut locals = Locals::new();
    if let Some(self_type) = self_type {
        let names = Names { structs: &out.struct_fields, enums: &out.enum_variants };
        let self_ty = named_type(Some(self_type), &mut out.ctx, names);
        locals.declare("self".to_string(), self_ty, false);
    }
    for (name, ty, is_mut) in &sig.params {
        if !name.is_empty() {
            locals.declare(name.clone(), *ty, *is_mut);
        }
    }

    let mut checker = BodyChecker { source_id, functions, out, diagnostics, locals, return_type: sig.ret };
    for stmt in body.statements() {
        checker.check_stmt(&stmt);
    }
}

struct BodyChecker<'a> {
    source_id: SourceId,
    functions: &'a HashMap<String, FunctionSig>,
    out: &'a mut AnalyzedTypes,
    diagnostics: &'a mut Diagnostics,
    locals: Locals,
    return_type: TypeId,
}

impl BodyChecker<'_> {
    fn mismatch(&mut self, range: rowan::TextRange, expected: TypeId, got: TypeId) {
        let expected_s = self.out.ctx.display(expected);
        let got_s = self.out.ctx.display(got);
        self.diagnostics
            .report(self.source_id, DiagnosticKind::TypeMismatch, range)
            .message(format!("expected `{expected_s}`, found `{got_s}`"))
            .inferred_types(vec![expected_s, got_s])
            .emit();
    }

    fn expect(&mut self, range: rowan::TextRange, expected: TypeId, got: TypeId) -> TypeId {
        match self.out.ctx.unify(expected, got) {
            Ok(ty) => ty,
            Err(_) if self.out.ctx.is_untyped_literal_coercion(got, expected) => expected,
            Err(_) => {
                self.mismatch(range, expected, got);
                TYPE_ERROR
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(s) => {
                let init_ty = s.init().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
                let names = Names { structs: &self.out.struct_fields, enums: &self.out.enum_variants };
                let declared = s.ty().map(|t| lower_type_ref(&t, &mut self.out.ctx, names));
                let ty = match declared {
                    Some(declared) => {
                        if let Some(init) = s.init() {
                            self.expect(init.syntax().text_range(), declared, init_ty)
                        } else {
                            declared
                        }
                    }
                    None => init_ty,
                };
                if let Some(name) = s.name() {
                    self.locals.declare(name, ty, s.is_mut());
                }
            }
            Stmt::Assign(s) => {
                // Whether the target is a valid lvalue rooted in a `mut`
                // binding is `analyze::validation::immutability`'s job, run
                // after the whole file is typed; this pass only checks types.
                let target_ty = s.target().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
                if let Some(value) = s.value() {
                    let value_ty = self.check_expr(&value);
                    self.expect(value.syntax().text_range(), target_ty, value_ty);
                }
            }
            Stmt::Return(s) => {
                let ty = s.value().map(|e| self.check_expr(&e)).unwrap_or(TYPE_VOID);
                let range = s.value().map(|e| e.syntax().text_range()).unwrap_or_else(|| s.syntax().text_range());
                self.expect(range, self.return_type, ty);
            }
            Stmt::If(s) => {
                if let Some(cond) = s.condition() {
                    let cond_ty = self.check_expr(&cond);
                    self.expect(cond.syntax().text_range(), TYPE_BOOL, cond_ty);
                }
                if let Some(then_branch) = s.then_branch() {
                    self.check_block(&then_branch);
                }
                let mut else_branch = s.else_branch();
                while let Some(branch) = else_branch {
                    if let Some(block) = branch.block() {
                        self.check_block(&block);
                        break;
                    }
                    if let Some(else_if) = branch.else_if() {
                        if let Some(cond) = else_if.condition() {
                            let cond_ty = self.check_expr(&cond);
                            self.expect(cond.syntax().text_range(), TYPE_BOOL, cond_ty);
                        }
                        if let Some(then_branch) = else_if.then_branch() {
                            self.check_block(&then_branch);
                        }
                        else_branch = else_if.else_branch();
                    } else {
                        break;
                    }
                }
            }
            Stmt::Match(s) => {
                let _scrutinee_ty = s.scrutinee().map(|e| self.check_expr(&e));
                for arm in s.arms() {
                    self.locals.push();
                    if let Some(body) = arm.body_expr() {
                        self.check_expr(&body);
                    }
                    if let Some(body) = arm.body_block() {
                        self.check_block(&body);
                    }
                    self.locals.pop();
                }
            }
            Stmt::For(s) => {
                let _iterable_ty = s.iterable().map(|e| self.check_expr(&e));
                self.locals.push();
                if let Some(binding) = s.binding() {
                    self.locals.declare(binding, TYPE_I32, false);
                }
                if let Some(body) = s.body() {
                    self.check_block(&body);
                }
                self.locals.pop();
            }
            Stmt::While(s) => {
                if let Some(cond) = s.condition() {
                    let cond_ty = self.check_expr(&cond);
                    self.expect(cond.syntax().text_range(), TYPE_BOOL, cond_ty);
                }
                if let Some(body) = s.body() {
                    self.check_block(&body);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
            Stmt::Unsafe(s) => {
                if let Some(body) = s.body() {
                    self.check_block(&body);
                }
            }
            Stmt::Spawn(s) => {
                if let Some(call) = s.call() {
                    self.check_expr(&call);
                }
            }
            Stmt::Expr(s) => {
                if let Some(expr) = s.expr() {
                    self.check_expr(&expr);
                }
            }
        }
    }

    fn check_block(&mut self, block: &ast::Block) {
        self.locals.push();
        for stmt in block.statements() {
            self.check_stmt(&stmt);
        }
        self.locals.pop();
    }

    fn check_expr(&mut self, expr: &Expr) -> TypeId {
        let ty = self.infer_expr(expr);
        self.out.record(expr, ty)
    }

    fn infer_expr(&mut self, expr: &Expr) -> TypeId {
        match expr {
            Expr::Literal(lit) => literal_type(lit),
            Expr::Ident(ident) => {
                let Some(name) = ident.name() else { return TYPE_ERROR };
                if let Some((ty, _)) = self.locals.lookup(&name) {
                    return ty;
                }
                if let Some(sig) = self.functions.get(&name) {
                    let params = sig.params.iter().map(|(_, t, _)| *t).collect();
                    return self.out.ctx.intern(Type::Function { params, ret: sig.ret, extern_abi: false });
                }
                self.diagnostics.report(self.source_id, DiagnosticKind::UndefinedSymbol, ident.syntax().text_range()).message(format!("undefined symbol `{name}`")).emit();
                TYPE_ERROR
            }
            Expr::Path(_) => TYPE_ERROR,
            Expr::FieldAccess(f) => {
                let base_ty = f.base().map(|b| self.check_expr(&b)).unwrap_or(TYPE_ERROR);
                let Some(field_name) = f.field() else { return TYPE_ERROR };
                self.field_type(base_ty, &field_name, f.syntax().text_range())
            }
            Expr::Index(idx) => {
                let base_ty = idx.base().map(|b| self.check_expr(&b)).unwrap_or(TYPE_ERROR);
                if let Some(index) = idx.index() {
                    self.check_expr(&index);
                }
                match self.out.ctx.get(self.out.ctx.resolve(base_ty)).clone() {
                    Type::Slice(inner) | Type::Array { element: inner, .. } => inner,
                    Type::Error => TYPE_ERROR,
                    _ => {
                        self.diagnostics.report(self.source_id, DiagnosticKind::NotIndexable, idx.syntax().text_range()).emit();
                        TYPE_ERROR
                    }
                }
            }
            Expr::Call(call) => self.check_call(call),
            Expr::MethodCall(call) => self.check_method_call(call),
            Expr::Binary(bin) => self.check_binary(bin),
            Expr::Unary(un) => self.check_unary(un),
            Expr::Cast(cast) => {
                if let Some(inner) = cast.expr() {
                    self.check_expr(&inner);
                }
                let names = Names { structs: &self.out.struct_fields, enums: &self.out.enum_variants };
                cast.ty().map(|t| lower_type_ref(&t, &mut self.out.ctx, names)).unwrap_or(TYPE_ERROR)
            }
            Expr::Struct(s) => {
                for field in s.fields() {
                    if let Some(value) = field.value() {
                        self.check_expr(&value);
                    }
                }
                let Some(name) = s.name() else { return TYPE_ERROR };
                let names = Names { structs: &self.out.struct_fields, enums: &self.out.enum_variants };
                named_type(Some(&name), &mut self.out.ctx, names)
            }
            Expr::Array(arr) => {
                let mut element = None;
                for e in arr.elements() {
                    let ty = self.check_expr(&e);
                    element = Some(match element {
                        None => ty,
                        Some(prev) => self.expect(e.syntax().text_range(), prev, ty),
                    });
                }
                let element = element.unwrap_or(TYPE_VOID);
                self.out.ctx.intern(Type::Slice(element))
            }
            Expr::Range(r) => {
                for bound in r.bounds() {
                    self.check_expr(&bound);
                }
                self.out.ctx.intern(Type::Struct { def: name_symbol("range"), args: Vec::new() })
            }
            Expr::Await(a) => a.expr().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR),
            Expr::Receive(r) => {
                r.channel().map(|c| self.check_expr(&c));
                TYPE_ERROR
            }
            Expr::Select(s) => {
                for arm in s.arms() {
                    if let Some(channel) = arm.channel() {
                        self.check_expr(&channel);
                    }
                    if let Some(body) = arm.body() {
                        self.check_block(&body);
                    }
                }
                TYPE_VOID
            }
            Expr::GenericInst(g) => g.base().map(|b| self.check_expr(&b)).unwrap_or(TYPE_ERROR),
            Expr::Paren(p) => p.inner().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR),
            Expr::MutRef(m) => {
                let operand_ty = m.operand().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
                self.out.ctx.intern(Type::Pointer { inner: operand_ty, mutable: true })
            }
        }
    }

    fn field_type(&mut self, base_ty: TypeId, field_name: &str, range: rowan::TextRange) -> TypeId {
        let resolved = self.out.ctx.resolve(base_ty);
        if resolved == TYPE_ERROR {
            return TYPE_ERROR;
        }
        for fields in self.out.struct_fields.values() {
            if let Some((_, ty)) = fields.iter().find(|(n, _)| n == field_name) {
                return *ty;
            }
        }
        self.diagnostics.report(self.source_id, DiagnosticKind::UndefinedSymbol, range).message(format!("no field `{field_name}`")).emit();
        TYPE_ERROR
    }

    fn check_call(&mut self, call: &ast::CallExpr) -> TypeId {
        let args: Vec<Expr> = call.args().map(|a| a.args().collect()).unwrap_or_default();
        let arg_types: Vec<(TypeId, rowan::TextRange)> = args.iter().map(|a| (self.check_expr(a), a.syntax().text_range())).collect();

        let Some(callee) = call.callee() else { return TYPE_ERROR };
        let Expr::Ident(ident) = &callee else {
            self.check_expr(&callee);
            return TYPE_ERROR;
        };
        let Some(name) = ident.name() else { return TYPE_ERROR };
        let Some(sig) = self.functions.get(&name).cloned() else {
            self.diagnostics.report(self.source_id, DiagnosticKind::UndefinedSymbol, ident.syntax().text_range()).message(format!("undefined symbol `{name}`")).emit();
            return TYPE_ERROR;
        };
        if sig.params.len() != arg_types.len() {
            self.diagnostics.report(self.source_id, DiagnosticKind::WrongArity, call.syntax().text_range()).message(format!("`{name}` expects {} argument(s), found {}", sig.params.len(), arg_types.len())).emit();
            return sig.ret;
        }
        for ((_, expected, _), (got, range)) in sig.params.iter().zip(arg_types) {
            self.expect(range, *expected, got);
        }
        sig.ret
    }

    fn check_method_call(&mut self, call: &ast::MethodCallExpr) -> TypeId {
        let receiver_ty = call.receiver().map(|r| self.check_expr(&r)).unwrap_or(TYPE_ERROR);
        let args: Vec<Expr> = call.args().map(|a| a.args().collect()).unwrap_or_default();
        let arg_types: Vec<(TypeId, rowan::TextRange)> = args.iter().map(|a| (self.check_expr(a), a.syntax().text_range())).collect();
        let Some(method_name) = call.method() else { return TYPE_ERROR };

        let type_names: Vec<String> = self.out.struct_fields.keys().cloned().collect();
        let receiver_type_name = type_names.into_iter().find(|name| {
            let names = Names { structs: &self.out.struct_fields, enums: &self.out.enum_variants };
            let candidate = named_type(Some(name.as_str()), &mut self.out.ctx, names);
            self.out.ctx.resolve(candidate) == self.out.ctx.resolve(receiver_ty)
        });

        let Some(type_name) = receiver_type_name else {
            return TYPE_ERROR;
        };
        let Some(sig) = self.out.methods.get(&(type_name, method_name.clone())).cloned() else {
            self.diagnostics.report(self.source_id, DiagnosticKind::UndefinedSymbol, call.syntax().text_range()).message(format!("no method `{method_name}`")).emit();
            return TYPE_ERROR;
        };
        if sig.params.len() != arg_types.len() {
            self.diagnostics.report(self.source_id, DiagnosticKind::WrongArity, call.syntax().text_range()).emit();
            return sig.ret;
        }
        for ((_, expected, _), (got, range)) in sig.params.iter().zip(arg_types) {
            self.expect(range, *expected, got);
        }
        sig.ret
    }

    fn check_binary(&mut self, bin: &ast::BinaryExpr) -> TypeId {
        let lhs_ty = bin.lhs().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
        let rhs_ty = bin.rhs().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
        let range = bin.syntax().text_range();
        use crate::parser::cst::SyntaxKind::*;
        match bin.op() {
            Some(EqEq | Ne | Lt | Le | Gt | Ge) => {
                self.expect(range, lhs_ty, rhs_ty);
                TYPE_BOOL
            }
            Some(AmpAmp | PipePipe) => {
                self.expect(range, TYPE_BOOL, lhs_ty);
                self.expect(range, TYPE_BOOL, rhs_ty);
                TYPE_BOOL
            }
            Some(Plus | Minus | Star | Slash | Percent | Amp | Pipe | Caret | Shl | Shr) => self.expect(range, lhs_ty, rhs_ty),
            _ => TYPE_ERROR,
        }
    }

    fn check_unary(&mut self, un: &ast::UnaryExpr) -> TypeId {
        let operand_ty = un.operand().map(|e| self.check_expr(&e)).unwrap_or(TYPE_ERROR);
        use crate::parser::cst::SyntaxKind::*;
        match un.op() {
            Some(Bang) => self.expect(un.syntax().text_range(), TYPE_BOOL, operand_ty),
            Some(Minus) => operand_ty,
            Some(Star) => match self.out.ctx.get(self.out.ctx.resolve(operand_ty)).clone() {
                Type::Pointer { inner, .. } => inner,
                Type::Error => TYPE_ERROR,
                _ => {
                    self.diagnostics.report(self.source_id, DiagnosticKind::NotIndexable, un.syntax().text_range()).message("cannot dereference a non-pointer type").emit();
                    TYPE_ERROR
                }
            },
            Some(Amp) => self.out.ctx.intern(Type::Pointer { inner: operand_ty, mutable: false }),
            _ => TYPE_ERROR,
        }
    }
}

fn literal_type(lit: &ast::LiteralExpr) -> TypeId {
    use crate::parser::cst::SyntaxKind::*;
    match lit.token().map(|t| t.kind()) {
        Some(IntLiteral) => TYPE_I32,
        Some(FloatLiteral) => crate::analyze::types::TYPE_F64,
        Some(StringLiteral) => TYPE_STRING,
        Some(CharLiteral) => crate::analyze::types::TYPE_CHAR,
        Some(KwTrue | KwFalse) => TYPE_BOOL,
        Some(KwNull) => TYPE_ERROR,
        _ => TYPE_ERROR,
    }
}
