//! Symbol table and scope graph (spec.md §4.4).
//!
//! Two-pass construction: declaration-collection registers every
//! package-level item (and, recursively, struct fields / enum variants /
//! impl methods) into its owning scope; the resolution pass then walks
//! function bodies and checks that every call target resolves against the
//! module scope built so far (locals and parameters are resolved by the
//! typed pass instead, see `ReferenceResolver`'s doc comment).

use std::collections::HashMap;

use asthra_core::{Interner, Symbol as Name};
use rowan::TextRange;

use crate::diagnostics::suggest::suggest_similar;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::parser::ast::{AstNode, Expr, SourceFile};
use crate::source::SourceId;

use super::visitor::{self, Visitor};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Builds a `SymbolId` from a raw index outside the normal
    /// declaration-collection path — used by the type checker, which keys
    /// struct/enum identity by name rather than sharing this table's scope
    /// graph (spec.md §4.5's type representation only needs structural
    /// identity, not a real scope lookup).
    pub fn from_raw(id: u32) -> Self {
        SymbolId(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeKind {
    Module,
    Struct,
    Enum,
    Impl,
    Function,
    Block,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SymbolKind {
    Module,
    Type,
    Function,
    Local,
    Const,
    Field,
    Variant,
}

#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub name: Name,
    pub kind: SymbolKind,
    pub span: TextRange,
    pub visibility: Visibility,
    pub scope: ScopeId,
    pub is_mut: bool,
}

#[derive(Clone, Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    symbols: HashMap<Name, SymbolId>,
}

/// The full scope graph plus flat symbol registry for one compilation unit.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<SymbolInfo>,
    /// Last path segment of every `import` declaration, alias ignored
    /// (spec.md §4.3's "current frontier" — accepted, not honored).
    imports: Vec<String>,
}

impl SymbolTable {
    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id.index()]
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { parent, kind, symbols: HashMap::new() });
        id
    }

    fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0 as usize].kind
    }

    /// Declare `name` in `scope`. Returns `Err(existing)` without inserting
    /// when the category already has a same-named symbol in this exact
    /// scope (spec.md §3: "within a scope, names are unique per symbol
    /// category"); shadowing by a nested scope is not affected.
    fn declare(&mut self, scope: ScopeId, info: SymbolInfo) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.scopes[scope.0 as usize].symbols.get(&info.name) {
            if self.symbols[existing.index()].kind == info.kind {
                return Err(existing);
            }
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.scopes[scope.0 as usize].symbols.insert(info.name, id);
        self.symbols.push(info);
        Ok(id)
    }

    /// Look up `name` starting at `scope`, walking up the parent chain.
    pub fn resolve(&self, scope: ScopeId, name: Name) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(&id) = self.scopes[s.0 as usize].symbols.get(&name) {
                return Some(id);
            }
            current = self.scopes[s.0 as usize].parent;
        }
        None
    }

    /// As `resolve`, but by source text rather than an already-interned
    /// `Symbol` — used during reference checking, which only has borrowed
    /// access to the interner built during declaration-collection.
    pub fn resolve_str(&self, scope: ScopeId, name: &str, interner: &Interner) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            for (&sym, &id) in &self.scopes[s.0 as usize].symbols {
                if interner.resolve(sym) == name {
                    return Some(id);
                }
            }
            current = self.scopes[s.0 as usize].parent;
        }
        None
    }

    /// Every symbol name visible from `scope`, for similar-symbol
    /// suggestions (spec.md §4.8).
    fn visible_names<'a>(&'a self, scope: ScopeId, interner: &'a Interner) -> Vec<&'a str> {
        let mut names = Vec::new();
        let mut current = Some(scope);
        while let Some(s) = current {
            names.extend(self.scopes[s.0 as usize].symbols.keys().map(|&n| interner.resolve(n)));
            current = self.scopes[s.0 as usize].parent;
        }
        names
    }
}

/// Build the symbol table for one file and run reference resolution,
/// reporting `DuplicateSymbol`, `ForbiddenInternalImport`, and
/// `UndefinedSymbol` along the way.
pub fn build(
    source_id: SourceId,
    file: &SourceFile,
    interner: &mut Interner,
    diagnostics: &mut Diagnostics,
) -> SymbolTable {
    let mut table = SymbolTable::default();
    let module_scope = table.new_scope(None, ScopeKind::Module);
    debug_assert_eq!(module_scope, table.root_scope());

    check_imports(source_id, file, diagnostics, &mut table);
    collect_declarations(source_id, file, interner, diagnostics, &mut table, module_scope);

    let mut resolver = ReferenceResolver { source_id, interner, diagnostics, table: &table };
    resolver.visit_source_file(file);

    table
}

fn check_imports(source_id: SourceId, file: &SourceFile, diagnostics: &mut Diagnostics, table: &mut SymbolTable) {
    let package_path = file.package().map(|p| p.path()).unwrap_or_default();
    let in_stdlib_or_internal = package_path.starts_with("stdlib") || package_path.starts_with("internal");

    for import in file.imports() {
        let path = import.path_text();
        table.imports.push(path.rsplit(['/', '.']).next().unwrap_or(&path).to_string());

        if path.starts_with("internal/") && !in_stdlib_or_internal {
            let range = import.syntax().text_range();
            diagnostics.report(source_id, DiagnosticKind::ForbiddenInternalImport, range).emit();
        }
    }
}

fn visibility_of(is_pub: bool) -> Visibility {
    if is_pub { Visibility::Public } else { Visibility::Private }
}

fn declare_or_report(
    source_id: SourceId,
    diagnostics: &mut Diagnostics,
    table: &mut SymbolTable,
    scope: ScopeId,
    interner: &mut Interner,
    name: &str,
    kind: SymbolKind,
    span: TextRange,
    visibility: Visibility,
    is_mut: bool,
) -> SymbolId {
    let interned = interner.intern(name);
    let info = SymbolInfo { name: interned, kind, span, visibility, scope, is_mut };
    match table.declare(scope, info) {
        Ok(id) => id,
        Err(existing) => {
            diagnostics.report(source_id, DiagnosticKind::DuplicateSymbol, span).message(format!("`{name}` is already defined in this scope")).emit();
            existing
        }
    }
}

fn collect_declarations(
    source_id: SourceId,
    file: &SourceFile,
    interner: &mut Interner,
    diagnostics: &mut Diagnostics,
    table: &mut SymbolTable,
    module_scope: ScopeId,
) {
    for func in file.functions() {
        if let Some(name) = func.name() {
            declare_or_report(
                source_id, diagnostics, table, module_scope, interner,
                &name, SymbolKind::Function, func.syntax().text_range(), visibility_of(func.is_pub()), false,
            );
        }
    }

    for ext in file.externs() {
        if let Some(name) = ext.name() {
            declare_or_report(
                source_id, diagnostics, table, module_scope, interner,
                &name, SymbolKind::Function, ext.syntax().text_range(), Visibility::Public, false,
            );
        }
    }

    for cst in file.consts() {
        if let Some(name) = cst.name() {
            declare_or_report(
                source_id, diagnostics, table, module_scope, interner,
                &name, SymbolKind::Const, cst.syntax().text_range(), visibility_of(cst.is_pub()), false,
            );
        }
    }

    for st in file.structs() {
        let Some(name) = st.name() else { continue };
        declare_or_report(
            source_id, diagnostics, table, module_scope, interner,
            &name, SymbolKind::Type, st.syntax().text_range(), visibility_of(st.is_pub()), false,
        );
        let struct_scope = table.new_scope(Some(module_scope), ScopeKind::Struct);
        for field in st.fields() {
            let Some(fname) = field.name() else { continue };
            declare_or_report(
                source_id, diagnostics, table, struct_scope, interner,
                &fname, SymbolKind::Field, field.syntax().text_range(), visibility_of(field.is_pub()), false,
            );
        }
    }

    for en in file.enums() {
        let Some(name) = en.name() else { continue };
        declare_or_report(
            source_id, diagnostics, table, module_scope, interner,
            &name, SymbolKind::Type, en.syntax().text_range(), visibility_of(en.is_pub()), false,
        );
        let enum_scope = table.new_scope(Some(module_scope), ScopeKind::Enum);
        for variant in en.variants() {
            let Some(vname) = variant.name() else { continue };
            declare_or_report(
                source_id, diagnostics, table, enum_scope, interner,
                &vname, SymbolKind::Variant, variant.syntax().text_range(), Visibility::Public, false,
            );
        }
    }

    for imp in file.impls() {
        let impl_scope = table.new_scope(Some(module_scope), ScopeKind::Impl);
        for method in imp.methods() {
            let Some(name) = method.name() else { continue };
            declare_or_report(
                source_id, diagnostics, table, impl_scope, interner,
                &name, SymbolKind::Function, method.syntax().text_range(), visibility_of(method.is_pub()), false,
            );
        }
    }
}

/// Walks every function body, checking that each call target resolves to a
/// module-level declaration. This only checks call-callee positions, not
/// every identifier: this table only registers package-level declarations
/// (`collect_declarations` never opens per-function scopes for locals or
/// parameters), so a blanket identifier check would misreport every local
/// read/write as `UndefinedSymbol`. Local name resolution and type checking
/// of bare identifiers is the typed pass's job (`analyze::type_check`).
struct ReferenceResolver<'a> {
    source_id: SourceId,
    interner: &'a Interner,
    diagnostics: &'a mut Diagnostics,
    table: &'a SymbolTable,
}

impl Visitor for ReferenceResolver<'_> {
    fn visit_source_file(&mut self, file: &SourceFile) {
        for func in file.functions() {
            self.visit_function(&func);
        }
        for imp in file.impls() {
            for method in imp.methods() {
                self.visit_function(&method);
            }
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call(call) = expr
            && let Some(Expr::Ident(ident)) = call.callee()
            && let Some(name) = ident.name()
        {
            self.check_reference(&name, ident.syntax().text_range());
        }
        visitor::walk_expr(self, expr);
    }
}

impl ReferenceResolver<'_> {
    fn check_reference(&mut self, name: &str, range: TextRange) {
        if self.table.resolve_str(self.table.root_scope(), name, self.interner).is_some() {
            return;
        }
        let mut report = self.diagnostics.report(self.source_id, DiagnosticKind::UndefinedSymbol, range).message(format!("undefined symbol `{name}`"));
        if let Some((candidate, confidence)) = suggest_similar(name, self.table.visible_names(self.table.root_scope(), self.interner)) {
            report = report.similar_symbols(vec![candidate.to_string()]).suggest(crate::diagnostics::Suggestion {
                range,
                replacement: candidate.to_string(),
                confidence,
                rationale: "similarly named symbol is in scope".to_string(),
            });
        }
        report.emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::source::SourceManager;

    fn build_table(src: &str) -> (SymbolTable, Diagnostics) {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        let out = parse_source(id, src);
        let file = SourceFile::cast(out.syntax()).unwrap();
        let mut interner = Interner::new();
        let mut diagnostics = out.diagnostics;
        let table = build(id, &file, &mut interner, &mut diagnostics);
        (table, diagnostics)
    }

    #[test]
    fn duplicate_function_is_flagged() {
        let (_, diag) = build_table(
            "pub fn f(none) -> i32 { return 0; }\npub fn f(none) -> i32 { return 1; }\n",
        );
        assert!(diag.iter().any(|d| d.kind == DiagnosticKind::DuplicateSymbol));
    }

    #[test]
    fn undefined_call_target_is_flagged() {
        let (_, diag) = build_table("pub fn f(none) -> i32 { return g(); }\n");
        assert!(diag.iter().any(|d| d.kind == DiagnosticKind::UndefinedSymbol));
    }

    #[test]
    fn call_to_declared_function_resolves_clean() {
        let (_, diag) = build_table(
            "pub fn g(none) -> i32 { return 0; }\npub fn f(none) -> i32 { return g(); }\n",
        );
        assert!(!diag.iter().any(|d| d.kind == DiagnosticKind::UndefinedSymbol));
    }

    #[test]
    fn internal_import_outside_internal_package_is_forbidden() {
        let (table, diag) = build_table("package app;\nimport \"internal/util\";\n");
        assert!(diag.iter().any(|d| d.kind == DiagnosticKind::ForbiddenInternalImport));
        assert_eq!(table.imports(), &["util".to_string()]);
    }

    #[test]
    fn reading_and_reassigning_a_local_does_not_spuriously_flag_undefined_symbol() {
        let (_, diag) = build_table(
            "pub fn f(none) -> i32 { let mut x: i32 = 1; x = 2; return x; }\n",
        );
        assert!(!diag.iter().any(|d| d.kind == DiagnosticKind::UndefinedSymbol));
    }

    #[test]
    fn reading_a_parameter_does_not_spuriously_flag_undefined_symbol() {
        let (_, diag) = build_table("pub fn f(x: i32) -> i32 { return x; }\n");
        assert!(!diag.iter().any(|d| d.kind == DiagnosticKind::UndefinedSymbol));
    }
}
