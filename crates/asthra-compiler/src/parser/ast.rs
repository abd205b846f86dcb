//! Typed AST: thin, cheaply-cloned wrappers over `SyntaxNode`/`SyntaxToken`
//! that give each grammar production a named shape (fields, not positional
//! children) without duplicating the underlying tree. Every wrapper can be
//! recovered losslessly back to its `SyntaxNode` via `AstNode::syntax`.

use super::cst::{SyntaxKind, SyntaxNode, SyntaxToken};

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(syntax: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

fn child<N: AstNode>(syntax: &SyntaxNode) -> Option<N> {
    syntax.children().find_map(N::cast)
}

fn children<N: AstNode>(syntax: &SyntaxNode) -> impl Iterator<Item = N> {
    syntax.children().filter_map(N::cast)
}

fn token(syntax: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    syntax.children_with_tokens().filter_map(|e| e.into_token()).find(|t| t.kind() == kind)
}

fn ident_name(syntax: &SyntaxNode) -> Option<String> {
    token(syntax, SyntaxKind::Ident).map(|t| t.text().to_string())
}

macro_rules! ast_node {
    ($(#[$attr:meta])* $name:ident, $kind:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                Self::can_cast(syntax.kind()).then(|| Self(syntax))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(
    /// The root of a parsed file: optional `PackageDecl`, then a sequence
    /// of imports and items.
    SourceFile,
    SourceFile
);

impl SourceFile {
    pub fn package(&self) -> Option<PackageDecl> {
        child(&self.0)
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportDecl> {
        children(&self.0)
    }

    pub fn functions(&self) -> impl Iterator<Item = FunctionDecl> {
        children(&self.0)
    }

    pub fn externs(&self) -> impl Iterator<Item = ExternDecl> {
        children(&self.0)
    }

    pub fn structs(&self) -> impl Iterator<Item = StructDecl> {
        children(&self.0)
    }

    pub fn enums(&self) -> impl Iterator<Item = EnumDecl> {
        children(&self.0)
    }

    pub fn impls(&self) -> impl Iterator<Item = ImplBlock> {
        children(&self.0)
    }

    pub fn consts(&self) -> impl Iterator<Item = ConstDecl> {
        children(&self.0)
    }
}

ast_node!(PackageDecl, PackageDecl);

impl PackageDecl {
    /// Full dotted path, e.g. `foo.bar.baz`.
    pub fn path(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident || t.kind() == SyntaxKind::Dot)
            .map(|t| t.text().to_string())
            .collect()
    }
}

ast_node!(ImportDecl, ImportDecl);

impl ImportDecl {
    /// Raw dotted/slashed import path text, including any `stdlib/`,
    /// `internal/` prefix.
    pub fn path_text(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !t.kind().is_trivia() && t.kind() != SyntaxKind::KwImport && t.kind() != SyntaxKind::Semicolon)
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Import alias, if `as NAME` was written. Accepted syntactically; not
    /// honored by name resolution.
    pub fn alias(&self) -> Option<String> {
        let mut saw_as = false;
        for t in self.0.children_with_tokens().filter_map(|e| e.into_token()) {
            if saw_as && t.kind() == SyntaxKind::Ident {
                return Some(t.text().to_string());
            }
            if t.kind() == SyntaxKind::KwAs {
                saw_as = true;
            }
        }
        None
    }
}

fn is_pub(syntax: &SyntaxNode) -> bool {
    token(syntax, SyntaxKind::KwPub).is_some()
}

ast_node!(FunctionDecl, FunctionDecl);

impl FunctionDecl {
    pub fn is_pub(&self) -> bool {
        is_pub(&self.0)
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn params(&self) -> Option<ParamList> {
        child(&self.0)
    }

    pub fn return_type(&self) -> Option<TypeRef> {
        child(&self.0)
    }

    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }

    pub fn annotations(&self) -> impl Iterator<Item = Annotation> {
        children(&self.0)
    }
}

ast_node!(ExternDecl, ExternDecl);

impl ExternDecl {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn params(&self) -> Option<ParamList> {
        child(&self.0)
    }

    pub fn return_type(&self) -> Option<TypeRef> {
        child(&self.0)
    }

    pub fn annotations(&self) -> impl Iterator<Item = Annotation> {
        children(&self.0)
    }
}

ast_node!(ParamList, ParamList);

impl ParamList {
    /// `None` when the list was the explicit `(none)` marker.
    pub fn params(&self) -> impl Iterator<Item = Param> {
        children(&self.0)
    }

    pub fn is_explicit_none(&self) -> bool {
        token(&self.0, SyntaxKind::KwNone).is_some()
    }
}

ast_node!(Param, Param);

impl Param {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn is_mut(&self) -> bool {
        token(&self.0, SyntaxKind::KwMut).is_some()
    }

    pub fn ty(&self) -> Option<TypeRef> {
        child(&self.0)
    }
}

ast_node!(StructDecl, StructDecl);

impl StructDecl {
    pub fn is_pub(&self) -> bool {
        is_pub(&self.0)
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn fields(&self) -> impl Iterator<Item = StructField> {
        children(&self.0)
    }

    pub fn is_explicit_empty(&self) -> bool {
        token(&self.0, SyntaxKind::KwNone).is_some()
    }
}

ast_node!(StructField, StructField);

impl StructField {
    pub fn is_pub(&self) -> bool {
        is_pub(&self.0)
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        child(&self.0)
    }
}

ast_node!(EnumDecl, EnumDecl);

impl EnumDecl {
    pub fn is_pub(&self) -> bool {
        is_pub(&self.0)
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn variants(&self) -> impl Iterator<Item = EnumVariant> {
        children(&self.0)
    }
}

ast_node!(EnumVariant, EnumVariant);

impl EnumVariant {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn is_void_payload(&self) -> bool {
        token(&self.0, SyntaxKind::KwVoid).is_some()
    }

    pub fn payload_types(&self) -> impl Iterator<Item = TypeRef> {
        children(&self.0)
    }
}

ast_node!(ImplBlock, ImplBlock);

impl ImplBlock {
    pub fn target_type(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn methods(&self) -> impl Iterator<Item = FunctionDecl> {
        children(&self.0)
    }
}

ast_node!(ConstDecl, ConstDecl);

impl ConstDecl {
    pub fn is_pub(&self) -> bool {
        is_pub(&self.0)
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        child(&self.0)
    }

    pub fn value(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(Annotation, Annotation);

impl Annotation {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn is_void_args(&self) -> bool {
        token(&self.0, SyntaxKind::KwVoid).is_some()
    }

    pub fn args(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }
}

ast_node!(Block, Block);

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = Stmt> {
        self.0.children().filter_map(Stmt::cast)
    }
}

ast_node!(LetStmt, LetStmt);

impl LetStmt {
    pub fn is_mut(&self) -> bool {
        token(&self.0, SyntaxKind::KwMut).is_some()
    }

    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        child(&self.0)
    }

    pub fn init(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(AssignStmt, AssignStmt);

impl AssignStmt {
    pub fn exprs(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }

    pub fn target(&self) -> Option<Expr> {
        self.exprs().next()
    }

    pub fn value(&self) -> Option<Expr> {
        self.exprs().nth(1)
    }

    /// The assignment operator token: `Eq` for plain `=`, or one of the
    /// compound forms (`PlusEq`, `MinusEq`, ...).
    pub fn op(&self) -> Option<SyntaxKind> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::Eq
                        | SyntaxKind::PlusEq
                        | SyntaxKind::MinusEq
                        | SyntaxKind::StarEq
                        | SyntaxKind::SlashEq
                        | SyntaxKind::PercentEq
                        | SyntaxKind::AmpEq
                        | SyntaxKind::PipeEq
                        | SyntaxKind::CaretEq
                        | SyntaxKind::ShlEq
                        | SyntaxKind::ShrEq
                )
            })
            .map(|t| t.kind())
    }
}

ast_node!(ReturnStmt, ReturnStmt);

impl ReturnStmt {
    pub fn value(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(IfStmt, IfStmt);

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn then_branch(&self) -> Option<Block> {
        child(&self.0)
    }

    pub fn else_branch(&self) -> Option<ElseBranch> {
        child(&self.0)
    }
}

ast_node!(ElseBranch, ElseBranch);

impl ElseBranch {
    pub fn block(&self) -> Option<Block> {
        child(&self.0)
    }

    pub fn else_if(&self) -> Option<IfStmt> {
        child(&self.0)
    }
}

ast_node!(MatchStmt, MatchStmt);

impl MatchStmt {
    pub fn scrutinee(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn arms(&self) -> impl Iterator<Item = MatchArm> {
        children(&self.0)
    }
}

ast_node!(MatchArm, MatchArm);

impl MatchArm {
    pub fn pattern(&self) -> Option<Pattern> {
        child(&self.0)
    }

    /// Set when the arm body is a single expression (`pat => expr`).
    pub fn body_expr(&self) -> Option<Expr> {
        child(&self.0)
    }

    /// Set when the arm body is a block (`pat => { ... }`).
    pub fn body_block(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(ForStmt, ForStmt);

impl ForStmt {
    pub fn binding(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn iterable(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(WhileStmt, WhileStmt);

impl WhileStmt {
    pub fn condition(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(BreakStmt, BreakStmt);
ast_node!(ContinueStmt, ContinueStmt);

ast_node!(UnsafeStmt, UnsafeStmt);

impl UnsafeStmt {
    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(SpawnStmt, SpawnStmt);

impl SpawnStmt {
    pub fn has_handle(&self) -> bool {
        token(&self.0, SyntaxKind::KwSpawnWithHandle).is_some()
    }

    pub fn call(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(ExprStmt, ExprStmt);

impl ExprStmt {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0)
    }
}

/// A statement, dispatched to its concrete node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    Let(LetStmt),
    Assign(AssignStmt),
    Return(ReturnStmt),
    If(IfStmt),
    Match(MatchStmt),
    For(ForStmt),
    While(WhileStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Unsafe(UnsafeStmt),
    Spawn(SpawnStmt),
    Expr(ExprStmt),
}

impl AstNode for Stmt {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::LetStmt
                | SyntaxKind::AssignStmt
                | SyntaxKind::ReturnStmt
                | SyntaxKind::IfStmt
                | SyntaxKind::MatchStmt
                | SyntaxKind::ForStmt
                | SyntaxKind::WhileStmt
                | SyntaxKind::BreakStmt
                | SyntaxKind::ContinueStmt
                | SyntaxKind::UnsafeStmt
                | SyntaxKind::SpawnStmt
                | SyntaxKind::ExprStmt
        )
    }

    fn cast(syntax: SyntaxNode) -> Option<Self> {
        Some(match syntax.kind() {
            SyntaxKind::LetStmt => Stmt::Let(LetStmt(syntax)),
            SyntaxKind::AssignStmt => Stmt::Assign(AssignStmt(syntax)),
            SyntaxKind::ReturnStmt => Stmt::Return(ReturnStmt(syntax)),
            SyntaxKind::IfStmt => Stmt::If(IfStmt(syntax)),
            SyntaxKind::MatchStmt => Stmt::Match(MatchStmt(syntax)),
            SyntaxKind::ForStmt => Stmt::For(ForStmt(syntax)),
            SyntaxKind::WhileStmt => Stmt::While(WhileStmt(syntax)),
            SyntaxKind::BreakStmt => Stmt::Break(BreakStmt(syntax)),
            SyntaxKind::ContinueStmt => Stmt::Continue(ContinueStmt(syntax)),
            SyntaxKind::UnsafeStmt => Stmt::Unsafe(UnsafeStmt(syntax)),
            SyntaxKind::SpawnStmt => Stmt::Spawn(SpawnStmt(syntax)),
            SyntaxKind::ExprStmt => Stmt::Expr(ExprStmt(syntax)),
            _ => return None,
        })
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Stmt::Let(n) => n.syntax(),
            Stmt::Assign(n) => n.syntax(),
            Stmt::Return(n) => n.syntax(),
            Stmt::If(n) => n.syntax(),
            Stmt::Match(n) => n.syntax(),
            Stmt::For(n) => n.syntax(),
            Stmt::While(n) => n.syntax(),
            Stmt::Break(n) => n.syntax(),
            Stmt::Continue(n) => n.syntax(),
            Stmt::Unsafe(n) => n.syntax(),
            Stmt::Spawn(n) => n.syntax(),
            Stmt::Expr(n) => n.syntax(),
        }
    }
}

ast_node!(LiteralExpr, LiteralExpr);

impl LiteralExpr {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0.children_with_tokens().filter_map(|e| e.into_token()).find(|t| !t.kind().is_trivia())
    }
}

ast_node!(IdentExpr, IdentExpr);

impl IdentExpr {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }
}

ast_node!(PathExpr, PathExpr);

impl PathExpr {
    pub fn segments(&self) -> impl Iterator<Item = String> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
    }
}

ast_node!(FieldAccessExpr, FieldAccessExpr);

impl FieldAccessExpr {
    pub fn base(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn field(&self) -> Option<String> {
        ident_name(&self.0)
    }
}

ast_node!(IndexExpr, IndexExpr);

impl IndexExpr {
    pub fn exprs(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }

    pub fn base(&self) -> Option<Expr> {
        self.exprs().next()
    }

    pub fn index(&self) -> Option<Expr> {
        self.exprs().nth(1)
    }
}

ast_node!(ArgList, ArgList);

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }
}

ast_node!(CallExpr, CallExpr);

impl CallExpr {
    pub fn callee(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn args(&self) -> Option<ArgList> {
        child(&self.0)
    }
}

ast_node!(MethodCallExpr, MethodCallExpr);

impl MethodCallExpr {
    pub fn receiver(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn method(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn args(&self) -> Option<ArgList> {
        child(&self.0)
    }
}

ast_node!(BinaryExpr, BinaryExpr);

impl BinaryExpr {
    pub fn operands(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }

    pub fn lhs(&self) -> Option<Expr> {
        self.operands().next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        self.operands().nth(1)
    }

    /// The operator token (e.g. `Plus`, `EqEq`, `AmpAmp`).
    pub fn op(&self) -> Option<SyntaxKind> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia() && t.kind() != SyntaxKind::LParen && t.kind() != SyntaxKind::RParen)
            .map(|t| t.kind())
    }
}

ast_node!(UnaryExpr, UnaryExpr);

impl UnaryExpr {
    pub fn operand(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn op(&self) -> Option<SyntaxKind> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| !t.kind().is_trivia())
            .map(|t| t.kind())
    }
}

ast_node!(MutRefExpr, MutRefExpr);

impl MutRefExpr {
    pub fn operand(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(CastExpr, CastExpr);

impl CastExpr {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn ty(&self) -> Option<TypeRef> {
        child(&self.0)
    }
}

ast_node!(StructExpr, StructExpr);

impl StructExpr {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn fields(&self) -> impl Iterator<Item = StructExprField> {
        children(&self.0)
    }

    pub fn is_explicit_empty(&self) -> bool {
        token(&self.0, SyntaxKind::KwNone).is_some()
    }
}

ast_node!(StructExprField, StructExprField);

impl StructExprField {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn value(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(ArrayExpr, ArrayExpr);

impl ArrayExpr {
    pub fn elements(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }

    pub fn is_explicit_empty(&self) -> bool {
        token(&self.0, SyntaxKind::KwVoid).is_some()
    }
}

ast_node!(RangeExpr, RangeExpr);

impl RangeExpr {
    pub fn is_inclusive(&self) -> bool {
        token(&self.0, SyntaxKind::DotDotEq).is_some()
    }

    pub fn bounds(&self) -> impl Iterator<Item = Expr> {
        children(&self.0)
    }

    pub fn start(&self) -> Option<Expr> {
        self.bounds().next()
    }

    pub fn end(&self) -> Option<Expr> {
        self.bounds().nth(1)
    }
}

ast_node!(AwaitExpr, AwaitExpr);

impl AwaitExpr {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(ReceiveExpr, ReceiveExpr);

impl ReceiveExpr {
    pub fn channel(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(SelectExpr, SelectExpr);

impl SelectExpr {
    pub fn arms(&self) -> impl Iterator<Item = SelectArm> {
        children(&self.0)
    }
}

ast_node!(SelectArm, SelectArm);

impl SelectArm {
    pub fn channel(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(TypeArgList, TypeArgList);

impl TypeArgList {
    pub fn args(&self) -> impl Iterator<Item = TypeRef> {
        children(&self.0)
    }
}

ast_node!(GenericInstExpr, GenericInstExpr);

impl GenericInstExpr {
    pub fn base(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn type_args(&self) -> Option<TypeArgList> {
        child(&self.0)
    }
}

ast_node!(ParenExpr, ParenExpr);

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        child(&self.0)
    }
}

/// An expression, dispatched to its concrete node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(LiteralExpr),
    Ident(IdentExpr),
    Path(PathExpr),
    FieldAccess(FieldAccessExpr),
    Index(IndexExpr),
    Call(CallExpr),
    MethodCall(MethodCallExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    MutRef(MutRefExpr),
    Cast(CastExpr),
    Struct(StructExpr),
    Array(ArrayExpr),
    Range(RangeExpr),
    Await(AwaitExpr),
    Receive(ReceiveExpr),
    Select(SelectExpr),
    GenericInst(GenericInstExpr),
    Paren(ParenExpr),
}

impl AstNode for Expr {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::LiteralExpr
                | SyntaxKind::IdentExpr
                | SyntaxKind::PathExpr
                | SyntaxKind::FieldAccessExpr
                | SyntaxKind::IndexExpr
                | SyntaxKind::CallExpr
                | SyntaxKind::MethodCallExpr
                | SyntaxKind::BinaryExpr
                | SyntaxKind::UnaryExpr
                | SyntaxKind::MutRefExpr
                | SyntaxKind::CastExpr
                | SyntaxKind::StructExpr
                | SyntaxKind::ArrayExpr
                | SyntaxKind::RangeExpr
                | SyntaxKind::AwaitExpr
                | SyntaxKind::ReceiveExpr
                | SyntaxKind::SelectExpr
                | SyntaxKind::GenericInstExpr
                | SyntaxKind::ParenExpr
        )
    }

    fn cast(syntax: SyntaxNode) -> Option<Self> {
        Some(match syntax.kind() {
            SyntaxKind::LiteralExpr => Expr::Literal(LiteralExpr(syntax)),
            SyntaxKind::IdentExpr => Expr::Ident(IdentExpr(syntax)),
            SyntaxKind::PathExpr => Expr::Path(PathExpr(syntax)),
            SyntaxKind::FieldAccessExpr => Expr::FieldAccess(FieldAccessExpr(syntax)),
            SyntaxKind::IndexExpr => Expr::Index(IndexExpr(syntax)),
            SyntaxKind::CallExpr => Expr::Call(CallExpr(syntax)),
            SyntaxKind::MethodCallExpr => Expr::MethodCall(MethodCallExpr(syntax)),
            SyntaxKind::BinaryExpr => Expr::Binary(BinaryExpr(syntax)),
            SyntaxKind::UnaryExpr => Expr::Unary(UnaryExpr(syntax)),
            SyntaxKind::MutRefExpr => Expr::MutRef(MutRefExpr(syntax)),
            SyntaxKind::CastExpr => Expr::Cast(CastExpr(syntax)),
            SyntaxKind::StructExpr => Expr::Struct(StructExpr(syntax)),
            SyntaxKind::ArrayExpr => Expr::Array(ArrayExpr(syntax)),
            SyntaxKind::RangeExpr => Expr::Range(RangeExpr(syntax)),
            SyntaxKind::AwaitExpr => Expr::Await(AwaitExpr(syntax)),
            SyntaxKind::ReceiveExpr => Expr::Receive(ReceiveExpr(syntax)),
            SyntaxKind::SelectExpr => Expr::Select(SelectExpr(syntax)),
            SyntaxKind::GenericInstExpr => Expr::GenericInst(GenericInstExpr(syntax)),
            SyntaxKind::ParenExpr => Expr::Paren(ParenExpr(syntax)),
            _ => return None,
        })
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => n.syntax(),
            Expr::Ident(n) => n.syntax(),
            Expr::Path(n) => n.syntax(),
            Expr::FieldAccess(n) => n.syntax(),
            Expr::Index(n) => n.syntax(),
            Expr::Call(n) => n.syntax(),
            Expr::MethodCall(n) => n.syntax(),
            Expr::Binary(n) => n.syntax(),
            Expr::Unary(n) => n.syntax(),
            Expr::MutRef(n) => n.syntax(),
            Expr::Cast(n) => n.syntax(),
            Expr::Struct(n) => n.syntax(),
            Expr::Array(n) => n.syntax(),
            Expr::Range(n) => n.syntax(),
            Expr::Await(n) => n.syntax(),
            Expr::Receive(n) => n.syntax(),
            Expr::Select(n) => n.syntax(),
            Expr::GenericInst(n) => n.syntax(),
            Expr::Paren(n) => n.syntax(),
        }
    }
}

ast_node!(WildcardPat, WildcardPat);
ast_node!(IdentPat, IdentPat);

impl IdentPat {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }
}

ast_node!(LiteralPat, LiteralPat);

impl LiteralPat {
    pub fn token(&self) -> Option<SyntaxToken> {
        self.0.children_with_tokens().filter_map(|e| e.into_token()).find(|t| !t.kind().is_trivia())
    }
}

ast_node!(StructPat, StructPat);

impl StructPat {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn fields(&self) -> impl Iterator<Item = StructPatField> {
        children(&self.0)
    }
}

ast_node!(StructPatField, StructPatField);

impl StructPatField {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn pattern(&self) -> Option<Pattern> {
        child(&self.0)
    }
}

ast_node!(EnumVariantPat, EnumVariantPat);

impl EnumVariantPat {
    pub fn enum_name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn variant_name(&self) -> Option<String> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .nth(1)
            .map(|t| t.text().to_string())
    }

    pub fn is_void_payload(&self) -> bool {
        token(&self.0, SyntaxKind::KwVoid).is_some()
    }

    pub fn bindings(&self) -> impl Iterator<Item = Pattern> {
        children(&self.0)
    }
}

ast_node!(TuplePat, TuplePat);

impl TuplePat {
    pub fn elements(&self) -> impl Iterator<Item = Pattern> {
        children(&self.0)
    }
}

/// A match/destructuring pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Wildcard(WildcardPat),
    Ident(IdentPat),
    Literal(LiteralPat),
    Struct(StructPat),
    EnumVariant(EnumVariantPat),
    Tuple(TuplePat),
}

impl AstNode for Pattern {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::WildcardPat
                | SyntaxKind::IdentPat
                | SyntaxKind::LiteralPat
                | SyntaxKind::StructPat
                | SyntaxKind::EnumVariantPat
                | SyntaxKind::TuplePat
        )
    }

    fn cast(syntax: SyntaxNode) -> Option<Self> {
        Some(match syntax.kind() {
            SyntaxKind::WildcardPat => Pattern::Wildcard(WildcardPat(syntax)),
            SyntaxKind::IdentPat => Pattern::Ident(IdentPat(syntax)),
            SyntaxKind::LiteralPat => Pattern::Literal(LiteralPat(syntax)),
            SyntaxKind::StructPat => Pattern::Struct(StructPat(syntax)),
            SyntaxKind::EnumVariantPat => Pattern::EnumVariant(EnumVariantPat(syntax)),
            SyntaxKind::TuplePat => Pattern::Tuple(TuplePat(syntax)),
            _ => return None,
        })
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Pattern::Wildcard(n) => n.syntax(),
            Pattern::Ident(n) => n.syntax(),
            Pattern::Literal(n) => n.syntax(),
            Pattern::Struct(n) => n.syntax(),
            Pattern::EnumVariant(n) => n.syntax(),
            Pattern::Tuple(n) => n.syntax(),
        }
    }
}

ast_node!(NamedType, NamedType);

impl NamedType {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }
}

ast_node!(GenericType, GenericType);

impl GenericType {
    pub fn name(&self) -> Option<String> {
        ident_name(&self.0)
    }

    pub fn args(&self) -> Option<TypeArgList> {
        child(&self.0)
    }
}

ast_node!(PointerType, PointerType);

impl PointerType {
    pub fn is_mut(&self) -> bool {
        token(&self.0, SyntaxKind::KwMut).is_some()
    }

    pub fn pointee(&self) -> Option<TypeRef> {
        child(&self.0)
    }
}

ast_node!(SliceType, SliceType);

impl SliceType {
    pub fn element(&self) -> Option<TypeRef> {
        child(&self.0)
    }
}

ast_node!(ArrayType, ArrayType);

impl ArrayType {
    pub fn element(&self) -> Option<TypeRef> {
        child(&self.0)
    }

    pub fn size(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(FunctionType, FunctionType);

impl FunctionType {
    /// All but the last `TypeRef` child (the last is the return type).
    pub fn params(&self) -> Vec<TypeRef> {
        let mut all: Vec<TypeRef> = children(&self.0).collect();
        all.pop();
        all
    }

    pub fn return_type(&self) -> Option<TypeRef> {
        children::<TypeRef>(&self.0).last()
    }
}

ast_node!(TupleType, TupleType);

impl TupleType {
    pub fn elements(&self) -> impl Iterator<Item = TypeRef> {
        children(&self.0)
    }
}

ast_node!(NeverType, NeverType);
ast_node!(VoidType, VoidType);

/// A type reference, dispatched to its concrete node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(NamedType),
    Generic(GenericType),
    Pointer(PointerType),
    Slice(SliceType),
    Array(ArrayType),
    Function(FunctionType),
    Tuple(TupleType),
    Never(NeverType),
    Void(VoidType),
}

impl AstNode for TypeRef {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::NamedType
                | SyntaxKind::GenericType
                | SyntaxKind::PointerType
                | SyntaxKind::SliceType
                | SyntaxKind::ArrayType
                | SyntaxKind::FunctionType
                | SyntaxKind::TupleType
                | SyntaxKind::NeverType
                | SyntaxKind::VoidType
        )
    }

    fn cast(syntax: SyntaxNode) -> Option<Self> {
        Some(match syntax.kind() {
            SyntaxKind::NamedType => TypeRef::Named(NamedType(syntax)),
            SyntaxKind::GenericType => TypeRef::Generic(GenericType(syntax)),
            SyntaxKind::PointerType => TypeRef::Pointer(PointerType(syntax)),
            SyntaxKind::SliceType => TypeRef::Slice(SliceType(syntax)),
            SyntaxKind::ArrayType => TypeRef::Array(ArrayType(syntax)),
            SyntaxKind::FunctionType => TypeRef::Function(FunctionType(syntax)),
            SyntaxKind::TupleType => TypeRef::Tuple(TupleType(syntax)),
            SyntaxKind::NeverType => TypeRef::Never(NeverType(syntax)),
            SyntaxKind::VoidType => TypeRef::Void(VoidType(syntax)),
            _ => return None,
        })
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            TypeRef::Named(n) => n.syntax(),
            TypeRef::Generic(n) => n.syntax(),
            TypeRef::Pointer(n) => n.syntax(),
            TypeRef::Slice(n) => n.syntax(),
            TypeRef::Array(n) => n.syntax(),
            TypeRef::Function(n) => n.syntax(),
            TypeRef::Tuple(n) => n.syntax(),
            TypeRef::Never(n) => n.syntax(),
            TypeRef::Void(n) => n.syntax(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::source::SourceManager;

    fn source_file(src: &str) -> SourceFile {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        let out = parse_source(id, src);
        SourceFile::cast(out.syntax()).expect("root is SourceFile")
    }

    #[test]
    fn function_decl_exposes_name_and_params() {
        let file = source_file("pub fn add(a: i32, b: i32) -> i32 { return a + b; }\n");
        let f = file.functions().next().expect("one function");
        assert_eq!(f.name().as_deref(), Some("add"));
        assert!(f.is_pub());
        let params: Vec<_> = f.params().unwrap().params().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name().as_deref(), Some("a"));
    }

    #[test]
    fn struct_decl_exposes_fields() {
        let file = source_file("pub struct Point { pub x: i32, pub y: i32 }\n");
        let s = file.structs().next().expect("one struct");
        assert_eq!(s.name().as_deref(), Some("Point"));
        assert_eq!(s.fields().count(), 2);
    }

    #[test]
    fn binary_expr_exposes_operands_and_op() {
        let file = source_file("pub fn f(none) -> i32 { return 1 + 2; }\n");
        let body = file.functions().next().unwrap().body().unwrap();
        let ret = body.statements().next().unwrap();
        let Stmt::Return(ret) = ret else { panic!("expected return") };
        let Some(Expr::Binary(bin)) = ret.value() else { panic!("expected binary expr") };
        assert_eq!(bin.op(), Some(SyntaxKind::Plus));
        assert!(bin.lhs().is_some());
        assert!(bin.rhs().is_some());
    }
}
