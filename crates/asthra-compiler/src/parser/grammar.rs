//! Grammar productions: one recursive-descent function per non-terminal.
//! Kept as a single file, mirroring how much of Asthra's surface syntax is —
//! items, statements, expressions, patterns, types all lean on the same
//! handful of parser primitives (`bump`/`expect`/`checkpoint`).
//!
//! Mandatory-explicitness rules from spec.md §4.3 (visibility, `(none)`
//! parameter lists, `{ none }`/`[void]` empty composites, explicit variant
//! and annotation payloads) are enforced here: missing markers are
//! diagnosed but parsing still produces a well-formed tree, treating the
//! omission as the explicit form so later passes see a complete AST.

use super::cst::{token_sets, SyntaxKind, SyntaxKind::*};
use super::Parser;
use crate::diagnostics::DiagnosticKind;

pub(super) fn source_file(p: &mut Parser) {
    p.start_node(SourceFile);
    if p.currently_is(KwPackage) {
        package_decl(p);
    }
    while p.currently_is(KwImport) {
        import_decl(p);
    }
    while !p.should_stop() {
        item(p);
    }
    p.drain_pending_trivia();
    p.finish_node();
}

fn package_decl(p: &mut Parser) {
    p.start_node(PackageDecl);
    p.bump(); // package
    dotted_path(p);
    p.expect(Semicolon, "`;` after package declaration");
    p.finish_node();
}

fn import_decl(p: &mut Parser) {
    p.start_node(ImportDecl);
    p.bump(); // import
    import_path(p);
    if p.currently_is(KwAs) {
        p.bump();
        p.expect(Ident, "alias identifier");
    }
    p.expect(Semicolon, "`;` after import declaration");
    p.finish_node();
}

/// `stdlib/io`, `internal/runtime/gc`, `a/b/c` — slash-separated path,
/// possibly with a leading bare segment.
fn import_path(p: &mut Parser) {
    p.expect(Ident, "import path segment");
    while p.currently_is(Slash) {
        p.bump();
        p.expect(Ident, "import path segment");
    }
}

fn dotted_path(p: &mut Parser) {
    p.expect(Ident, "identifier");
    while p.currently_is(Dot) {
        p.bump();
        p.expect(Ident, "identifier");
    }
}

fn annotations(p: &mut Parser) {
    while p.currently_is(Hash) {
        p.start_node(Annotation);
        p.bump(); // #
        p.expect(LBracket, "`[` to open annotation");
        p.expect(Ident, "annotation name");
        if p.eat(LParen) {
            if p.currently_is(KwVoid) {
                p.bump();
            } else if p.currently_is(RParen) {
                p.error(DiagnosticKind::MissingAnnotationArgs);
            } else {
                expr_list(p, RParen);
            }
            p.expect(RParen, "`)` to close annotation arguments");
        } else {
            p.error(DiagnosticKind::MissingAnnotationArgs);
        }
        p.expect(RBracket, "`]` to close annotation");
        p.finish_node();
    }
}

fn visibility(p: &mut Parser) {
    if p.currently_is(KwPub) || p.currently_is(KwPriv) {
        p.bump();
    } else {
        p.error_with_fix(
            DiagnosticKind::MissingVisibility,
            "declaration is missing required visibility (`pub` or `priv`)",
            "pub ",
            "every declaration must state its visibility explicitly",
        );
    }
}

fn item(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    annotations(p);
    match p.current() {
        KwFn => function_decl(p, checkpoint),
        KwExtern => extern_decl(p, checkpoint),
        KwStruct => struct_decl(p, checkpoint),
        KwEnum => enum_decl(p, checkpoint),
        KwImpl => impl_block(p, checkpoint),
        KwConst => const_decl(p, checkpoint),
        KwPub | KwPriv => match p.nth(1) {
            KwFn => function_decl(p, checkpoint),
            KwExtern => extern_decl(p, checkpoint),
            KwStruct => struct_decl(p, checkpoint),
            KwEnum => enum_decl(p, checkpoint),
            KwConst => const_decl(p, checkpoint),
            _ => {
                p.error_and_bump(DiagnosticKind::UnexpectedToken);
                p.recover_until(token_sets::ITEM_FIRST);
            }
        },
        _ => {
            p.error_and_bump(DiagnosticKind::UnexpectedToken);
            p.recover_until(token_sets::ITEM_FIRST);
        }
    }
}

fn function_decl(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    visibility(p);
    p.start_node_at(checkpoint, FunctionDecl);
    p.bump(); // fn
    p.expect(Ident, "function name");
    param_list(p);
    if p.eat(Arrow) {
        type_ref(p);
    }
    block(p);
    p.finish_node();
}

fn extern_decl(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    visibility(p);
    p.start_node_at(checkpoint, ExternDecl);
    p.bump(); // extern
    p.expect(KwFn, "`fn` after `extern`");
    p.expect(Ident, "extern function name");
    param_list(p);
    if p.eat(Arrow) {
        type_ref(p);
    }
    p.expect(Semicolon, "`;` after extern declaration");
    p.finish_node();
}

fn param_list(p: &mut Parser) {
    p.start_node(ParamList);
    p.expect(LParen, "`(` to open parameter list");
    if p.currently_is(KwNone) {
        p.bump();
    } else if p.currently_is(RParen) {
        p.error(DiagnosticKind::MissingParameterList);
    } else {
        param(p);
        while p.eat(Comma) {
            if p.currently_is(RParen) {
                break;
            }
            param(p);
        }
    }
    p.expect(RParen, "`)` to close parameter list");
    p.finish_node();
}

fn param(p: &mut Parser) {
    p.start_node(Param);
    if p.currently_is(KwSelf) {
        p.bump();
    } else {
        if p.currently_is(KwMut) {
            p.bump();
        }
        p.expect(Ident, "parameter name");
        p.expect(Colon, "`:` before parameter type");
        type_ref(p);
    }
    p.finish_node();
}

fn struct_decl(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    visibility(p);
    p.start_node_at(checkpoint, StructDecl);
    p.bump(); // struct
    p.expect(Ident, "struct name");
    p.expect(LBrace, "`{` to open struct body");
    if p.currently_is(KwNone) {
        p.bump();
    } else if p.currently_is(RBrace) {
        p.error(DiagnosticKind::MissingStructContent);
    } else {
        struct_field(p);
        while p.eat(Comma) {
            if p.currently_is(RBrace) {
                break;
            }
            struct_field(p);
        }
    }
    p.expect(RBrace, "`}` to close struct body");
    p.finish_node();
}

fn struct_field(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    if p.currently_is(KwPub) || p.currently_is(KwPriv) {
        p.bump();
    } else {
        p.error_with_fix(
            DiagnosticKind::MissingVisibility,
            "struct field is missing required visibility (`pub` or `priv`)",
            "pub ",
            "every field must state its visibility explicitly",
        );
    }
    p.start_node_at(checkpoint, StructField);
    p.expect(Ident, "field name");
    p.expect(Colon, "`:` before field type");
    type_ref(p);
    p.finish_node();
}

fn enum_decl(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    visibility(p);
    p.start_node_at(checkpoint, EnumDecl);
    p.bump(); // enum
    p.expect(Ident, "enum name");
    p.expect(LBrace, "`{` to open enum body");
    if p.currently_is(KwNone) {
        p.bump();
    } else if p.currently_is(RBrace) {
        p.error(DiagnosticKind::MissingStructContent);
    } else {
        enum_variant(p);
        while p.eat(Comma) {
            if p.currently_is(RBrace) {
                break;
            }
            enum_variant(p);
        }
    }
    p.expect(RBrace, "`}` to close enum body");
    p.finish_node();
}

fn enum_variant(p: &mut Parser) {
    p.start_node(EnumVariant);
    p.expect(Ident, "variant name");
    if p.eat(LParen) {
        if p.currently_is(KwVoid) {
            p.bump();
        } else if p.currently_is(RParen) {
            p.error(DiagnosticKind::MissingVariantArguments);
        } else {
            type_ref(p);
            while p.eat(Comma) {
                if p.currently_is(RParen) {
                    break;
                }
                type_ref(p);
            }
        }
        p.expect(RParen, "`)` to close variant payload");
    } else {
        p.error(DiagnosticKind::MissingVariantArguments);
    }
    p.finish_node();
}

fn impl_block(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    p.start_node_at(checkpoint, ImplBlock);
    p.bump(); // impl
    p.expect(Ident, "type name");
    p.expect(LBrace, "`{` to open impl body");
    while !p.currently_is(RBrace) && !p.should_stop() {
        let inner_checkpoint = p.checkpoint();
        annotations(p);
        visibility(p);
        p.start_node_at(inner_checkpoint, FunctionDecl);
        p.expect(KwFn, "`fn`");
        p.expect(Ident, "method name");
        param_list(p);
        if p.eat(Arrow) {
            type_ref(p);
        }
        block(p);
        p.finish_node();
    }
    p.expect(RBrace, "`}` to close impl body");
    p.finish_node();
}

fn const_decl(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    visibility(p);
    p.start_node_at(checkpoint, ConstDecl);
    p.bump(); // const
    p.expect(Ident, "const name");
    p.expect(Colon, "`:` before const type");
    type_ref(p);
    p.expect(Eq, "`=` before const value");
    expr(p);
    p.expect(Semicolon, "`;` after const declaration");
    p.finish_node();
}

// ---------------------------------------------------------------- types ---

fn type_ref(p: &mut Parser) {
    match p.current() {
        Star => {
            p.start_node(PointerType);
            p.bump();
            if p.currently_is(KwMut) {
                p.bump();
            }
            type_ref(p);
            p.finish_node();
        }
        LBracket => {
            let checkpoint = p.checkpoint();
            p.bump();
            type_ref(p);
            if p.eat(Semicolon) {
                expr(p);
                p.expect(RBracket, "`]` to close array type");
                p.start_node_at(checkpoint, ArrayType);
            } else {
                p.expect(RBracket, "`]` to close slice type");
                p.start_node_at(checkpoint, SliceType);
            }
            p.finish_node();
        }
        LParen => {
            p.start_node(TupleType);
            p.bump();
            if !p.currently_is(RParen) {
                type_ref(p);
                while p.eat(Comma) {
                    if p.currently_is(RParen) {
                        break;
                    }
                    type_ref(p);
                }
            }
            p.expect(RParen, "`)` to close tuple type");
            p.finish_node();
        }
        Bang => {
            p.start_node(NeverType);
            p.bump();
            p.finish_node();
        }
        KwVoid => {
            p.start_node(VoidType);
            p.bump();
            p.finish_node();
        }
        KwFn => {
            p.start_node(FunctionType);
            p.bump();
            p.expect(LParen, "`(` in function type");
            if !p.currently_is(RParen) {
                type_ref(p);
                while p.eat(Comma) {
                    if p.currently_is(RParen) {
                        break;
                    }
                    type_ref(p);
                }
            }
            p.expect(RParen, "`)` in function type");
            p.expect(Arrow, "`->` in function type");
            type_ref(p);
            p.finish_node();
        }
        Ident => {
            let checkpoint = p.checkpoint();
            p.bump();
            if p.currently_is(Lt) {
                p.start_node(TypeArgList);
                p.bump();
                type_ref(p);
                while p.eat(Comma) {
                    if p.currently_is(Gt) {
                        break;
                    }
                    type_ref(p);
                }
                p.expect(Gt, "`>` to close type argument list");
                p.finish_node();
                p.start_node_at(checkpoint, GenericType);
                p.finish_node();
            } else {
                p.start_node_at(checkpoint, NamedType);
                p.finish_node();
            }
        }
        _ => {
            p.error_and_bump(DiagnosticKind::ExpectedToken);
        }
    }
}

// ------------------------------------------------------------ statements --

fn block(p: &mut Parser) {
    p.start_node(Block);
    p.expect(LBrace, "`{` to open block");
    while !p.currently_is(RBrace) && !p.should_stop() {
        stmt(p);
    }
    p.expect(RBrace, "`}` to close block");
    p.finish_node();
}

fn stmt(p: &mut Parser) {
    match p.current() {
        KwLet => let_stmt(p),
        KwReturn => return_stmt(p),
        KwIf => if_stmt(p),
        KwMatch => match_stmt(p),
        KwFor => for_stmt(p),
        KwWhile => while_stmt(p),
        KwBreak => {
            p.start_node(BreakStmt);
            p.bump();
            p.expect(Semicolon, "`;` after `break`");
            p.finish_node();
        }
        KwContinue => {
            p.start_node(ContinueStmt);
            p.bump();
            p.expect(Semicolon, "`;` after `continue`");
            p.finish_node();
        }
        KwUnsafe => {
            p.start_node(UnsafeStmt);
            p.bump();
            block(p);
            p.finish_node();
        }
        KwSpawn | KwSpawnWithHandle => {
            p.start_node(SpawnStmt);
            p.bump();
            expr(p);
            p.expect(Semicolon, "`;` after spawn statement");
            p.finish_node();
        }
        _ => expr_or_assign_stmt(p),
    }
}

fn let_stmt(p: &mut Parser) {
    p.start_node(LetStmt);
    p.bump(); // let
    if p.currently_is(KwMut) {
        p.bump();
    }
    p.expect(Ident, "binding name");
    if p.eat(Colon) {
        type_ref(p);
    }
    p.expect(Eq, "`=` in let binding");
    expr(p);
    p.expect(Semicolon, "`;` after let statement");
    p.finish_node();
}

fn return_stmt(p: &mut Parser) {
    p.start_node(ReturnStmt);
    p.bump(); // return
    if !p.currently_is(Semicolon) {
        expr(p);
    }
    p.expect(Semicolon, "`;` after return statement");
    p.finish_node();
}

fn if_stmt(p: &mut Parser) {
    p.start_node(IfStmt);
    p.bump(); // if
    expr_no_struct_literal(p);
    block(p);
    if p.currently_is(KwElse) {
        p.start_node(ElseBranch);
        p.bump();
        if p.currently_is(KwIf) {
            if_stmt(p);
        } else {
            block(p);
        }
        p.finish_node();
    }
    p.finish_node();
}

fn match_stmt(p: &mut Parser) {
    p.start_node(MatchStmt);
    p.bump(); // match
    expr_no_struct_literal(p);
    p.expect(LBrace, "`{` to open match body");
    while !p.currently_is(RBrace) && !p.should_stop() {
        match_arm(p);
    }
    p.expect(RBrace, "`}` to close match body");
    p.finish_node();
}

fn match_arm(p: &mut Parser) {
    p.start_node(MatchArm);
    pattern(p);
    p.expect(FatArrow, "`=>` in match arm");
    if p.currently_is(LBrace) {
        block(p);
    } else {
        expr(p);
    }
    p.eat(Comma);
    p.finish_node();
}

fn for_stmt(p: &mut Parser) {
    p.start_node(ForStmt);
    p.bump(); // for
    p.expect(Ident, "loop binding name");
    p.expect(KwIn, "`in` in for statement");
    expr_no_struct_literal(p);
    block(p);
    p.finish_node();
}

fn while_stmt(p: &mut Parser) {
    p.start_node(WhileStmt);
    p.bump(); // while
    expr_no_struct_literal(p);
    block(p);
    p.finish_node();
}

fn expr_or_assign_stmt(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    expr(p);
    if matches!(
        p.current(),
        Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | AmpEq | PipeEq | CaretEq | ShlEq | ShrEq
    ) {
        p.start_node_at(checkpoint, AssignStmt);
        p.bump(); // operator
        expr(p);
        p.expect(Semicolon, "`;` after assignment");
        p.finish_node();
    } else {
        p.start_node_at(checkpoint, ExprStmt);
        p.expect(Semicolon, "`;` after expression statement");
        p.finish_node();
    }
}

// ----------------------------------------------------------- expressions --

fn expr(p: &mut Parser) {
    if !p.enter_recursion() {
        p.error_and_bump_with_hint(DiagnosticKind::UnexpectedToken, "expression nested too deeply");
        return;
    }
    binary_expr(p, 1);
    p.exit_recursion();
}

fn expr_no_struct_literal(p: &mut Parser) {
    let saved = p.allow_struct_literal;
    p.allow_struct_literal = false;
    binary_expr(p, 1);
    p.allow_struct_literal = saved;
}

fn binop_binding(kind: SyntaxKind) -> Option<u8> {
    Some(match kind {
        DotDot | DotDotEq => 1,
        PipePipe => 2,
        AmpAmp => 3,
        EqEq | Ne | Lt | Le | Gt | Ge => 4,
        Pipe => 5,
        Caret => 6,
        Amp => 7,
        Shl | Shr => 8,
        Plus | Minus => 9,
        Star | Slash | Percent => 10,
        _ => return None,
    })
}

fn binary_expr(p: &mut Parser, min_bp: u8) {
    let checkpoint = p.checkpoint();
    cast_expr(p);
    loop {
        let Some(bp) = binop_binding(p.current()) else { break };
        if bp < min_bp {
            break;
        }
        let is_range = matches!(p.current(), DotDot | DotDotEq);
        p.start_node_at(checkpoint, if is_range { RangeExpr } else { BinaryExpr });
        p.bump(); // operator
        if !is_range || !range_end_absent(p) {
            binary_expr(p, bp + 1);
        }
        p.finish_node();
    }
}

/// Whether a range's upper bound is syntactically absent (the range is
/// terminated by whatever follows, e.g. `x..` before `)`/`;`/`{`).
fn range_end_absent(p: &mut Parser) -> bool {
    matches!(p.current(), RParen | RBrace | RBracket | Semicolon | Comma | FatArrow)
}

fn cast_expr(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    unary_expr(p);
    while p.currently_is(KwAs) {
        p.start_node_at(checkpoint, CastExpr);
        p.bump(); // as
        type_ref(p);
        p.finish_node();
    }
}

fn unary_expr(p: &mut Parser) {
    if p.currently_is(Amp) && p.nth(1) == KwMut {
        p.start_node(MutRefExpr);
        p.bump(); // &
        p.bump(); // mut
        unary_expr(p);
        p.finish_node();
        return;
    }
    if matches!(p.current(), Minus | Bang | Star | Amp) {
        p.start_node(UnaryExpr);
        p.bump();
        unary_expr(p);
        p.finish_node();
        return;
    }
    if p.currently_is(KwAwait) {
        p.start_node(AwaitExpr);
        p.bump();
        unary_expr(p);
        p.finish_node();
        return;
    }
    if p.currently_is(KwRecv) {
        p.start_node(ReceiveExpr);
        p.bump();
        unary_expr(p);
        p.finish_node();
        return;
    }
    postfix_expr(p);
}

fn postfix_expr(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    primary_expr(p);
    loop {
        match p.current() {
            Dot => {
                p.bump();
                p.expect(Ident, "field or method name");
                if p.currently_is(LParen) {
                    arg_list(p);
                    p.start_node_at(checkpoint, MethodCallExpr);
                } else {
                    p.start_node_at(checkpoint, FieldAccessExpr);
                }
                p.finish_node();
            }
            LBracket => {
                p.bump();
                expr(p);
                p.expect(RBracket, "`]` to close index");
                p.start_node_at(checkpoint, IndexExpr);
                p.finish_node();
            }
            LParen => {
                arg_list(p);
                p.start_node_at(checkpoint, CallExpr);
                p.finish_node();
            }
            ColonColon if p.nth(1) == Lt => {
                p.bump(); // ::
                p.start_node(TypeArgList);
                p.bump(); // <
                type_ref(p);
                while p.eat(Comma) {
                    if p.currently_is(Gt) {
                        break;
                    }
                    type_ref(p);
                }
                p.expect(Gt, "`>` to close generic instantiation");
                p.finish_node();
                p.start_node_at(checkpoint, GenericInstExpr);
                p.finish_node();
            }
            _ => break,
        }
    }
}

fn arg_list(p: &mut Parser) {
    p.start_node(ArgList);
    p.expect(LParen, "`(` to open argument list");
    if !p.currently_is(RParen) {
        expr_list(p, RParen);
    }
    p.expect(RParen, "`)` to close argument list");
    p.finish_node();
}

fn expr_list(p: &mut Parser, end: SyntaxKind) {
    expr(p);
    while p.eat(Comma) {
        if p.currently_is(end) {
            break;
        }
        expr(p);
    }
}

fn primary_expr(p: &mut Parser) {
    match p.current() {
        IntLiteral | FloatLiteral | CharLiteral | StringLiteral | KwTrue | KwFalse | KwNull => {
            p.start_node(LiteralExpr);
            p.bump();
            p.finish_node();
        }
        KwSelf => {
            p.start_node(IdentExpr);
            p.bump();
            p.finish_node();
        }
        LParen => {
            p.start_node(ParenExpr);
            p.bump();
            expr(p);
            p.expect(RParen, "`)` to close parenthesized expression");
            p.finish_node();
        }
        LBracket => array_expr(p),
        KwUnsafe => {
            p.bump();
            block(p);
        }
        KwSelect => select_expr(p),
        Ident => ident_like_expr(p),
        _ => {
            p.error_and_bump(DiagnosticKind::ExpectedToken);
        }
    }
}

fn ident_like_expr(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    p.bump(); // first identifier
    let mut segments = 1;
    while p.currently_is(ColonColon) && p.nth(1) != Lt {
        p.bump();
        p.expect(Ident, "path segment");
        segments += 1;
    }
    if p.allow_struct_literal && p.currently_is(LBrace) {
        struct_expr_tail(p, checkpoint);
        return;
    }
    if segments > 1 {
        p.start_node_at(checkpoint, PathExpr);
    } else {
        p.start_node_at(checkpoint, IdentExpr);
    }
    p.finish_node();
}

fn struct_expr_tail(p: &mut Parser, checkpoint: rowan::Checkpoint) {
    p.bump(); // {
    if p.currently_is(KwNone) {
        p.bump();
    } else if p.currently_is(RBrace) {
        p.error(DiagnosticKind::MissingStructContent);
    } else {
        struct_expr_field(p);
        while p.eat(Comma) {
            if p.currently_is(RBrace) {
                break;
            }
            struct_expr_field(p);
        }
    }
    p.expect(RBrace, "`}` to close struct literal");
    p.start_node_at(checkpoint, StructExpr);
    p.finish_node();
}

fn struct_expr_field(p: &mut Parser) {
    p.start_node(StructExprField);
    p.expect(Ident, "field name");
    p.expect(Colon, "`:` before field value");
    expr(p);
    p.finish_node();
}

fn array_expr(p: &mut Parser) {
    p.start_node(ArrayExpr);
    p.bump(); // [
    if p.currently_is(KwVoid) {
        p.bump();
    } else if p.currently_is(RBracket) {
        p.error(DiagnosticKind::MissingArrayMarker);
    } else {
        expr_list(p, RBracket);
    }
    p.expect(RBracket, "`]` to close array literal");
    p.finish_node();
}

fn select_expr(p: &mut Parser) {
    p.start_node(SelectExpr);
    p.bump(); // select
    p.expect(LBrace, "`{` to open select body");
    while !p.currently_is(RBrace) && !p.should_stop() {
        p.start_node(SelectArm);
        expr_no_struct_literal(p);
        p.expect(FatArrow, "`=>` in select arm");
        block(p);
        p.eat(Comma);
        p.finish_node();
    }
    p.expect(RBrace, "`}` to close select body");
    p.finish_node();
}

// -------------------------------------------------------------- patterns --

fn pattern(p: &mut Parser) {
    match p.current() {
        IntLiteral | FloatLiteral | CharLiteral | StringLiteral | KwTrue | KwFalse | KwNull => {
            p.start_node(LiteralPat);
            p.bump();
            p.finish_node();
        }
        LParen => {
            p.start_node(TuplePat);
            p.bump();
            if !p.currently_is(RParen) {
                pattern(p);
                while p.eat(Comma) {
                    if p.currently_is(RParen) {
                        break;
                    }
                    pattern(p);
                }
            }
            p.expect(RParen, "`)` to close tuple pattern");
            p.finish_node();
        }
        Ident => ident_pattern(p),
        _ => {
            p.error_and_bump(DiagnosticKind::ExpectedToken);
        }
    }
}

fn ident_pattern(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    if p.at_wildcard_ident() {
        p.bump();
        p.start_node_at(checkpoint, WildcardPat);
        p.finish_node();
        return;
    }
    p.bump(); // identifier
    if p.currently_is(Dot) {
        p.bump();
        p.expect(Ident, "variant name");
        if p.eat(LParen) {
            if p.currently_is(KwVoid) {
                p.bump();
            } else if !p.currently_is(RParen) {
                pattern(p);
                while p.eat(Comma) {
                    if p.currently_is(RParen) {
                        break;
                    }
                    pattern(p);
                }
            }
            p.expect(RParen, "`)` to close variant pattern payload");
        }
        p.start_node_at(checkpoint, EnumVariantPat);
        p.finish_node();
        return;
    }
    if p.currently_is(LBrace) {
        p.bump();
        if !p.currently_is(RBrace) {
            struct_pat_field(p);
            while p.eat(Comma) {
                if p.currently_is(RBrace) {
                    break;
                }
                struct_pat_field(p);
            }
        }
        p.expect(RBrace, "`}` to close struct pattern");
        p.start_node_at(checkpoint, StructPat);
        p.finish_node();
        return;
    }
    p.start_node_at(checkpoint, IdentPat);
    p.finish_node();
}

fn struct_pat_field(p: &mut Parser) {
    p.start_node(StructPatField);
    p.expect(Ident, "field name");
    if p.eat(Colon) {
        pattern(p);
    }
    p.finish_node();
}

#[cfg(test)]
mod tests {
    use super::super::parse_source;
    use crate::diagnostics::DiagnosticKind;
    use crate::source::SourceManager;

    fn diagnose(src: &str) -> Vec<DiagnosticKind> {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        parse_source(id, src).diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn missing_visibility_is_flagged() {
        let kinds = diagnose("fn main(none) -> i32 { return 0; }\n");
        assert!(kinds.contains(&DiagnosticKind::MissingVisibility));
    }

    #[test]
    fn bare_empty_parens_is_flagged() {
        let kinds = diagnose("pub fn main() -> i32 { return 0; }\n");
        assert!(kinds.contains(&DiagnosticKind::MissingParameterList));
    }

    #[test]
    fn bare_empty_struct_body_is_flagged() {
        let kinds = diagnose("pub struct Empty {}\n");
        assert!(kinds.contains(&DiagnosticKind::MissingStructContent));
    }

    #[test]
    fn explicit_none_parameter_list_is_clean() {
        let kinds = diagnose("pub fn main(none) -> i32 { return 0; }\n");
        assert!(!kinds.contains(&DiagnosticKind::MissingParameterList));
    }

    #[test]
    fn bare_empty_array_is_flagged() {
        let src = "pub fn f(none) -> i32 { let xs: [i32] = []; return 0; }\n";
        let kinds = diagnose(src);
        assert!(kinds.contains(&DiagnosticKind::MissingArrayMarker));
    }

    #[test]
    fn explicit_void_array_is_clean() {
        let src = "pub fn f(none) -> i32 { let xs: [i32] = [void]; return 0; }\n";
        let kinds = diagnose(src);
        assert!(!kinds.contains(&DiagnosticKind::MissingArrayMarker));
    }

    #[test]
    fn enum_variant_without_payload_marker_is_flagged() {
        let kinds = diagnose("pub enum Maybe { Some(i32), None }\n");
        assert!(kinds.contains(&DiagnosticKind::MissingVariantArguments));
    }

    #[test]
    fn enum_variant_with_void_payload_is_clean() {
        let kinds = diagnose("pub enum Maybe { Some(i32), None(void) }\n");
        assert!(!kinds.contains(&DiagnosticKind::MissingVariantArguments));
    }

    #[test]
    fn annotation_without_explicit_args_is_flagged() {
        let src = "#[inline]\npub fn f(none) -> i32 { return 0; }\n";
        let kinds = diagnose(src);
        assert!(kinds.contains(&DiagnosticKind::MissingAnnotationArgs));
    }

    #[test]
    fn annotation_with_void_args_is_clean() {
        let src = "#[inline(void)]\npub fn f(none) -> i32 { return 0; }\n";
        let kinds = diagnose(src);
        assert!(!kinds.contains(&DiagnosticKind::MissingAnnotationArgs));
    }

    fn parses_cleanly(src: &str) -> bool {
        let mut sources = SourceManager::new();
        let id = sources.add("<inline>", src);
        parse_source(id, src).diagnostics.is_empty()
    }

    #[test]
    fn operator_precedence_multiplicative_over_additive() {
        assert!(parses_cleanly("pub fn f(none) -> i32 { return 1 + 2 * 3; }\n"));
    }

    #[test]
    fn struct_literal_disabled_in_if_condition() {
        // `Point` here must parse as a plain identifier, not the start of a
        // struct literal, so the block below it is not swallowed as fields.
        let src = "pub fn f(none) -> i32 {\n    if Point { return 1; }\n    return 0;\n}\n";
        assert!(parses_cleanly(src));
    }

    #[test]
    fn mut_reference_expression_parses_cleanly() {
        let src = "pub fn f(none) -> i32 {\n    let mut x: i32 = 1;\n    let p: *mut i32 = &mut x;\n    return x;\n}\n";
        assert!(parses_cleanly(src));
    }

    #[test]
    fn nested_match_with_enum_variant_patterns() {
        let src = "pub enum Opt { Some(i32), None(void) }\n\
                   pub fn f(o: Opt) -> i32 {\n    match o {\n        Opt.Some(x) => x,\n        Opt.None(void) => 0,\n    }\n}\n";
        assert!(parses_cleanly(src));
    }
}
