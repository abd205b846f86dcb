use std::fmt::Write as _;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use asthra_compiler::ir::{BasicBlock, Const, Function, Instr, Module, Rvalue, Terminator};
use asthra_compiler::{compile, CompileOptions, CompileOutput, SourceManager};

use crate::cli::IrArgs;

use super::{check::render, load_package, parse_categories};

pub fn run(args: IrArgs) -> i32 {
    let mut sources = SourceManager::new();
    let ids = match load_package(&args.path, &mut sources) {
        Ok(ids) => ids,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    let suppressed = match parse_categories(&args.suppress) {
        Ok(cats) => cats,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    let texts: Vec<(asthra_compiler::SourceId, &str)> = ids.iter().map(|&id| (id, sources.text(id))).collect();
    let options = CompileOptions {
        suppressed_categories: suppressed,
        warnings_as_errors: args.strict,
        cancellation: Arc::new(AtomicBool::new(false)),
        ..CompileOptions::default()
    };
    let output = compile(&texts, &options);

    render(&sources, output.diagnostics(), args.json, args.color);
    let has_errors = output.diagnostics().has_errors();

    // Still dumps whatever IR was lowered even when there were errors,
    // matching spec.md §7's degrade-gracefully recovery model.
    let modules = match output {
        CompileOutput::Done { modules, .. } => modules,
        CompileOutput::Cancelled { .. } => {
            eprintln!("error: compilation was cancelled");
            return 1;
        }
    };

    for module in &modules {
        print!("{}", dump_module(module));
    }

    if has_errors {
        1
    } else {
        0
    }
}

fn dump_module(module: &Module) -> String {
    let mut out = String::new();
    for func in &module.functions {
        dump_function(&mut out, func);
    }
    if !module.data_pool.is_empty() {
        let _ = writeln!(out, "data_pool:");
        for i in 0..module.data_pool.len() {
            let _ = writeln!(out, "  [{i}] {:?}", module.data_pool.get(i as u32));
        }
    }
    out
}

fn dump_function(out: &mut String, func: &Function) {
    let params: Vec<String> = func.params.iter().map(|p| p.name.clone()).collect();
    let _ = writeln!(out, "fn {}({}) {{", func.qualified_name, params.join(", "));
    for (i, ty) in func.locals.iter().enumerate() {
        let _ = writeln!(out, "  local %{i}: {ty:?}");
    }
    for block in &func.blocks {
        dump_block(out, block);
    }
    let _ = writeln!(out, "}}");
}

fn dump_block(out: &mut String, block: &BasicBlock) {
    let _ = writeln!(out, "  bb{}:", block.label.0);
    for instr in &block.instructions {
        let _ = writeln!(out, "    {}", dump_instr(instr));
    }
    let _ = writeln!(out, "    {}", dump_terminator(&block.terminator));
}

fn dump_instr(instr: &Instr) -> String {
    match instr {
        Instr::Assign { dest, value } => format!("%{} = {}", dest.0, dump_rvalue(value)),
        Instr::Store { place, value } => format!("store {} = {}", dump_rvalue(place), dump_rvalue(value)),
        Instr::Eval(value) => format!("eval {}", dump_rvalue(value)),
    }
}

fn dump_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Return(Some(v)) => format!("return {}", dump_rvalue(v)),
        Terminator::Return(None) => "return".to_string(),
        Terminator::Goto(label) => format!("goto bb{}", label.0),
        Terminator::Branch { cond, then_block, else_block } => {
            format!("branch {} -> bb{}, bb{}", dump_rvalue(cond), then_block.0, else_block.0)
        }
        Terminator::Switch { scrutinee, arms, default } => {
            let arms: Vec<String> = arms.iter().map(|(v, l)| format!("{v:?} -> bb{}", l.0)).collect();
            format!("switch {} [{}] default bb{}", dump_rvalue(scrutinee), arms.join(", "), default.0)
        }
        Terminator::Unreachable => "unreachable".to_string(),
    }
}

fn dump_rvalue(value: &Rvalue) -> String {
    match value {
        Rvalue::Const(Const::Int(v)) => v.to_string(),
        Rvalue::Const(Const::Float(v)) => v.to_string(),
        Rvalue::Const(Const::Bool(v)) => v.to_string(),
        Rvalue::Const(Const::Str(id)) => format!("str#{id}"),
        Rvalue::Const(Const::Void) => "void".to_string(),
        Rvalue::Local(id) => format!("%{}", id.0),
        Rvalue::Binary(op, lhs, rhs) => format!("({:?} {} {})", op, dump_rvalue(lhs), dump_rvalue(rhs)),
        Rvalue::Unary(op, v) => format!("({:?} {})", op, dump_rvalue(v)),
        Rvalue::Call(name, args) => format!("{name}({})", args.iter().map(dump_rvalue).collect::<Vec<_>>().join(", ")),
        Rvalue::MethodCall(recv, name, args) => {
            format!("{}.{name}({})", dump_rvalue(recv), args.iter().map(dump_rvalue).collect::<Vec<_>>().join(", "))
        }
        Rvalue::Field(base, name) => format!("{}.{name}", dump_rvalue(base)),
        Rvalue::Index(base, index) => format!("{}[{}]", dump_rvalue(base), dump_rvalue(index)),
        Rvalue::Cast(inner, ty) => format!("({} as {:?})", dump_rvalue(inner), ty),
        Rvalue::Struct(name, fields) => {
            let fields: Vec<String> = fields.iter().map(|(n, v)| format!("{n}: {}", dump_rvalue(v))).collect();
            format!("{name} {{ {} }}", fields.join(", "))
        }
        Rvalue::Array(elems) => format!("[{}]", elems.iter().map(dump_rvalue).collect::<Vec<_>>().join(", ")),
        Rvalue::Error => "<error>".to_string(),
    }
}
