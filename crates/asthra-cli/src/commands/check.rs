use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use asthra_compiler::{compile, CompileOptions, DiagnosticsPrinter, SourceManager};

use crate::cli::{CheckArgs, ColorChoice};

use super::{load_package, parse_categories};

pub fn run(args: CheckArgs) -> i32 {
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

    if output.diagnostics().has_errors() {
        1
    } else {
        0
    }
}

pub(super) fn render(sources: &SourceManager, diagnostics: &asthra_compiler::Diagnostics, json: bool, color: ColorChoice) {
    let printer = DiagnosticsPrinter::new(sources, color.should_colorize());
    if json {
        let value = printer.render_json(diagnostics);
        println!("{}", serde_json::to_string_pretty(&value).expect("diagnostic JSON is always serializable"));
    } else {
        eprint!("{}", printer.render_human(diagnostics));
    }
}
