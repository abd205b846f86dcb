//! Argument parsing: two subcommands over the core's `compile()` entry
//! point, covering the two operations `asthra-compiler` actually exposes.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "asthra", about = "Driver for the Asthra compiler core", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse and analyze a file or package directory, reporting diagnostics.
    Check(CheckArgs),
    /// Parse, analyze, and lower a file or package directory, dumping the IR.
    Ir(IrArgs),
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Source file or package directory (non-recursive `*.as` discovery).
    pub path: PathBuf,
    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
    /// Comma-separated diagnostic categories to suppress (e.g. `security,ffi`).
    #[arg(long, value_delimiter = ',')]
    pub suppress: Vec<String>,
    /// Emit diagnostics as the stable JSON schema instead of human-readable text.
    #[arg(long)]
    pub json: bool,
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

#[derive(clap::Args)]
pub struct IrArgs {
    /// Source file or package directory (non-recursive `*.as` discovery).
    pub path: PathBuf,
    #[arg(long)]
    pub strict: bool,
    #[arg(long, value_delimiter = ',')]
    pub suppress: Vec<String>,
    #[arg(long)]
    pub json: bool,
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn should_colorize(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::IsTerminal::is_terminal(&std::io::stdout())
                    && std::io::IsTerminal::is_terminal(&std::io::stderr())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_parses_path_and_strict() {
        let cli = Cli::try_parse_from(["asthra", "check", "pkg/", "--strict"]).unwrap();
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.path, PathBuf::from("pkg/"));
                assert!(args.strict);
                assert!(args.suppress.is_empty());
            }
            Command::Ir(_) => panic!("expected check"),
        }
    }

    #[test]
    fn check_parses_comma_separated_suppress_list() {
        let cli = Cli::try_parse_from(["asthra", "check", "f.as", "--suppress", "security,ffi"]).unwrap();
        match cli.command {
            Command::Check(args) => assert_eq!(args.suppress, vec!["security", "ffi"]),
            Command::Ir(_) => panic!("expected check"),
        }
    }

    #[test]
    fn ir_parses_json_flag() {
        let cli = Cli::try_parse_from(["asthra", "ir", "f.as", "--json"]).unwrap();
        match cli.command {
            Command::Ir(args) => assert!(args.json),
            Command::Check(_) => panic!("expected ir"),
        }
    }

    #[test]
    fn missing_path_is_rejected() {
        assert!(Cli::try_parse_from(["asthra", "check"]).is_err());
    }
}
