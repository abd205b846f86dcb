pub mod check;
pub mod ir;

use std::path::{Path, PathBuf};

use asthra_compiler::diagnostics::Category;
use asthra_compiler::source::SourceError;
use asthra_compiler::SourceManager;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{path} has no `.as` files")]
    EmptyPackage { path: PathBuf },
    #[error("unknown diagnostic category `{0}`")]
    UnknownCategory(String),
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Io { path, source } => CliError::Io { path, source },
        }
    }
}

/// Loads `path` into `sources`: a single file if `path` names one, or every
/// `*.as` file directly inside it (non-recursive — spec.md's compilation
/// unit is "a directory of files sharing the same `package` declaration",
/// not a whole tree) if `path` is a directory.
pub fn load_package(path: &Path, sources: &mut SourceManager) -> Result<Vec<asthra_compiler::SourceId>, CliError> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)
            .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map(|ext| ext == "as").unwrap_or(false))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(CliError::EmptyPackage { path: path.to_path_buf() });
        }
        files
            .into_iter()
            .map(|file| sources.load(&file).map_err(CliError::from))
            .collect()
    } else {
        let id = sources.load(path).map_err(CliError::from)?;
        Ok(vec![id])
    }
}

pub fn parse_categories(names: &[String]) -> Result<Vec<Category>, CliError> {
    names
        .iter()
        .map(|name| match name.as_str() {
            "semantic" => Ok(Category::Semantic),
            "syntax" => Ok(Category::Syntax),
            "type_system" | "type-system" => Ok(Category::TypeSystem),
            "grammar" => Ok(Category::Grammar),
            "ffi" => Ok(Category::Ffi),
            "security" => Ok(Category::Security),
            other => Err(CliError::UnknownCategory(other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.as");
        fs::write(&file, "pub fn f(none) -> i32 { return 1; }\n").unwrap();

        let mut sources = SourceManager::new();
        let ids = load_package(&file, &mut sources).unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn loads_every_as_file_in_a_directory_non_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.as"), "pub fn f(none) -> void { return; }\n").unwrap();
        fs::write(dir.path().join("b.as"), "pub fn g(none) -> void { return; }\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "not asthra source").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.as"), "pub fn h(none) -> void { return; }\n").unwrap();

        let mut sources = SourceManager::new();
        let ids = load_package(dir.path(), &mut sources).unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = SourceManager::new();
        assert!(matches!(load_package(dir.path(), &mut sources), Err(CliError::EmptyPackage { .. })));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(parse_categories(&["bogus".to_string()]).is_err());
    }

    #[test]
    fn known_categories_parse() {
        let cats = parse_categories(&["security".to_string(), "ffi".to_string()]).unwrap();
        assert_eq!(cats, vec![Category::Security, Category::Ffi]);
    }
}
