//! Source Manager.
//!
//! Owns the byte buffers for every file participating in a compilation,
//! resolves byte offsets to `(line, column)` pairs, and hands back source
//! snippets for diagnostic rendering. Line-offset tables are built lazily,
//! on first position query, as spec.md §4.1 requires.

use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rowan::{TextRange, TextSize};

/// Identifies a file loaded into a `SourceManager`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize)]
pub struct SourceId(u32);

impl SourceId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for SourceId {
    fn from(value: u32) -> Self {
        SourceId(value)
    }
}

/// A resolved `(line, column)` position, both 1-based for human display.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct SourceFile {
    /// Display name: the path for file-backed sources, a synthetic label
    /// (e.g. `<inline>`) for in-memory ones.
    name: String,
    path: Option<PathBuf>,
    text: String,
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    /// Built on first `resolve`/`snippet` call.
    line_starts: OnceCell<Vec<u32>>,
}

impl SourceFile {
    fn line_starts(&self) -> &[u32] {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0u32];
            for (i, b) in self.text.bytes().enumerate() {
                if b == b'\n' {
                    starts.push(i as u32 + 1);
                }
            }
            starts
        })
    }
}

/// Owns every source buffer participating in one compilation.
#[derive(Default)]
pub struct SourceManager {
    files: Vec<SourceFile>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a file from disk, returning a fresh `SourceId`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<SourceId, SourceError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.insert(path.display().to_string(), Some(path.to_path_buf()), text))
    }

    /// Register in-memory source text (used by tests and `-q`/`-s`-style
    /// inline CLI input) under a synthetic display name.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        self.insert(name.into(), None, text.into())
    }

    fn insert(&mut self, name: String, path: Option<PathBuf>, text: String) -> SourceId {
        let id = SourceId(self.files.len() as u32);
        self.files.push(SourceFile {
            name,
            path,
            text,
            line_starts: OnceCell::new(),
        });
        id
    }

    fn file(&self, id: SourceId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn name(&self, id: SourceId) -> &str {
        &self.file(id).name
    }

    pub fn path(&self, id: SourceId) -> Option<&Path> {
        self.file(id).path.as_deref()
    }

    pub fn text(&self, id: SourceId) -> &str {
        &self.file(id).text
    }

    pub fn bytes(&self, id: SourceId) -> &[u8] {
        self.file(id).text.as_bytes()
    }

    /// Resolve a byte offset into a 1-based `(line, column)` pair. Column is
    /// counted in UTF-8 bytes from the start of the line (sufficient for
    /// caret placement against the ASCII-aligned token spans the lexer
    /// produces).
    pub fn resolve(&self, id: SourceId, offset: TextSize) -> LineCol {
        let offset = u32::from(offset);
        let starts = self.file(id).line_starts();
        let line_idx = match starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = starts[line_idx];
        LineCol {
            line: line_idx as u32 + 1,
            column: offset - line_start + 1,
        }
    }

    /// The raw text covered by `range`.
    pub fn snippet(&self, id: SourceId, range: TextRange) -> &str {
        &self.file(id).text[range]
    }

    /// The full text of the line containing `offset`, without its trailing
    /// newline. Used by the human diagnostic renderer for context.
    pub fn line_text(&self, id: SourceId, offset: TextSize) -> &str {
        let file = self.file(id);
        let starts = file.line_starts();
        let offset = u32::from(offset);
        let line_idx = match starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = starts[line_idx] as usize;
        let end = starts
            .get(line_idx + 1)
            .map(|&e| e as usize - 1)
            .unwrap_or(file.text.len());
        file.text[start..end.max(start)].trim_end_matches('\r')
    }
}

impl fmt::Debug for SourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceManager")
            .field("files", &self.files.iter().map(|f| &f.name).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_first_line() {
        let mut sm = SourceManager::new();
        let id = sm.add("<inline>", "package p;\nfn f() {}");
        let lc = sm.resolve(id, TextSize::from(0));
        assert_eq!(lc, LineCol { line: 1, column: 1 });
    }

    #[test]
    fn resolve_second_line() {
        let mut sm = SourceManager::new();
        let id = sm.add("<inline>", "package p;\nfn f() {}");
        // offset 11 is the 'f' of 'fn' on line 2
        let lc = sm.resolve(id, TextSize::from(11));
        assert_eq!(lc, LineCol { line: 2, column: 1 });
    }

    #[test]
    fn snippet_extracts_range() {
        let mut sm = SourceManager::new();
        let id = sm.add("<inline>", "package p;\npub fn main(none) -> i32 { return 0; }");
        let range = TextRange::new(TextSize::from(11), TextSize::from(14));
        assert_eq!(sm.snippet(id, range), "pub");
    }

    #[test]
    fn line_text_without_newline() {
        let mut sm = SourceManager::new();
        let id = sm.add("<inline>", "line one\r\nline two\nline three");
        assert_eq!(sm.line_text(id, TextSize::from(0)), "line one");
        assert_eq!(sm.line_text(id, TextSize::from(10)), "line two");
    }

    #[test]
    fn load_missing_file_errors() {
        let mut sm = SourceManager::new();
        let err = sm.load("/does/not/exist/asthra.as").unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn load_real_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.as");
        std::fs::write(&path, "package p;\n").unwrap();

        let mut sm = SourceManager::new();
        let id = sm.load(&path).unwrap();
        assert_eq!(sm.text(id), "package p;\n");
        assert_eq!(sm.path(id), Some(path.as_path()));
    }
}
