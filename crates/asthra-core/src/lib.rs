//! Shared primitives for the Asthra compiler.
//!
//! Just the string interner: every other crate in the workspace builds on
//! top of it to give names (identifiers, package paths, symbol names) a
//! cheap, `Copy`, totally-ordered handle instead of passing `String`s
//! around.

mod interner;

pub use interner::{Interner, Symbol};
