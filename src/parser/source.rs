//! Content source abstraction for reading model documents.

use anyhow::{Context, Result};
use camino::Utf8Path;

/// Trait for abstracting file I/O, so the model walk can be fed from disk or
/// from memory.
pub trait ContentSource {
    /// Read a document at the given logical path and return its content.
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String>;
}

/// Reads documents directly from the local filesystem.
pub struct FsSource;

impl ContentSource for FsSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        std::fs::read_to_string(path.as_std_path())
            .with_context(|| format!("Failed to read {}", path))
    }
}

impl<S: ContentSource + ?Sized> ContentSource for &mut S {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        (**self).read_to_string(path)
    }
}
