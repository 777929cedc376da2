// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source entries
//!
//! A source entry yields a module's text on demand. The loader reads it when
//! the module is first evaluated and never again once it is cached.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Lazy accessor for a module's source text
pub trait ModuleSource: Send + Sync {
    /// Read the full source text
    fn read(&self) -> io::Result<String>;

    /// Short description for diagnostics
    fn describe(&self) -> String {
        "<source>".to_string()
    }
}

/// In-memory source text
#[derive(Debug, Clone)]
pub struct StringSource(Arc<str>);

impl StringSource {
    /// Wrap source text
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }
}

impl ModuleSource for StringSource {
    fn read(&self) -> io::Result<String> {
        Ok(self.0.to_string())
    }

    fn describe(&self) -> String {
        format!("<inline, {} bytes>", self.0.len())
    }
}

/// Source text read from a file when first needed
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModuleSource for FileSource {
    fn read(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// One (registration key, source) pair
#[derive(Clone)]
pub struct SourceEntry {
    /// Registration key
    pub key: String,
    /// Source accessor
    pub source: Arc<dyn ModuleSource>,
}

impl fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceEntry")
            .field("key", &self.key)
            .field("source", &self.source.describe())
            .finish()
    }
}

/// Ordered collection of source entries, keyed by registration key.
///
/// Re-inserting a key replaces its source but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    entries: Vec<SourceEntry>,
}

impl SourceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source under `key`
    pub fn insert(&mut self, key: impl Into<String>, source: impl ModuleSource + 'static) -> &mut Self {
        self.insert_arc(key, Arc::new(source))
    }

    /// Insert a shared source under `key`
    pub fn insert_arc(&mut self, key: impl Into<String>, source: Arc<dyn ModuleSource>) -> &mut Self {
        let key = key.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.source = source,
            None => self.entries.push(SourceEntry { key, source }),
        }
        self
    }

    /// Insert in-memory source text under `key`
    pub fn insert_str(&mut self, key: impl Into<String>, text: impl Into<Arc<str>>) -> &mut Self {
        self.insert(key, StringSource::new(text))
    }

    /// Register files below `root` under their given relative names
    pub fn add_files<I, S>(&mut self, root: impl AsRef<Path>, files: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.as_ref();
        for file in files {
            let file = file.as_ref();
            self.insert(file, FileSource::new(root.join(file)));
        }
        self
    }

    /// Register every file with `extension` below `root`.
    ///
    /// Keys are root-relative paths with `/` separators, in sorted order.
    pub fn from_directory(root: impl AsRef<Path>, extension: &str) -> io::Result<Self> {
        let root = root.as_ref();
        let extension = extension.trim_start_matches('.');
        let mut map = Self::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            map.insert(key, FileSource::new(path));
        }

        tracing::debug!(root = %root.display(), modules = map.len(), "collected directory sources");
        Ok(map)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries.iter()
    }

    /// Registration keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceMap {
    type Item = &'a SourceEntry;
    type IntoIter = std::slice::Iter<'a, SourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_keeps_position() {
        let mut map = SourceMap::new();
        map.insert_str("a", "1").insert_str("b", "2").insert_str("a", "3");

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        let first = map.iter().next().unwrap();
        assert_eq!(first.source.read().unwrap(), "3");
    }

    #[test]
    fn test_file_source_reads_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = SourceMap::new();
        map.add_files(dir.path(), ["late.js"]);

        // Written after registration; nothing was read yet
        std::fs::write(dir.path().join("late.js"), "exports.x = 1;").unwrap();
        let entry = map.iter().next().unwrap();
        assert_eq!(entry.source.read().unwrap(), "exports.x = 1;");
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let source = FileSource::new("/definitely/not/here.js");
        assert!(source.read().is_err());
    }

    #[test]
    fn test_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("main.js"), "").unwrap();
        std::fs::write(dir.path().join("lib/util.js"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let map = SourceMap::from_directory(dir.path(), ".js").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["lib/util.js", "main.js"]);
    }
}
