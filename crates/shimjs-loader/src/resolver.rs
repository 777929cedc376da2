// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module key resolution
//!
//! Pure string functions that turn a registration key, or a `require()`
//! specifier plus the requesting module's directory, into one canonical
//! module key of the form `/<segments>.<ext>`. No filesystem access.

use crate::config::KeyStrategy;

/// Path separator used in keys and specifiers
pub const SEPARATOR: char = '/';

/// Resolves registration keys and specifiers to canonical module keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleResolver {
    /// Extension suffix including the dot (`.js`)
    suffix: String,
    /// Registry/cache key strategy
    strategy: KeyStrategy,
}

impl ModuleResolver {
    /// Create a resolver for the given extension (with or without a leading dot)
    pub fn new(extension: &str) -> Self {
        Self {
            suffix: format!(".{}", extension.trim_start_matches('.')),
            strategy: KeyStrategy::CanonicalPath,
        }
    }

    /// Use a different key strategy
    pub fn with_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The extension suffix, including the dot
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Append the module extension unless `path` already ends with it
    pub fn ensure_extension(&self, path: &str) -> String {
        if path.ends_with(&self.suffix) {
            path.to_string()
        } else {
            format!("{}{}", path, self.suffix)
        }
    }

    /// Directory portion of a registration key, simplified.
    ///
    /// `lib/./util.js` and `./lib/util.js` both give `lib`; a key without a
    /// separator gives the empty string.
    pub fn directory_of(&self, key: &str) -> String {
        match key.rfind(SEPARATOR) {
            Some(0) => SEPARATOR.to_string(),
            Some(pos) => simplify(&key[..pos]),
            None => String::new(),
        }
    }

    /// Canonical key for a registration key or an already-joined path
    pub fn canonicalize(&self, path: &str) -> String {
        let path = self.ensure_extension(path);
        // A single leading '.' is a leftover of a relative prefix
        let path = path.strip_prefix('.').unwrap_or(&path);
        if path.starts_with(SEPARATOR) {
            simplify(path)
        } else {
            simplify(&format!("{}{}", SEPARATOR, path))
        }
    }

    /// Resolve `specifier` as required from `from_directory`
    pub fn resolve(&self, from_directory: &str, specifier: &str) -> String {
        let target = self.ensure_extension(specifier);
        let target = target.strip_prefix("./").unwrap_or(&target);

        let joined = if target.starts_with(SEPARATOR) {
            target.to_string()
        } else if from_directory.is_empty() || from_directory.ends_with(SEPARATOR) {
            format!("{}{}", from_directory, target)
        } else {
            format!("{}{}{}", from_directory, SEPARATOR, target)
        };

        self.canonicalize(&joined)
    }

    /// Map a canonical key to the registry/cache key for the active strategy
    pub fn module_key(&self, canonical: String) -> String {
        match self.strategy {
            KeyStrategy::CanonicalPath => canonical,
            KeyStrategy::FileName => file_name_key(&canonical),
        }
    }

    /// Registry key for a registration key
    pub fn registration_key(&self, key: &str) -> String {
        self.module_key(self.canonicalize(key))
    }

    /// Registry key for a specifier required from `from_directory`
    pub fn specifier_key(&self, from_directory: &str, specifier: &str) -> String {
        self.module_key(self.resolve(from_directory, specifier))
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EXTENSION)
    }
}

/// Collapse empty, `.` and `..` segments.
///
/// `..` pops the previous segment; it is kept when it leads a relative path
/// and dropped at the root of an absolute one.
pub fn simplify(path: &str) -> String {
    let absolute = path.starts_with(SEPARATOR);
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("{}{}", SEPARATOR, joined)
    } else {
        joined
    }
}

/// Legacy file-name key: the last segment of a canonical key, rooted
pub fn file_name_key(canonical: &str) -> String {
    let name = canonical.rsplit(SEPARATOR).next().unwrap_or(canonical);
    format!("{}{}", SEPARATOR, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_extension() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.ensure_extension("a/b"), "a/b.js");
        assert_eq!(resolver.ensure_extension("a/b.js"), "a/b.js");
        assert_eq!(resolver.ensure_extension("a/b.json"), "a/b.json.js");
    }

    #[test]
    fn test_directory_of() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.directory_of("uglify.js"), "");
        assert_eq!(resolver.directory_of("./lib/parse-js.js"), "lib");
        assert_eq!(resolver.directory_of("a/./b/c.js"), "a/b");
        assert_eq!(resolver.directory_of("/pkg/index"), "/pkg");
        assert_eq!(resolver.directory_of("/index"), "/");
        assert_eq!(resolver.directory_of("a/../b/c"), "b");
        assert_eq!(resolver.directory_of("../up/c"), "../up");
    }

    #[test]
    fn test_canonicalize() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.canonicalize("lib/a"), "/lib/a.js");
        assert_eq!(resolver.canonicalize("./lib/a"), "/lib/a.js");
        assert_eq!(resolver.canonicalize("/lib/a.js"), "/lib/a.js");
        assert_eq!(resolver.canonicalize("lib/./a"), "/lib/a.js");
        assert_eq!(resolver.canonicalize("lib/x/../a"), "/lib/a.js");
        assert_eq!(resolver.canonicalize("../a"), "/a.js");
    }

    #[test]
    fn test_resolve_equivalent_spellings() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.resolve("/a/b", "./c"), "/a/b/c.js");
        assert_eq!(resolver.resolve("/a/b", "c"), "/a/b/c.js");
        assert_eq!(resolver.resolve("/a/b/", "c.js"), "/a/b/c.js");
    }

    #[test]
    fn test_resolve_absolute_and_root() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.resolve("/a/b", "/x/y"), "/x/y.js");
        assert_eq!(resolver.resolve("", "lib/a"), "/lib/a.js");
        assert_eq!(resolver.resolve("", "./lib/a"), "/lib/a.js");
        assert_eq!(resolver.resolve("lib", "./parse-js"), "/lib/parse-js.js");
        assert_eq!(resolver.resolve("/", "index"), "/index.js");
    }

    #[test]
    fn test_resolve_parent_segments() {
        let resolver = ModuleResolver::default();
        assert_eq!(resolver.resolve("/pkg/lib", "../index"), "/pkg/index.js");
        assert_eq!(resolver.resolve("lib", "../../top"), "/top.js");
    }

    #[test]
    fn test_registration_and_specifier_keys_agree() {
        let resolver = ModuleResolver::default();
        for key in ["lib/a", "./lib/a", "/lib/a.js", "lib/a.js"] {
            assert_eq!(resolver.registration_key(key), "/lib/a.js");
            assert_eq!(resolver.specifier_key("", key), "/lib/a.js");
        }
    }

    #[test]
    fn test_file_name_strategy() {
        let resolver = ModuleResolver::default().with_strategy(KeyStrategy::FileName);
        assert_eq!(resolver.registration_key("lib/deep/util"), "/util.js");
        assert_eq!(resolver.specifier_key("/somewhere/else", "./util"), "/util.js");
    }

    #[test]
    fn test_other_extension() {
        let resolver = ModuleResolver::new(".mjs");
        assert_eq!(resolver.suffix(), ".mjs");
        assert_eq!(resolver.canonicalize("a"), "/a.mjs");
    }
}
