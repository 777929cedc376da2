// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration

use serde::{Deserialize, Serialize};

/// Default module extension, without the leading dot
pub const DEFAULT_EXTENSION: &str = "js";

/// How modules are keyed in the registry and the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    /// Full canonical path (`/lib/util.js`)
    #[default]
    CanonicalPath,
    /// File name only (`/util.js`).
    ///
    /// Legacy mode: two same-named files in different directories collide at
    /// registration, and a relative require from anywhere finds a module by its
    /// file name alone.
    FileName,
}

/// Configuration for a [`ModuleLoader`](crate::ModuleLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Module extension appended to keys and specifiers (without the dot)
    pub extension: String,

    /// Registry/cache key strategy
    pub key_strategy: KeyStrategy,

    /// Whether callers registering sources should evaluate them right away
    pub preload: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            key_strategy: KeyStrategy::CanonicalPath,
            preload: false,
        }
    }
}

impl LoaderConfig {
    /// Set the module extension; a leading dot is ignored.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set the key strategy
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    /// Set the preload default
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.extension, "js");
        assert_eq!(config.key_strategy, KeyStrategy::CanonicalPath);
        assert!(!config.preload);
    }

    #[test]
    fn test_partial_toml() {
        let config: LoaderConfig = toml::from_str("key-strategy = \"file-name\"").unwrap();
        assert_eq!(config.key_strategy, KeyStrategy::FileName);
        assert_eq!(config.extension, "js");
    }

    #[test]
    fn test_extension_dot_is_trimmed() {
        let config = LoaderConfig::default().with_extension(".mjs");
        assert_eq!(config.extension, "mjs");
    }
}
