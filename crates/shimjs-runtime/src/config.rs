// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration.
//!
//! Values are layered: defaults, then `shimjs.toml` (or an explicit file),
//! then `SHIMJS_*` environment variables.
//!
//! ```toml
//! [loader]
//! extension = "js"
//! key-strategy = "canonical-path"
//! preload = true
//!
//! [script]
//! max-call-depth = 256
//!
//! [executor]
//! queue-capacity = 1000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shimjs_loader::{KeyStrategy, LoaderConfig};
use shimjs_script::DEFAULT_MAX_CALL_DEPTH;
use tracing::warn;

use crate::error::{Result, RuntimeError};

/// File looked up in the working directory when no path is given
pub const CONFIG_FILE: &str = "shimjs.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SHIMJS_";

/// Default executor queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 50_000;

/// Default executor thread name
pub const DEFAULT_THREAD_NAME: &str = "shimjs-executor";

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScriptConfig {
    /// Maximum nesting of script function calls
    pub max_call_depth: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Executor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExecutorConfig {
    /// Jobs that may wait in the queue before submissions are rejected
    pub queue_capacity: usize,

    /// Name of the worker thread
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Module loader settings
    pub loader: LoaderConfig,

    /// Interpreter settings
    pub script: ScriptConfig,

    /// Executor settings
    pub executor: ExecutorConfig,
}

impl RuntimeConfig {
    /// Load configuration from `path`, or from `shimjs.toml` in the working
    /// directory when it exists, then apply environment overrides.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| RuntimeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SHIMJS_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `SHIMJS_*` overrides using `lookup` to read variables.
    ///
    /// `SHIMJS_QUEUE_CAPACITY` maps to the `queue-capacity` key, and so on
    /// for every key [`set`](Self::set) accepts.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in Self::KEYS {
            let var = format!("{ENV_PREFIX}{}", key.to_uppercase().replace('-', "_"));
            if let Some(value) = lookup(&var) {
                if !self.set(key, &value) {
                    warn!(variable = %var, value = %value, "ignoring invalid environment override");
                }
            }
        }
    }

    /// Keys accepted by [`set`](Self::set) and [`get`](Self::get)
    pub const KEYS: [&'static str; 6] = [
        "extension",
        "key-strategy",
        "preload",
        "max-call-depth",
        "queue-capacity",
        "thread-name",
    ];

    /// Set a configuration value by key.
    ///
    /// Returns false for unknown keys and for values that do not parse; the
    /// configuration is left unchanged in both cases.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match key {
            "extension" => {
                self.loader.extension = value.trim_start_matches('.').to_string();
            }
            "key-strategy" => match value {
                "canonical-path" => self.loader.key_strategy = KeyStrategy::CanonicalPath,
                "file-name" => self.loader.key_strategy = KeyStrategy::FileName,
                _ => return false,
            },
            "preload" => match parse_flag(value) {
                Some(flag) => self.loader.preload = flag,
                None => return false,
            },
            "max-call-depth" => match value.parse() {
                Ok(depth) => self.script.max_call_depth = depth,
                Err(_) => return false,
            },
            "queue-capacity" => match value.parse() {
                Ok(capacity) if capacity > 0 => self.executor.queue_capacity = capacity,
                _ => return false,
            },
            "thread-name" => self.executor.thread_name = value.to_string(),
            _ => return false,
        }
        true
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "extension" => Some(self.loader.extension.clone()),
            "key-strategy" => Some(
                match self.loader.key_strategy {
                    KeyStrategy::CanonicalPath => "canonical-path",
                    KeyStrategy::FileName => "file-name",
                }
                .to_string(),
            ),
            "preload" => Some(self.loader.preload.to_string()),
            "max-call-depth" => Some(self.script.max_call_depth.to_string()),
            "queue-capacity" => Some(self.executor.queue_capacity.to_string()),
            "thread-name" => Some(self.executor.thread_name.clone()),
            _ => None,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.loader.extension, "js");
        assert!(!config.loader.preload);
        assert_eq!(config.script.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.executor.queue_capacity, 50_000);
        assert_eq!(config.executor.thread_name, "shimjs-executor");
    }

    #[test]
    fn test_partial_toml() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [loader]
            key-strategy = "file-name"

            [executor]
            queue-capacity = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.loader.key_strategy, KeyStrategy::FileName);
        assert_eq!(config.loader.extension, "js");
        assert_eq!(config.executor.queue_capacity, 10);
        assert_eq!(config.executor.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SHIMJS_EXTENSION", ".mjs"),
            ("SHIMJS_PRELOAD", "yes"),
            ("SHIMJS_QUEUE_CAPACITY", "64"),
            ("SHIMJS_MAX_CALL_DEPTH", "not a number"),
        ]
        .into_iter()
        .collect();

        let mut config = RuntimeConfig::default();
        config.apply_env_from(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.loader.extension, "mjs");
        assert!(config.loader.preload);
        assert_eq!(config.executor.queue_capacity, 64);
        assert_eq!(config.script.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = RuntimeConfig::default();
        assert!(config.set("key-strategy", "file-name"));
        assert_eq!(config.get("key-strategy").as_deref(), Some("file-name"));

        assert!(!config.set("key-strategy", "bogus"));
        assert!(!config.set("queue-capacity", "0"));
        assert!(!config.set("unknown", "1"));
        assert_eq!(config.get("unknown"), None);
        assert_eq!(config.get("queue-capacity").as_deref(), Some("50000"));
    }

    #[test]
    fn test_invalid_env_override_is_logged() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut config = RuntimeConfig::default();
        tracing::subscriber::with_default(subscriber, || {
            config.apply_env_from(|key| (key == "SHIMJS_QUEUE_CAPACITY").then(|| "abc".to_string()));
        });

        assert_eq!(config.executor.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        let output = log.text();
        assert!(output.contains("WARN"));
        assert!(output.contains("SHIMJS_QUEUE_CAPACITY"));
    }
}
