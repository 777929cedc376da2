// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the runtime

use std::path::PathBuf;

use shimjs_loader::LoaderError;
use shimjs_script::ScriptError;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by script contexts, the executor and configuration loading
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Registration or require failure
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Script evaluation failure outside of a module
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Malformed configuration file
    #[error("Invalid configuration in {path}: {source}")]
    Config {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor queue has no room for another job
    #[error("Executor queue is full ({capacity} pending jobs)")]
    QueueFull {
        /// Configured queue capacity
        capacity: usize,
    },

    /// The executor worker has stopped accepting jobs
    #[error("Script executor has shut down")]
    ExecutorClosed,

    /// A job ended without producing a result
    #[error("Script job aborted before completing")]
    JobAborted,
}

impl RuntimeError {
    /// Whether this error comes from a require of an unregistered module
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::Loader(err) if err.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_errors_are_transparent() {
        let err = RuntimeError::from(LoaderError::ModuleNotFound {
            specifier: "./missing".to_string(),
            key: "/missing.js".to_string(),
            available: vec![],
        });
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/missing.js"));
    }

    #[test]
    fn test_queue_full_message() {
        let err = RuntimeError::QueueFull { capacity: 8 };
        assert_eq!(err.to_string(), "Executor queue is full (8 pending jobs)");
    }
}
