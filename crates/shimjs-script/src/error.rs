// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script error types

use shimjs_loader::LoaderError;
use thiserror::Error;

/// Result type for script operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors raised while parsing or running a script
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Source text could not be parsed
    #[error("SyntaxError: {message} (line {line}, column {column})")]
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Unresolvable identifier
    #[error("ReferenceError: {0}")]
    Reference(String),

    /// Operation on a value of the wrong type
    #[error("TypeError: {0}")]
    Type(String),

    /// Value out of range, including call stack exhaustion
    #[error("RangeError: {0}")]
    Range(String),

    /// A `throw` statement reached the host
    #[error("Uncaught {0}")]
    Thrown(String),

    /// A require() failed outside any script code
    #[error(transparent)]
    Loader(LoaderError),
}

impl ScriptError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub(crate) fn not_defined(name: &str) -> Self {
        Self::Reference(format!("{} is not defined", name))
    }

    /// Convert into a loader error for the module boundary.
    ///
    /// Loader failures pass through as they are; anything else becomes an
    /// evaluation failure.
    pub fn into_loader_error(self) -> LoaderError {
        match self {
            ScriptError::Loader(err) => err,
            other => LoaderError::evaluation(other),
        }
    }
}

impl From<LoaderError> for ScriptError {
    fn from(err: LoaderError) -> Self {
        match err {
            // Script failures of nested modules surface as themselves
            LoaderError::Evaluation(inner) => match inner.downcast::<ScriptError>() {
                Ok(script) => *script,
                Err(other) => ScriptError::Loader(LoaderError::Evaluation(other)),
            },
            other => ScriptError::Loader(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_failure_round_trips_through_loader_error() {
        let err = ScriptError::Type("x is not a function".into()).into_loader_error();
        assert!(matches!(err, LoaderError::Evaluation(_)));
        assert_eq!(err.to_string(), "TypeError: x is not a function");

        let back = ScriptError::from(err);
        assert!(matches!(back, ScriptError::Type(ref message) if message == "x is not a function"));
    }

    #[test]
    fn test_loader_failure_passes_through() {
        let missing = LoaderError::ModuleNotFound {
            specifier: "./a".into(),
            key: "/a.js".into(),
            available: vec![],
        };
        let err = ScriptError::from(missing);
        assert!(matches!(err, ScriptError::Loader(LoaderError::ModuleNotFound { .. })));
        assert!(err.into_loader_error().is_not_found());
    }
}
