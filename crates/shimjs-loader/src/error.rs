// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors raised while registering or requiring modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Two registration keys canonicalize to the same module key
    #[error("Collision, '{first}' and '{second}' both register module '{key}'")]
    RegistrationCollision {
        /// The shared canonical key
        key: String,
        /// Registration key that claimed the module first
        first: String,
        /// Registration key that collided with it
        second: String,
    },

    /// A resolved module key has no registry entry
    #[error(
        "Cannot find module '{specifier}' (resolved to '{key}'), available: [{}]",
        available.join(", ")
    )]
    ModuleNotFound {
        /// Specifier as passed to require()
        specifier: String,
        /// Canonical key computed from the specifier
        key: String,
        /// Every canonical key registered when the lookup failed
        available: Vec<String>,
    },

    /// The source entry could not produce its text
    #[error("Failed to read source of module '{key}': {source}")]
    SourceRead {
        /// Canonical key of the module
        key: String,
        /// Underlying read failure
        #[source]
        source: std::io::Error,
    },

    /// Failure raised by the evaluator while running a module body
    #[error(transparent)]
    Evaluation(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl LoaderError {
    /// Wrap an evaluator failure without reinterpreting it
    pub fn evaluation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Evaluation(Box::new(err))
    }

    /// Returns true for a missing-module failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound { .. })
    }
}
