// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS require() handle

use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::loader::ModuleLoader;
use std::fmt;

/// A `require` function bound to one directory.
///
/// Every module gets its own handle so nested relative specifiers resolve
/// against the module's location, whoever required it.
pub struct Require<V> {
    loader: ModuleLoader<V>,
    directory: String,
}

impl<V: Clone> Require<V> {
    pub(crate) fn new(loader: ModuleLoader<V>, directory: String) -> Self {
        Self { loader, directory }
    }

    /// require(specifier)
    pub fn call(&self, evaluator: &mut dyn Evaluator<V>, specifier: &str) -> Result<V> {
        self.loader.require_from(&self.directory, specifier, evaluator)
    }
}

impl<V> Require<V> {
    /// require.resolve(specifier) - the module key without loading anything
    pub fn resolve(&self, specifier: &str) -> String {
        self.loader.resolve(&self.directory, specifier)
    }

    /// The directory this handle resolves against
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// The loader behind this handle
    pub fn loader(&self) -> &ModuleLoader<V> {
        &self.loader
    }

    /// Whether two handles share a loader and a directory
    pub fn same_binding(&self, other: &Self) -> bool {
        self.loader.ptr_eq(&other.loader) && self.directory == other.directory
    }
}

impl<V> Clone for Require<V> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            directory: self.directory.clone(),
        }
    }
}

impl<V> fmt::Debug for Require<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Require")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
