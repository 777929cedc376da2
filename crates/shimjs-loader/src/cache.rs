// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Cached module entry
#[derive(Debug, Clone)]
pub struct CachedModule<V> {
    /// The module's exports
    pub exports: V,
    /// Canonical module key
    pub key: String,
    /// Registration key the module was registered under
    pub filename: String,
    /// Whether the module has finished evaluating
    pub loaded: bool,
}

/// Single-threaded module cache.
///
/// Holds a partial entry (`loaded == false`) while a module is evaluating so
/// that circular requires see its current exports container.
pub struct ModuleCache<V> {
    /// Cache mapping canonical keys to cached modules
    cache: RefCell<FxHashMap<String, CachedModule<V>>>,
}

impl<V: Clone> ModuleCache<V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Get a cached module by key
    pub fn get(&self, key: &str) -> Option<CachedModule<V>> {
        self.cache.borrow().get(key).cloned()
    }

    /// Check if a module is cached, loaded or not
    pub fn has(&self, key: &str) -> bool {
        self.cache.borrow().contains_key(key)
    }

    /// Add or replace a module
    pub fn set(&self, key: String, module: CachedModule<V>) {
        self.cache.borrow_mut().insert(key, module);
    }

    /// Remove a module
    pub fn delete(&self, key: &str) -> Option<CachedModule<V>> {
        self.cache.borrow_mut().remove(key)
    }

    /// Keys of fully evaluated modules, sorted
    pub fn loaded_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cache
            .borrow()
            .values()
            .filter(|module| module.loaded)
            .map(|module| module.key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<V: Clone> Default for ModuleCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
