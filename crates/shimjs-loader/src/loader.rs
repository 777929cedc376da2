// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - owns the registry and the cache

use crate::cache::{CachedModule, ModuleCache};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::evaluator::{Evaluator, Module, ModuleScope};
use crate::require::Require;
use crate::resolver::ModuleResolver;
use crate::source::{ModuleSource, SourceMap};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// A registered source entry
#[derive(Clone)]
struct RegisteredModule {
    /// Canonical module key
    key: String,
    /// Registration key
    name: String,
    /// Directory nested requires resolve against
    directory: String,
    source: Arc<dyn ModuleSource>,
}

/// Known modules in registration order
#[derive(Default)]
struct Registry {
    entries: Vec<RegisteredModule>,
    index: FxHashMap<String, usize>,
}

impl Registry {
    fn get(&self, key: &str) -> Option<&RegisteredModule> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    fn insert(&mut self, module: RegisteredModule) {
        self.index.insert(module.key.clone(), self.entries.len());
        self.entries.push(module);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|module| module.key.clone()).collect()
    }
}

struct LoaderState<V> {
    config: LoaderConfig,
    resolver: ModuleResolver,
    registry: RefCell<Registry>,
    cache: ModuleCache<V>,
}

/// Module loader.
///
/// A cheap handle over single-threaded shared state; clones see the same
/// registry and cache. Every module is evaluated at most once per loader.
pub struct ModuleLoader<V> {
    state: Rc<LoaderState<V>>,
}

impl<V: Clone> ModuleLoader<V> {
    /// Create a loader with the default configuration
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    /// Create a loader with `config`
    pub fn with_config(config: LoaderConfig) -> Self {
        let resolver = ModuleResolver::new(&config.extension).with_strategy(config.key_strategy);
        Self {
            state: Rc::new(LoaderState {
                config,
                resolver,
                registry: RefCell::new(Registry::default()),
                cache: ModuleCache::new(),
            }),
        }
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.state.config
    }

    /// Key resolver
    pub fn resolver(&self) -> &ModuleResolver {
        &self.state.resolver
    }

    /// Register `sources`, then require each of them in order if
    /// `eval_immediately` is set.
    pub fn register(
        &self,
        sources: &SourceMap,
        eval_immediately: bool,
        evaluator: &mut dyn Evaluator<V>,
    ) -> Result<()> {
        self.add_sources(sources)?;
        if eval_immediately {
            self.preload(sources, evaluator)?;
        }
        Ok(())
    }

    /// Register `sources` without evaluating anything.
    ///
    /// The batch is checked as a whole first: on a collision nothing from it
    /// is registered.
    pub fn add_sources(&self, sources: &SourceMap) -> Result<()> {
        let resolver = &self.state.resolver;
        let mut registry = self.state.registry.borrow_mut();
        let mut batch: FxHashMap<String, &str> = FxHashMap::default();
        let mut pending = Vec::with_capacity(sources.len());

        for entry in sources {
            let key = resolver.registration_key(&entry.key);

            if let Some(existing) = registry.get(&key) {
                return Err(LoaderError::RegistrationCollision {
                    first: existing.name.clone(),
                    second: entry.key.clone(),
                    key,
                });
            }
            if let Some(first) = batch.insert(key.clone(), entry.key.as_str()) {
                return Err(LoaderError::RegistrationCollision {
                    first: first.to_string(),
                    second: entry.key.clone(),
                    key,
                });
            }

            pending.push(RegisteredModule {
                directory: resolver.directory_of(&entry.key),
                name: entry.key.clone(),
                key,
                source: Arc::clone(&entry.source),
            });
        }

        for module in pending {
            trace!(module = %module.key, filename = %module.name, "registered");
            registry.insert(module);
        }
        debug!(
            added = sources.len(),
            total = registry.entries.len(),
            "registered module sources"
        );
        Ok(())
    }

    /// Require every entry of `sources` from the root, in order
    pub fn preload(&self, sources: &SourceMap, evaluator: &mut dyn Evaluator<V>) -> Result<()> {
        for entry in sources {
            self.require(&entry.key, evaluator)?;
        }
        debug!(modules = sources.len(), "preloaded modules");
        Ok(())
    }

    /// require() from the root directory
    pub fn require(&self, specifier: &str, evaluator: &mut dyn Evaluator<V>) -> Result<V> {
        self.require_from("", specifier, evaluator)
    }

    /// require() as seen from `directory`
    pub fn require_from(
        &self,
        directory: &str,
        specifier: &str,
        evaluator: &mut dyn Evaluator<V>,
    ) -> Result<V> {
        let key = self.state.resolver.specifier_key(directory, specifier);

        if let Some(cached) = self.state.cache.get(&key) {
            if cached.loaded {
                trace!(module = %key, specifier, "cache hit");
            } else {
                debug!(module = %key, specifier, "circular require, returning partial exports");
            }
            return Ok(cached.exports);
        }

        let module = {
            let registry = self.state.registry.borrow();
            match registry.get(&key) {
                Some(module) => module.clone(),
                None => {
                    return Err(LoaderError::ModuleNotFound {
                        specifier: specifier.to_string(),
                        key,
                        available: registry.keys(),
                    });
                }
            }
        };

        self.evaluate(module, evaluator)
    }

    /// A require handle bound to the root directory
    pub fn root_require(&self) -> Require<V> {
        Require::new(self.clone(), String::new())
    }

    /// Registered module keys, in registration order
    pub fn registered_keys(&self) -> Vec<String> {
        self.state.registry.borrow().keys()
    }

    /// Whether `specifier` (from the root) names a registered module
    pub fn is_registered(&self, specifier: &str) -> bool {
        let key = self.resolve("", specifier);
        self.state.registry.borrow().get(&key).is_some()
    }

    /// Keys of evaluated modules, sorted
    pub fn cached_keys(&self) -> Vec<String> {
        self.state.cache.loaded_keys()
    }

    /// Whether `specifier` (from the root) has finished evaluating
    pub fn is_loaded(&self, specifier: &str) -> bool {
        let key = self.resolve("", specifier);
        self.state.cache.get(&key).is_some_and(|module| module.loaded)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.state.registry.borrow().entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate a registered module and cache its exports
    fn evaluate(&self, module: RegisteredModule, evaluator: &mut dyn Evaluator<V>) -> Result<V> {
        let key = module.key.clone();
        debug!(module = %key, filename = %module.name, "evaluating module");

        let exports = evaluator.new_exports();
        self.state.cache.set(
            key.clone(),
            CachedModule {
                exports: exports.clone(),
                key: key.clone(),
                filename: module.name.clone(),
                loaded: false,
            },
        );

        let source = match module.source.read() {
            Ok(source) => source,
            Err(err) => {
                self.state.cache.delete(&key);
                return Err(LoaderError::SourceRead { key, source: err });
            }
        };

        let mut scope = ModuleScope {
            require: Require::new(self.clone(), module.directory.clone()),
            module: Module {
                id: key.clone(),
                filename: module.name.clone(),
                exports: exports.clone(),
            },
            exports: exports.clone(),
        };

        if let Err(err) = evaluator.evaluate(&source, &mut scope) {
            self.state.cache.delete(&key);
            debug!(module = %key, error = %err, "module evaluation failed");
            return Err(err);
        }

        let exports = if evaluator.same_exports(&scope.module.exports, &exports) {
            exports
        } else {
            // Holders of the original container keep the stale value
            debug!(module = %key, "module.exports was reassigned");
            scope.module.exports
        };

        self.state.cache.set(
            key.clone(),
            CachedModule {
                exports: exports.clone(),
                key,
                filename: module.name,
                loaded: true,
            },
        );
        Ok(exports)
    }
}

impl<V> ModuleLoader<V> {
    /// Module key for `specifier` required from `directory`
    pub fn resolve(&self, directory: &str, specifier: &str) -> String {
        self.state.resolver.specifier_key(directory, specifier)
    }

    /// Whether two handles share the same loader state
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<V> Clone for ModuleLoader<V> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<V: Clone> Default for ModuleLoader<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ModuleLoader<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("config", &self.state.config)
            .field("registered", &self.state.registry.borrow().entries.len())
            .finish_non_exhaustive()
    }
}
