// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! A line-based fake evaluator for loader tests.
//!
//! Each source line is one command:
//!
//! - `set <name> <value>` - set a property on `exports`
//! - `require <specifier>` - require and discard
//! - `hold <specifier>` - require and remember the value
//! - `copy <specifier> <name>` - require and copy one property into `exports`
//! - `replace <text>` - replace `module.exports` with a text value
//! - `fail <message>` - fail the evaluation

#![allow(dead_code)]

use shimjs_loader::{Evaluator, LoaderError, ModuleScope, ModuleSource, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum Fake {
    Container(Rc<RefCell<BTreeMap<String, String>>>),
    Text(Rc<str>),
}

impl Fake {
    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            Fake::Container(props) => props.borrow().get(name).cloned(),
            Fake::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Fake::Text(text) => Some(text),
            Fake::Container(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &Fake) -> bool {
        match (self, other) {
            (Fake::Container(a), Fake::Container(b)) => Rc::ptr_eq(a, b),
            (Fake::Text(a), Fake::Text(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

#[derive(Default)]
pub struct FakeEvaluator {
    /// Module ids in the order their evaluation started
    pub evaluated: Vec<String>,
    /// (module id, specifier, value) for every `hold`
    pub held: Vec<(String, String, Fake)>,
}

impl FakeEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, id: &str) -> usize {
        self.evaluated.iter().filter(|e| e.as_str() == id).count()
    }

    pub fn held_by(&self, id: &str) -> Vec<Fake> {
        self.held
            .iter()
            .filter(|(module, _, _)| module == id)
            .map(|(_, _, value)| value.clone())
            .collect()
    }
}

impl Evaluator<Fake> for FakeEvaluator {
    fn new_exports(&mut self) -> Fake {
        Fake::Container(Rc::new(RefCell::new(BTreeMap::new())))
    }

    fn same_exports(&self, a: &Fake, b: &Fake) -> bool {
        a.ptr_eq(b)
    }

    fn evaluate(&mut self, source: &str, scope: &mut ModuleScope<Fake>) -> Result<()> {
        self.evaluated.push(scope.module.id.clone());

        for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut parts = line.splitn(3, ' ');
            let command = parts.next().unwrap_or_default();
            let first = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default();

            match command {
                "set" => {
                    if let Fake::Container(props) = &scope.exports {
                        props.borrow_mut().insert(first.to_string(), rest.to_string());
                    }
                }
                "require" => {
                    scope.require.call(self, first)?;
                }
                "hold" => {
                    let value = scope.require.call(self, first)?;
                    self.held
                        .push((scope.module.id.clone(), first.to_string(), value));
                }
                "copy" => {
                    let value = scope.require.call(self, first)?;
                    if let (Some(found), Fake::Container(props)) = (value.get(rest), &scope.exports) {
                        props.borrow_mut().insert(rest.to_string(), found);
                    }
                }
                "replace" => {
                    let text = if rest.is_empty() {
                        first.to_string()
                    } else {
                        format!("{} {}", first, rest)
                    };
                    scope.module.exports = Fake::Text(text.into());
                }
                "fail" => {
                    return Err(LoaderError::evaluation(FakeError(first.to_string())));
                }
                other => {
                    return Err(LoaderError::evaluation(FakeError(format!(
                        "unknown command '{}'",
                        other
                    ))));
                }
            }
        }
        Ok(())
    }
}

/// In-memory source that counts how often it is read
#[derive(Clone)]
pub struct CountingSource {
    text: String,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ModuleSource for CountingSource {
    fn read(&self) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}
