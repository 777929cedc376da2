// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration file tests

use std::fs;

use shimjs_loader::KeyStrategy;
use shimjs_runtime::{RuntimeConfig, RuntimeError, ScriptContext};
use tempfile::TempDir;

#[test]
fn test_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shimjs.toml");
    fs::write(
        &path,
        r#"
[loader]
extension = "mjs"
key-strategy = "file-name"
preload = true

[script]
max-call-depth = 40

[executor]
thread-name = "worker"
"#,
    )
    .unwrap();

    let config = RuntimeConfig::from_file(&path).unwrap();
    assert_eq!(config.loader.extension, "mjs");
    assert_eq!(config.loader.key_strategy, KeyStrategy::FileName);
    assert!(config.loader.preload);
    assert_eq!(config.script.max_call_depth, 40);
    assert_eq!(config.executor.thread_name, "worker");
    assert_eq!(config.executor.queue_capacity, 50_000);
}

#[test]
fn test_invalid_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[loader]\npreload = \"sometimes\"\n").unwrap();

    let err = RuntimeConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, RuntimeError::Config { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = RuntimeConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, RuntimeError::Io(_)));
}

#[test]
fn test_config_reaches_the_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shimjs.toml");
    fs::write(&path, "[loader]\nextension = \"mjs\"\n\n[script]\nmax-call-depth = 8\n").unwrap();
    let config = RuntimeConfig::from_file(&path).unwrap();

    let mut context = ScriptContext::with_config(&config);
    let mut sources = shimjs_loader::SourceMap::new();
    sources.insert_str("/deep", "exports.down = function down(n) { return n == 0 ? 0 : down(n - 1); };");
    context.load_with_require(&sources).unwrap();

    assert_eq!(context.loader().registered_keys(), vec!["/deep.mjs"]);
    let err = context.eval("require('./deep').down(20)").unwrap_err();
    assert!(err.to_string().contains("Maximum call stack size exceeded"));
    assert_eq!(context.eval("require('./deep').down(3)").unwrap().as_number(), Some(0.0));
}
