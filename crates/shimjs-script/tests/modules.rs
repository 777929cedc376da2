// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Running CommonJS modules through the loader

use shimjs_loader::{LoaderError, ModuleLoader, SourceMap};
use shimjs_script::{Interpreter, ScriptError, Value};

fn setup(entries: &[(&str, &str)]) -> (ModuleLoader<Value>, Interpreter) {
    let loader = ModuleLoader::new();
    let mut interpreter = Interpreter::new();
    let mut sources = SourceMap::new();
    for (key, text) in entries {
        sources.insert_str(*key, *text);
    }
    loader.register(&sources, false, &mut interpreter).unwrap();
    (loader, interpreter)
}

#[test]
fn test_exports_reassignment_through_nested_require() {
    let (loader, mut interpreter) = setup(&[
        ("/pkg/index", "module.exports = require('./util').double(21);"),
        ("/pkg/util", "exports.double = function(x){ return x*2; };"),
    ]);

    let answer = loader.require("/pkg/index", &mut interpreter).unwrap();
    assert_eq!(answer.as_number(), Some(42.0));
    assert!(loader.is_loaded("/pkg/util"));
}

#[test]
fn test_module_bindings() {
    let (loader, mut interpreter) = setup(&[(
        "lib/info",
        "exports.id = module.id\n\
         exports.filename = __filename\n\
         exports.dirname = __dirname\n\
         exports.self = this === exports\n\
         exports.same = module.exports === exports\n\
         exports.resolved = require.resolve('../other')",
    )]);

    let info = loader.require("./lib/info", &mut interpreter).unwrap();
    let get = |name: &str| info.get_property(name).unwrap().to_string();
    assert_eq!(get("id"), "/lib/info.js");
    assert_eq!(get("filename"), "lib/info");
    assert_eq!(get("dirname"), "lib");
    assert_eq!(get("self"), "true");
    assert_eq!(get("same"), "true");
    assert_eq!(get("resolved"), "/other.js");
}

#[test]
fn test_module_locals_stay_private() {
    let (loader, mut interpreter) = setup(&[(
        "secret",
        "var hidden = 1; let alsoHidden = 2; function helper() {} exports.ok = true",
    )]);

    loader.require("secret", &mut interpreter).unwrap();
    assert!(interpreter.global("hidden").is_none());
    assert!(interpreter.global("alsoHidden").is_none());
    assert!(interpreter.global("helper").is_none());
    assert!(interpreter.global("exports").is_none());
}

#[test]
fn test_undeclared_assignment_in_module_creates_global() {
    let (loader, mut interpreter) = setup(&[("leaky", "leakedFromModule = 'yes'")]);

    loader.require("leaky", &mut interpreter).unwrap();
    assert_eq!(
        interpreter.global("leakedFromModule").unwrap().to_string(),
        "yes"
    );
}

#[test]
fn test_same_exports_for_every_requirer() {
    let (loader, mut interpreter) = setup(&[
        ("shared/state", "exports.count = 0"),
        ("a", "var s = require('./shared/state'); s.count += 1; exports.state = s"),
        ("b", "var s = require('shared/state.js'); s.count += 1; exports.state = s"),
    ]);

    let a = loader.require("a", &mut interpreter).unwrap();
    let b = loader.require("b", &mut interpreter).unwrap();
    let state_a = a.get_property("state").unwrap();
    let state_b = b.get_property("state").unwrap();

    assert!(state_a.same_reference(&state_b));
    assert_eq!(state_a.get_property("count").unwrap().as_number(), Some(2.0));
}

#[test]
fn test_circular_require_sees_partial_exports() {
    let (loader, mut interpreter) = setup(&[
        ("a", "exports.early = 'a-early'\nvar b = require('./b')\nexports.late = 'a-late'\nexports.fromB = b.sawEarly"),
        ("b", "var a = require('./a')\nexports.sawEarly = a.early\nexports.sawLate = typeof a.late"),
    ]);

    let a = loader.require("a", &mut interpreter).unwrap();
    assert_eq!(a.get_property("fromB").unwrap().to_string(), "a-early");

    let b = loader.require("b", &mut interpreter).unwrap();
    assert_eq!(b.get_property("sawLate").unwrap().to_string(), "undefined");
}

#[test]
fn test_require_of_missing_module_from_script() {
    let (loader, mut interpreter) = setup(&[("/app/main", "require('./nope')")]);

    let err = loader.require("/app/main", &mut interpreter).unwrap_err();
    match err {
        LoaderError::ModuleNotFound { specifier, key, available } => {
            assert_eq!(specifier, "./nope");
            assert_eq!(key, "/app/nope.js");
            assert_eq!(available, vec!["/app/main.js".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!loader.is_loaded("/app/main"));
}

#[test]
fn test_nested_script_error_keeps_its_kind() {
    let (loader, mut interpreter) = setup(&[
        ("outer", "exports.before = 1\nrequire('./inner')"),
        ("inner", "undefinedFunction()"),
    ]);

    let err = loader.require("outer", &mut interpreter).unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: undefinedFunction is not defined");

    let LoaderError::Evaluation(inner) = err else {
        panic!("expected an evaluation failure");
    };
    let script = inner.downcast::<ScriptError>().unwrap();
    assert!(matches!(*script, ScriptError::Reference(_)));
    assert!(!loader.is_loaded("outer"));
    assert!(!loader.is_loaded("inner"));
}

#[test]
fn test_failed_module_retries_on_next_require() {
    let (loader, mut interpreter) = setup(&[("flaky", "attempts = typeof attempts === 'undefined' ? 1 : attempts + 1\nif (attempts < 2) throw 'not yet'\nexports.attempts = attempts")]);

    let err = loader.require("flaky", &mut interpreter).unwrap_err();
    assert_eq!(err.to_string(), "Uncaught not yet");

    let flaky = loader.require("flaky", &mut interpreter).unwrap();
    assert_eq!(flaky.get_property("attempts").unwrap().as_number(), Some(2.0));
}

#[test]
fn test_syntax_error_in_module() {
    let (loader, mut interpreter) = setup(&[("broken", "exports.x = ;")]);

    let err = loader.require("broken", &mut interpreter).unwrap_err();
    assert!(err.to_string().starts_with("SyntaxError:"));
}

#[test]
fn test_require_argument_must_be_a_string() {
    let (loader, mut interpreter) = setup(&[("bad", "require(42)")]);

    let err = loader.require("bad", &mut interpreter).unwrap_err();
    assert!(err.to_string().contains("must be of type string"));
}

#[test]
fn test_global_require_from_eval() {
    let (loader, mut interpreter) = setup(&[("lib/parse-js", "exports.tokenizer = function () { return 'tokens' }")]);
    interpreter.define_global(
        "require",
        Value::Function(std::rc::Rc::new(shimjs_script::Function::require(loader.root_require()))),
    );

    interpreter
        .eval_into_engine(
            "function test() {\n\
             var result = {};\n\
             result.first = require('lib/parse-js.js');\n\
             result.second = result.first.tokenizer;\n\
             return result;\n\
             }",
        )
        .unwrap();

    let result = interpreter.invoke_function("test", &[]).unwrap();
    assert!(!result.get_property("first").unwrap().is_nullish());
    let tokenizer = result.get_property("second").unwrap();
    assert_eq!(
        interpreter.call_function(&tokenizer, Value::Undefined, &[]).unwrap().to_string(),
        "tokens"
    );
}

fn require_chain(length: usize) -> Vec<(String, String)> {
    (0..length)
        .map(|i| {
            let body = if i + 1 == length {
                "module.exports = 0;".to_string()
            } else {
                format!("module.exports = require('./m{}') + 1;", i + 1)
            };
            (format!("/chain/m{i}"), body)
        })
        .collect()
}

#[test]
fn test_long_require_chain_hits_the_call_depth_bound() {
    let chain = require_chain(200);
    let entries: Vec<(&str, &str)> = chain.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let (loader, mut interpreter) = setup(&entries);

    let err = loader.require("/chain/m0", &mut interpreter).unwrap_err();
    assert!(err.to_string().contains("Maximum call stack size exceeded"));
    assert!(loader.cached_keys().is_empty());
}

#[test]
fn test_require_chain_within_the_bound() {
    let chain = require_chain(100);
    let entries: Vec<(&str, &str)> = chain.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let (loader, mut interpreter) = setup(&entries);

    let value = loader.require("/chain/m0", &mut interpreter).unwrap();
    assert_eq!(value.as_number(), Some(99.0));
    assert_eq!(loader.cached_keys().len(), 100);
}
