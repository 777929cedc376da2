// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL over a [`ScriptContext`].
//!
//! Input is evaluated in the global scope, so definitions persist between
//! lines. `require` resolves against the modules registered at startup and
//! any directory added with `.load`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use shimjs_loader::SourceMap;
use shimjs_runtime::ScriptContext;
use shimjs_script::Value;
use tracing::debug;

const HISTORY_FILE: &str = ".shimjs_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// Words the helper completes and highlights
const KEYWORDS: &[&str] = &[
    "const", "else", "false", "function", "if", "let", "null", "return", "this", "throw", "true",
    "typeof", "var",
];

const GLOBALS: &[&str] = &[
    "Infinity", "NaN", "__dirname", "__filename", "exports", "module", "print", "require",
    "undefined",
];

/// Dot-prefixed REPL commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Modules,
    Loaded,
    Load,
}

impl ReplCommand {
    /// Parse `.command [argument]`
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
            None => (rest, None),
        };

        let command = match name.to_lowercase().as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "clear" | "cls" => ReplCommand::Clear,
            "modules" | "m" => ReplCommand::Modules,
            "loaded" => ReplCommand::Loaded,
            "load" | "l" => ReplCommand::Load,
            _ => return None,
        };
        Some((command, arg))
    }

    fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".modules", "List registered module keys"),
            (".loaded", "List modules that have been evaluated"),
            (".load <dir>", "Register every module under a directory"),
        ]
    }
}

struct ReplHelper;

impl ReplHelper {
    fn words() -> impl Iterator<Item = &'static str> {
        KEYWORDS.iter().chain(GLOBALS).copied()
    }
}

/// Start of the identifier that ends at `pos`
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '$')
        .map_or(0, |i| i + 1)
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let word = &line[start..pos];
        if word.is_empty() {
            return Ok((pos, Vec::new()));
        }

        let candidates = Self::words()
            .filter(|candidate| candidate.starts_with(word))
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }
        Self::words()
            .find(|candidate| candidate.len() > word.len() && candidate.starts_with(word))
            .map(|candidate| completion_hint(candidate, word))
    }
}

/// Dimmed remainder of `candidate` after the typed `word`
fn completion_hint(candidate: &str, word: &str) -> String {
    (&candidate[word.len()..]).dimmed().to_string()
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('.') {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut word = String::new();
        for c in line.chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                continue;
            }
            flush_word(&mut result, &mut word);
            match c {
                '(' | ')' | '[' | ']' | '{' | '}' => result.push_str(&c.yellow().to_string()),
                '"' | '\'' => result.push_str(&c.green().to_string()),
                _ => result.push(c),
            }
        }
        flush_word(&mut result, &mut word);
        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn flush_word(result: &mut String, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let styled = if KEYWORDS.contains(&word.as_str()) {
        word.magenta().bold().to_string()
    } else if GLOBALS.contains(&word.as_str()) {
        word.cyan().to_string()
    } else if word.starts_with(|c: char| c.is_ascii_digit()) {
        word.yellow().to_string()
    } else {
        word.clone()
    };
    result.push_str(&styled);
    word.clear();
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim_start().starts_with('.') {
            return Ok(ValidationResult::Valid(None));
        }
        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }
        let continues = ['\\', '+', '-', '*', '/', '=', ',', '?', ':', '&', '|'];
        if input.trim_end().ends_with(continues) {
            return Ok(ValidationResult::Incomplete);
        }
        Ok(ValidationResult::Valid(None))
    }
}

/// Whether brackets and quotes in `input` are closed.
///
/// A stray closing bracket counts as balanced; the parser reports it.
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut quote = None;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(_) if c == '\\' => escaped = true,
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                '{' => stack.push('}'),
                ')' | ']' | '}' => {
                    if stack.pop() != Some(c) {
                        return true;
                    }
                }
                _ => {}
            },
        }
    }

    stack.is_empty() && quote.is_none()
}

impl Helper for ReplHelper {}

enum Flow {
    Continue,
    Exit,
}

/// The interactive shell
pub struct Repl {
    context: ScriptContext,
    editor: Editor<ReplHelper, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a REPL over an already loaded context
    pub fn new(context: ScriptContext) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ReplHelper));

        let history_path = dirs::home_dir().map(|home| home.join(HISTORY_FILE));
        if let Some(path) = &history_path {
            if let Err(err) = editor.load_history(path) {
                debug!(%err, path = %path.display(), "no REPL history loaded");
            }
        }

        Ok(Self {
            context,
            editor,
            history_path,
        })
    }

    /// Read and evaluate lines until `.exit` or end of input
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "shimjs>".bright_green().bold());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    if let Some((command, arg)) = ReplCommand::parse(input) {
                        match self.execute_command(command, arg) {
                            Flow::Continue => continue,
                            Flow::Exit => break,
                        }
                    }
                    self.eval_and_print(input);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        if let Some(path) = &self.history_path {
            if let Err(err) = self.editor.save_history(path) {
                debug!(%err, path = %path.display(), "failed to save REPL history");
            }
        }
        Ok(())
    }

    fn print_banner(&self) {
        println!(
            "{} {} ({} modules registered)",
            "shimjs".cyan().bold(),
            env!("CARGO_PKG_VERSION").yellow(),
            self.context.loader().len()
        );
        println!("Type {} for help, {} to exit", ".help".green(), ".exit".green());
        println!();
    }

    fn execute_command(&mut self, command: ReplCommand, arg: Option<&str>) -> Flow {
        match command {
            ReplCommand::Help => {
                println!();
                for (name, description) in ReplCommand::all_commands() {
                    println!("  {:16} {}", name.cyan(), description.dimmed());
                }
                println!();
            }
            ReplCommand::Exit => return Flow::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Modules => print_keys(&self.context.loader().registered_keys()),
            ReplCommand::Loaded => print_keys(&self.context.loader().cached_keys()),
            ReplCommand::Load => match arg {
                Some(dir) => self.load_directory(Path::new(dir)),
                None => eprintln!("{}: {} requires a directory", "Error".red().bold(), ".load".cyan()),
            },
        }
        Flow::Continue
    }

    fn load_directory(&mut self, dir: &Path) {
        let extension = self.context.loader().config().extension.clone();
        let sources = match SourceMap::from_directory(dir, &extension) {
            Ok(sources) => sources,
            Err(err) => {
                print_error(&err);
                return;
            }
        };
        let count = sources.len();
        match self.context.load_with_require(&sources) {
            Ok(()) => println!("{}", format!("registered {count} modules").dimmed()),
            Err(err) => print_error(&err),
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.context.eval_into_engine(input) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(err) => print_error(&err),
        }
    }
}

fn print_keys(keys: &[String]) {
    if keys.is_empty() {
        println!("{}", "(none)".dimmed());
    }
    for key in keys {
        println!("  {key}");
    }
}

fn format_value(value: &Value) -> String {
    let text = value.inspect();
    match value {
        Value::Undefined | Value::Null => text.dimmed().to_string(),
        Value::Boolean(_) | Value::Number(_) => text.yellow().to_string(),
        Value::String(_) => text.green().to_string(),
        Value::Function(_) => text.magenta().to_string(),
        Value::Object(_) | Value::Array(_) => text,
    }
}

/// Print an error, colouring its `Kind:` prefix
fn print_error(error: &dyn std::error::Error) {
    let message = error.to_string();
    match message.split_once(':') {
        Some((kind, rest)) if !kind.contains(' ') => eprintln!("{}:{}", kind.red().bold(), rest),
        _ => eprintln!("{}", message.red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert_eq!(ReplCommand::parse(".help"), Some((ReplCommand::Help, None)));
        assert_eq!(ReplCommand::parse(".q"), Some((ReplCommand::Exit, None)));
        assert_eq!(
            ReplCommand::parse(".load  lib/vendor "),
            Some((ReplCommand::Load, Some("lib/vendor")))
        );
        assert_eq!(ReplCommand::parse(".unknown"), None);
        assert_eq!(ReplCommand::parse("require('./a')"), None);
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("require('./a').run({ x: [1, 2] })"));
        assert!(is_balanced("'unclosed ( inside a string'"));
        assert!(is_balanced("'escaped \\' quote'"));
        assert!(!is_balanced("function () {"));
        assert!(!is_balanced("print('hi"));
    }

    #[test]
    fn test_completion_hint_is_the_remainder() {
        let hint = completion_hint("require", "req");
        assert!(hint.contains("uire"));
        assert!(!hint.contains("req"));
    }

    #[test]
    fn test_word_start() {
        assert_eq!(word_start("x = req", 7), 4);
        assert_eq!(word_start("module.exp", 10), 7);
        assert_eq!(word_start("", 0), 0);
    }
}
