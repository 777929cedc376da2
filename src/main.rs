// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! shimjs - register a tree of CommonJS modules and run code against it
//!
//! ```text
//! shimjs ./lib --main ./index        # require a module and print its exports
//! shimjs ./lib -e "require('./x').y" # evaluate code with require available
//! shimjs ./lib --list                # print registered module keys
//! shimjs ./lib                       # interactive REPL
//! ```

mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use shimjs_loader::SourceMap;
use shimjs_runtime::{RuntimeConfig, ScriptContext, ScriptExecutor};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::repl::Repl;

const LOG_TARGETS: [&str; 4] = ["shimjs", "shimjs_loader", "shimjs_script", "shimjs_runtime"];

#[derive(Parser)]
#[command(
    name = "shimjs",
    about = "Lazy CommonJS module loader with a bundled script engine",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Directory whose modules are registered, keyed by relative path
    root: Option<PathBuf>,

    /// Require a module from the root and print its exports
    #[arg(short = 'm', long = "main", value_name = "SPECIFIER")]
    main: Option<String>,

    /// Evaluate code with require available
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    eval: Option<String>,

    /// Print every registered module key
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Start the REPL
    #[arg(
        short = 'i',
        long = "interactive",
        alias = "repl",
        conflicts_with_all = ["main", "eval", "list"]
    )]
    interactive: bool,

    /// Evaluate every module as soon as it is registered
    #[arg(long, overrides_with = "no_preload")]
    preload: bool,

    /// Evaluate modules only when first required
    #[arg(long = "no-preload", overrides_with = "preload")]
    no_preload: bool,

    /// Configuration file (defaults to ./shimjs.toml when present)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn starts_repl(&self) -> bool {
        self.interactive || (self.main.is_none() && self.eval.is_none() && !self.list)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {:#}", "Error".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let directives = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        RuntimeConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if cli.preload {
        config.loader.preload = true;
    }
    if cli.no_preload {
        config.loader.preload = false;
    }

    let sources = match &cli.root {
        Some(root) => SourceMap::from_directory(root, &config.loader.extension)
            .with_context(|| format!("failed to collect modules under {}", root.display()))?,
        None => SourceMap::new(),
    };
    info!(modules = sources.len(), preload = config.loader.preload, "collected module sources");

    if cli.starts_repl() {
        let mut context = ScriptContext::with_config(&config);
        context.load_with_require(&sources)?;
        let mut repl = Repl::new(context)?;
        repl.run()?;
        return Ok(());
    }

    let executor = ScriptExecutor::new(&config)?;
    executor.submit_load(sources)?.await?;

    if cli.list {
        let keys = executor
            .submit(|context| Ok(context.loader().registered_keys()))?
            .await?;
        for key in keys {
            println!("{key}");
        }
    }

    if let Some(specifier) = cli.main {
        let exports = executor
            .submit(move |context| Ok(context.require(&specifier)?.inspect()))?
            .await?;
        println!("{exports}");
    }

    if let Some(code) = cli.eval {
        let shown = executor
            .submit(move |context| {
                let value = context.eval_into_engine(&code)?;
                Ok((!value.is_undefined()).then(|| value.inspect()))
            })?
            .await?;
        if let Some(shown) = shown {
            println!("{shown}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_action_starts_repl() {
        let cli = Cli::parse_from(["shimjs", "lib"]);
        assert!(cli.starts_repl());
        assert_eq!(cli.root, Some(PathBuf::from("lib")));

        let cli = Cli::parse_from(["shimjs", "lib", "--main", "./index"]);
        assert!(!cli.starts_repl());
    }

    #[test]
    fn test_interactive_conflicts_with_actions() {
        assert!(Cli::try_parse_from(["shimjs", "-i", "-e", "1"]).is_err());
    }

    #[test]
    fn test_preload_flags_override_each_other() {
        let cli = Cli::parse_from(["shimjs", "--preload", "--no-preload"]);
        assert!(cli.no_preload);
        assert!(!cli.preload);
    }
}
