pub mod build;
pub mod check;
pub mod run;

use std::path::Path;
use std::process;

use clap::Args;

use hackvm::diagnostic::Diagnostic;
use hackvm::pipeline::{load_input, Input};
use hackvm::span::SourceMap;
use hackvm::TranslateOptions;

/// Translation flags shared by `build`, `check` and `run`.
#[derive(Args, Clone, Debug, Default)]
pub struct TranslateFlags {
    /// Emit the bootstrap sequence (default: only for directory input)
    #[arg(long, overrides_with = "no_bootstrap")]
    pub bootstrap: bool,
    /// Never emit the bootstrap sequence
    #[arg(long, overrides_with = "bootstrap")]
    pub no_bootstrap: bool,
    /// Function the bootstrap sequence calls (default: Sys.init)
    #[arg(long, value_name = "NAME")]
    pub entry: Option<String>,
    /// Initial stack pointer set by the bootstrap sequence (default: 256)
    #[arg(long, value_name = "ADDR")]
    pub stack_base: Option<u16>,
}

/// Load an input path, exiting on error.
pub fn load_input_or_exit(path: &Path) -> Input {
    match load_input(path) {
        Ok(input) => input,
        Err(e) => exit_with(&e, &SourceMap::new()),
    }
}

/// Defaults, then the project file, then command-line flags.
pub fn resolve_options(input: &Input, flags: &TranslateFlags) -> TranslateOptions {
    let mut options = TranslateOptions::default();
    if let Some(project) = &input.project {
        options = options.with_project(project);
    }
    if flags.bootstrap {
        options.bootstrap = Some(true);
    } else if flags.no_bootstrap {
        options.bootstrap = Some(false);
    }
    if let Some(entry) = &flags.entry {
        options.entry = entry.clone();
    }
    if let Some(base) = flags.stack_base {
        options.stack_base = base;
    }
    options
}

/// Render a diagnostic and exit with status 1.
pub fn exit_with(diagnostic: &Diagnostic, sources: &SourceMap) -> ! {
    diagnostic.render(sources);
    process::exit(1);
}

/// Truncate a hash string to a short prefix for display.
pub fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(16)]
}
