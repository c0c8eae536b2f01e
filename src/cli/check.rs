use std::path::PathBuf;

use clap::Args;

use hackvm::diagnostic::render_diagnostics;

use super::{exit_with, load_input_or_exit, resolve_options, TranslateFlags};

#[derive(Args)]
pub struct CheckArgs {
    /// Input .vm file or directory of .vm files
    pub input: PathBuf,
    #[command(flatten)]
    pub flags: TranslateFlags,
}

pub fn cmd_check(args: CheckArgs) {
    let input = load_input_or_exit(&args.input);
    let options = resolve_options(&input, &args.flags);

    match input.translate(&options) {
        Ok(program) => {
            render_diagnostics(&program.warnings, &input.sources());
            eprintln!(
                "OK: {} ({} instructions)",
                args.input.display(),
                program.instruction_count()
            );
        }
        Err(e) => exit_with(&e, &input.sources()),
    }
}
