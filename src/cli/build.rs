use std::path::PathBuf;

use clap::Args;

use hackvm::diagnostic::render_diagnostics;
use hackvm::pipeline::build;

use super::{exit_with, load_input_or_exit, resolve_options, short_hash, TranslateFlags};

#[derive(Args)]
pub struct BuildArgs {
    /// Input .vm file or directory of .vm files
    pub input: PathBuf,
    /// Output .asm file (default: <input>.asm, or <dir>/<dir>.asm)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Print the full BLAKE3 digest of the output
    #[arg(long)]
    pub full: bool,
    #[command(flatten)]
    pub flags: TranslateFlags,
}

pub fn cmd_build(args: BuildArgs) {
    let input = load_input_or_exit(&args.input);
    let options = resolve_options(&input, &args.flags);

    let (program, out_path) = match build(&input, args.output.as_deref(), &options) {
        Ok(result) => result,
        Err(e) => exit_with(&e, &input.sources()),
    };
    render_diagnostics(&program.warnings, &input.sources());

    let digest = program.digest().to_hex();
    eprintln!("Translated -> {}", out_path.display());
    eprintln!(
        "  {} file(s), {} instructions, blake3 {}",
        input.units.len(),
        program.instruction_count(),
        if args.full {
            digest.as_str()
        } else {
            short_hash(digest.as_str())
        }
    );
}
