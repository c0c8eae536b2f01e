use clap::{Parser, Subcommand};

mod cli;

use cli::build::{cmd_build, BuildArgs};
use cli::check::{cmd_check, CheckArgs};
use cli::run::{cmd_run, RunArgs};

#[derive(Parser)]
#[command(
    name = "hackvm",
    version,
    about = "Translate stack VM code to Hack assembly"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a .vm file (or a directory of .vm files) to Hack assembly
    Build(BuildArgs),
    /// Parse and translate without writing output
    Check(CheckArgs),
    /// Execute a program on the reference Hack machine
    Run(RunArgs),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Check(args) => cmd_check(args),
        Command::Run(args) => cmd_run(args),
    }
}
