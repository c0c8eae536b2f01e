use std::path::{Path, PathBuf};

use clap::Args;

use hackvm::asm::{parse_listing, Asm};
use hackvm::diagnostic::render_diagnostics;
use hackvm::runtime::{Halt, Machine};

use super::{exit_with, load_input_or_exit, resolve_options, TranslateFlags};

#[derive(Args)]
pub struct RunArgs {
    /// Input .asm listing, .vm file or directory of .vm files
    pub input: PathBuf,
    /// Maximum number of instructions to execute
    #[arg(long, default_value_t = 1_000_000)]
    pub steps: u64,
    /// RAM presets applied before running (comma-separated ADDR=VALUE)
    #[arg(long, value_delimiter = ',', value_parser = parse_ram_preset)]
    pub ram: Vec<(u16, i16)>,
    /// Print RAM[ADDR] after the run (repeatable)
    #[arg(long = "show", value_name = "ADDR")]
    pub show: Vec<u16>,
    #[command(flatten)]
    pub flags: TranslateFlags,
}

fn parse_ram_preset(s: &str) -> Result<(u16, i16), String> {
    let (addr, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got '{}'", s))?;
    let addr: u16 = addr
        .trim()
        .parse()
        .map_err(|_| format!("invalid address '{}'", addr))?;
    if addr >= 0x8000 {
        return Err(format!("address {} out of range", addr));
    }
    let value: i16 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value '{}'", value))?;
    Ok((addr, value))
}

fn load_program(path: &Path, flags: &TranslateFlags) -> Vec<Asm> {
    if path.extension().is_some_and(|e| e == "asm") {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        return match parse_listing(&text) {
            Ok(lines) => lines,
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e.0);
                std::process::exit(1);
            }
        };
    }

    let input = load_input_or_exit(path);
    let options = resolve_options(&input, flags);
    match input.translate(&options) {
        Ok(program) => {
            render_diagnostics(&program.warnings, &input.sources());
            program.lines
        }
        Err(e) => exit_with(&e, &input.sources()),
    }
}

pub fn cmd_run(args: RunArgs) {
    let program = load_program(&args.input, &args.flags);
    let mut machine = match Machine::load(&program) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
    for &(addr, value) in &args.ram {
        machine.set_ram(addr, value);
    }

    let result = match machine.run(args.steps) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            print_state(&machine, &args.show);
            std::process::exit(1);
        }
    };

    let reason = match result.halt {
        Halt::EndOfProgram => "end of program",
        Halt::SelfLoop => "halt loop",
    };
    eprintln!("Stopped after {} steps ({})", result.steps, reason);
    print_state(&machine, &args.show);
}

fn print_state(machine: &Machine, show: &[u16]) {
    println!(
        "SP={} LCL={} ARG={} THIS={} THAT={}",
        machine.ram(0),
        machine.ram(1),
        machine.ram(2),
        machine.ram(3),
        machine.ram(4)
    );
    let temp: Vec<String> = (5..13).map(|r| machine.ram(r).to_string()).collect();
    println!("temp: [{}]", temp.join(", "));
    let stack: Vec<String> = machine.stack().iter().map(|v| v.to_string()).collect();
    println!("stack: [{}]", stack.join(", "));
    for &addr in show {
        println!("RAM[{}] = {}", addr, machine.ram(addr));
    }
}
