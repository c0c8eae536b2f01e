mod arith;
mod call;
mod flow;
mod segment;
mod stack;

use log::debug;

use crate::asm::{Asm, Comp, Dest, Jump};
use crate::ast::{Command, Module};
use crate::codegen::context::TranslationContext;
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;

/// Hack assembly emitter: walks parsed modules and produces assembly lines.
///
/// One emitter serves a whole run: all modules share its context, so the
/// label counters keep climbing from one file to the next.
#[derive(Debug, Default)]
pub struct Emitter {
    output: Vec<Asm>,
    ctx: TranslationContext,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines emitted so far.
    pub fn output(&self) -> &[Asm] {
        &self.output
    }

    /// Clear output and context; the next run numbers labels from zero.
    pub fn reset(&mut self) {
        self.output.clear();
        self.ctx.reset();
    }

    pub fn finish(self) -> Vec<Asm> {
        self.output
    }

    /// Translate every command of one module, in order.
    pub fn emit_module(&mut self, module: &Module) -> Result<(), Diagnostic> {
        debug!(
            "translating module {} ({} commands)",
            module.name,
            module.commands.len()
        );
        self.ctx.enter_module(&module.name);
        for command in &module.commands {
            self.emit_command(command)?;
        }
        Ok(())
    }

    pub fn emit_command(&mut self, command: &Spanned<Command>) -> Result<(), Diagnostic> {
        let span = command.span;
        match &command.node {
            Command::Push(segment, index) => {
                let loc = self.resolve(*segment, *index, span)?;
                self.push_location(&loc);
            }
            Command::Pop(segment, index) => {
                let loc = self.resolve(*segment, *index, span)?;
                self.pop_location(&loc, span)?;
            }
            Command::Arithmetic(op) => self.emit_arithmetic(*op),
            Command::Label(label) => self.emit_label_def(label),
            Command::Goto(label) => self.emit_goto(label),
            Command::IfGoto(label) => self.emit_if_goto(label),
            Command::Function { name, locals } => self.emit_function(name, *locals),
            Command::Call { name, args } => self.emit_call(name, *args),
            Command::Return => self.emit_return(),
        }
        Ok(())
    }

    // ── Low-level output helpers ──────────────────────────────────

    fn at(&mut self, symbol: &str) {
        self.output.push(Asm::at_symbol(symbol));
    }

    fn at_value(&mut self, value: u16) {
        self.output.push(Asm::at_value(value));
    }

    fn assign(&mut self, dest: Dest, comp: Comp) {
        self.output.push(Asm::assign(dest, comp));
    }

    fn jump(&mut self, comp: Comp, jump: Jump) {
        self.output.push(Asm::jump(comp, jump));
    }

    fn label(&mut self, symbol: &str) {
        self.output.push(Asm::label(symbol));
    }
}

#[cfg(test)]
mod tests;
