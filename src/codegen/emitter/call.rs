use log::debug;

use super::Emitter;
use crate::asm::{Comp, Dest, Jump, ARG, LCL, R13, R14, SP, THAT, THIS};
use crate::syntax::parser::MAX_INDEX;

/// Return address plus the four saved base registers.
pub(crate) const FRAME_HEADER: u16 = 5;

/// Saved in this order by `call`, restored in reverse by `return`.
const SAVED_REGISTERS: [&str; 4] = [LCL, ARG, THIS, THAT];

impl Emitter {
    /// `call f n`: save the caller frame, reposition ARG and LCL, jump.
    pub(super) fn emit_call(&mut self, name: &str, args: u16) {
        let return_label = self.ctx.fresh_return_label(name);

        self.at(&return_label);
        self.assign(Dest::D, Comp::A);
        self.push_value(Comp::D);

        for register in SAVED_REGISTERS {
            self.at(register);
            self.assign(Dest::D, Comp::M);
            self.push_value(Comp::D);
        }

        // ARG = SP - 5 - n
        self.at(SP);
        self.assign(Dest::D, Comp::M);
        let offset = u32::from(FRAME_HEADER) + u32::from(args);
        if offset <= u32::from(MAX_INDEX) {
            self.at_value(offset as u16);
            self.assign(Dest::D, Comp::DMinusA);
        } else {
            self.at_value(FRAME_HEADER);
            self.assign(Dest::D, Comp::DMinusA);
            self.at_value(args);
            self.assign(Dest::D, Comp::DMinusA);
        }
        self.at(ARG);
        self.assign(Dest::M, Comp::D);

        // LCL = SP
        self.at(SP);
        self.assign(Dest::D, Comp::M);
        self.at(LCL);
        self.assign(Dest::M, Comp::D);

        self.at(name);
        self.jump(Comp::Zero, Jump::JMP);
        self.label(&return_label);
    }

    /// `function f k`: entry label, then `k` zeroed locals pushed in a loop.
    pub(super) fn emit_function(&mut self, name: &str, locals: u16) {
        debug!("function {} in {} ({} locals)", name, self.ctx.module(), locals);
        self.ctx.enter_function(name);
        self.label(name);
        if locals == 0 {
            return;
        }

        let lp = self.ctx.fresh_label("locals");
        self.at_value(locals);
        self.assign(Dest::D, Comp::A);
        self.label(&lp);
        self.push_value(Comp::Zero);
        self.assign(Dest::D, Comp::DMinusOne);
        self.at(&lp);
        self.jump(Comp::D, Jump::JGT);
    }

    /// `return`: move the result to ARG[0], drop the frame, restore the
    /// caller's bases and jump back.
    pub(super) fn emit_return(&mut self) {
        // R13 = frame anchor (LCL)
        self.at(LCL);
        self.assign(Dest::D, Comp::M);
        self.at(R13);
        self.assign(Dest::M, Comp::D);

        // R14 = *(frame - 5); read before ARG[0] is overwritten (n = 0 aliases it)
        self.at_value(FRAME_HEADER);
        self.assign(Dest::A, Comp::DMinusA);
        self.assign(Dest::D, Comp::M);
        self.at(R14);
        self.assign(Dest::M, Comp::D);

        // *ARG = pop()
        self.pop_to_d();
        self.at(ARG);
        self.assign(Dest::A, Comp::M);
        self.assign(Dest::M, Comp::D);

        // SP = ARG + 1
        self.at(ARG);
        self.assign(Dest::D, Comp::MPlusOne);
        self.at(SP);
        self.assign(Dest::M, Comp::D);

        // THAT, THIS, ARG, LCL = *(frame - 1..4); LCL last, R13 holds the anchor
        for register in SAVED_REGISTERS.iter().rev() {
            self.at(R13);
            self.assign(Dest::AM, Comp::MMinusOne);
            self.assign(Dest::D, Comp::M);
            self.at(register);
            self.assign(Dest::M, Comp::D);
        }

        self.at(R14);
        self.assign(Dest::A, Comp::M);
        self.jump(Comp::Zero, Jump::JMP);
    }

    /// Program start: `SP = stack_base`, then `call entry 0`.
    pub fn emit_bootstrap(&mut self, stack_base: u16, entry: &str) {
        debug!("bootstrap: SP={} entry={}", stack_base, entry);
        self.at_value(stack_base);
        self.assign(Dest::D, Comp::A);
        self.at(SP);
        self.assign(Dest::M, Comp::D);
        self.emit_call(entry, 0);
    }
}
