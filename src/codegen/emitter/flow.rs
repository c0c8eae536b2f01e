use super::Emitter;
use crate::asm::{Comp, Jump};

impl Emitter {
    pub(super) fn emit_label_def(&mut self, label: &str) {
        let symbol = self.ctx.scoped_label(label);
        self.label(&symbol);
    }

    pub(super) fn emit_goto(&mut self, label: &str) {
        let symbol = self.ctx.scoped_label(label);
        self.at(&symbol);
        self.jump(Comp::Zero, Jump::JMP);
    }

    /// Pop; jump when the value is non-zero.
    pub(super) fn emit_if_goto(&mut self, label: &str) {
        let symbol = self.ctx.scoped_label(label);
        self.pop_to_d();
        self.at(&symbol);
        self.jump(Comp::D, Jump::JNE);
    }
}
