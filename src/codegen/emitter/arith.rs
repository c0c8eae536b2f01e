use super::Emitter;
use crate::asm::{Comp, Dest, Jump, SP};
use crate::ast::ArithmeticOp;

impl Emitter {
    pub(super) fn emit_arithmetic(&mut self, op: ArithmeticOp) {
        match op {
            ArithmeticOp::Add => self.emit_binary(Comp::DPlusM),
            ArithmeticOp::Sub => self.emit_binary(Comp::MMinusD),
            ArithmeticOp::And => self.emit_binary(Comp::DAndM),
            ArithmeticOp::Or => self.emit_binary(Comp::DOrM),
            ArithmeticOp::Neg => self.emit_unary(Comp::NegD),
            ArithmeticOp::Not => self.emit_unary(Comp::NotD),
            ArithmeticOp::Eq => self.emit_comparison(Jump::JEQ),
            ArithmeticOp::Gt => self.emit_comparison(Jump::JGT),
            ArithmeticOp::Lt => self.emit_comparison(Jump::JLT),
        }
    }

    /// Pop right into D, pop left into M, leave `left OP right` in D.
    fn pop_operands(&mut self, comp: Comp) {
        self.pop_to_d();
        self.at(SP);
        self.assign(Dest::AM, Comp::MMinusOne);
        self.assign(Dest::D, comp);
    }

    fn emit_binary(&mut self, comp: Comp) {
        self.pop_operands(comp);
        self.push_value(Comp::D);
    }

    fn emit_unary(&mut self, comp: Comp) {
        self.pop_to_d();
        self.assign(Dest::D, comp);
        self.push_value(Comp::D);
    }

    /// `left - right`, then branch on its sign: true is -1, false is 0.
    fn emit_comparison(&mut self, jump: Jump) {
        let is_true = self.ctx.fresh_label("cmp");
        let done = self.ctx.fresh_label("cmp");

        self.pop_operands(Comp::MMinusD);
        self.at(&is_true);
        self.jump(Comp::D, jump);
        self.assign(Dest::D, Comp::Zero);
        self.at(&done);
        self.jump(Comp::Zero, Jump::JMP);
        self.label(&is_true);
        self.assign(Dest::D, Comp::NegOne);
        self.label(&done);
        self.push_value(Comp::D);
    }
}
