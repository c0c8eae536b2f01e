use super::segment::Location;
use super::Emitter;
use crate::asm::{Address, Comp, Dest, R13, SP};
use crate::diagnostic::Diagnostic;
use crate::span::Span;

impl Emitter {
    // ── Stack primitives: the only code that moves SP by one ─────────

    /// `*SP = source; SP++`. `source` is D or a constant ALU output.
    pub(super) fn push_value(&mut self, source: Comp) {
        self.at(SP);
        self.assign(Dest::A, Comp::M);
        self.assign(Dest::M, source);
        self.at(SP);
        self.assign(Dest::M, Comp::MPlusOne);
    }

    /// `SP--; D = *SP`.
    pub(super) fn pop_to_d(&mut self) {
        self.at(SP);
        self.assign(Dest::AM, Comp::MMinusOne);
        self.assign(Dest::D, Comp::M);
    }

    // ── Segment access built on the primitives ──────────────────────

    /// Load the value of `loc` into D.
    fn load_d(&mut self, loc: &Location) {
        match loc {
            Location::Immediate(value) => {
                self.at_value(*value);
                self.assign(Dest::D, Comp::A);
            }
            Location::Based { base, index } => {
                self.at(base);
                self.assign(Dest::D, Comp::M);
                self.at_value(*index);
                self.assign(Dest::A, Comp::DPlusA);
                self.assign(Dest::D, Comp::M);
            }
            Location::Direct(addr) => {
                self.at_address(addr);
                self.assign(Dest::D, Comp::M);
            }
        }
    }

    pub(super) fn push_location(&mut self, loc: &Location) {
        self.load_d(loc);
        self.push_value(Comp::D);
    }

    pub(super) fn pop_location(&mut self, loc: &Location, span: Span) -> Result<(), Diagnostic> {
        match loc {
            Location::Immediate(_) => {
                return Err(Diagnostic::error(
                    "cannot pop into the constant segment".to_string(),
                    span,
                )
                .with_help("use `pop temp N` to discard a value".to_string()));
            }
            Location::Direct(addr) => {
                self.pop_to_d();
                self.at_address(addr);
                self.assign(Dest::M, Comp::D);
            }
            Location::Based { base, index } => {
                // Target address goes to R13 first; the pop needs A and D.
                self.at(base);
                self.assign(Dest::D, Comp::M);
                self.at_value(*index);
                self.assign(Dest::D, Comp::DPlusA);
                self.at(R13);
                self.assign(Dest::M, Comp::D);
                self.pop_to_d();
                self.at(R13);
                self.assign(Dest::A, Comp::M);
                self.assign(Dest::M, Comp::D);
            }
        }
        Ok(())
    }

    fn at_address(&mut self, addr: &Address) {
        match addr {
            Address::Value(v) => self.at_value(*v),
            Address::Symbol(s) => self.at(s),
        }
    }
}
