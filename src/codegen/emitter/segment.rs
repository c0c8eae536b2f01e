use super::Emitter;
use crate::asm::{Address, ARG, LCL, THAT, THIS};
use crate::ast::Segment;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// First temp register (R5).
pub(crate) const TEMP_BASE: u16 = 5;
pub(crate) const TEMP_SLOTS: u16 = 8;
/// `pointer 0` is THIS (R3), `pointer 1` is THAT (R4).
pub(crate) const POINTER_SLOTS: u16 = 2;

/// Where a `(segment, index)` pair lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Location {
    /// `constant i`: the index itself.
    Immediate(u16),
    /// `*base + index`, with `base` one of LCL/ARG/THIS/THAT.
    Based { base: &'static str, index: u16 },
    /// A fixed RAM word known at translation time.
    Direct(Address),
}

impl Emitter {
    pub(crate) fn resolve(
        &self,
        segment: Segment,
        index: u16,
        span: Span,
    ) -> Result<Location, Diagnostic> {
        let loc = match segment {
            Segment::Constant => Location::Immediate(index),
            Segment::Local => Location::Based { base: LCL, index },
            Segment::Argument => Location::Based { base: ARG, index },
            Segment::This => Location::Based { base: THIS, index },
            Segment::That => Location::Based { base: THAT, index },
            Segment::Static => Location::Direct(Address::Symbol(self.ctx.static_symbol(index))),
            Segment::Temp => {
                check_slot(segment, index, TEMP_SLOTS, span)?;
                Location::Direct(Address::Symbol(format!("R{}", TEMP_BASE + index)))
            }
            Segment::Pointer => {
                check_slot(segment, index, POINTER_SLOTS, span)?;
                let register = if index == 0 { THIS } else { THAT };
                Location::Direct(Address::Symbol(register.to_string()))
            }
        };
        Ok(loc)
    }
}

fn check_slot(segment: Segment, index: u16, slots: u16, span: Span) -> Result<(), Diagnostic> {
    if index < slots {
        return Ok(());
    }
    Err(Diagnostic::error(
        format!(
            "{} index {} out of range (expected 0..={})",
            segment.keyword(),
            index,
            slots - 1
        ),
        span,
    ))
}
