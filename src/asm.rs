//! Hack assembly lines as produced by the translator.
//!
//! Three forms only: address instructions (`@x`), compute instructions
//! (`dest=comp;jump`) and label definitions (`(x)`). `Display` renders the
//! exact text the assembler consumes and `FromStr` reads it back, so the
//! reference machine can run both in-memory and on-disk programs.

use std::fmt;
use std::str::FromStr;

/// Predefined register symbols.
pub const SP: &str = "SP";
pub const LCL: &str = "LCL";
pub const ARG: &str = "ARG";
pub const THIS: &str = "THIS";
pub const THAT: &str = "THAT";
/// Scratch registers owned by the translator.
pub const R13: &str = "R13";
pub const R14: &str = "R14";

/// One line of Hack assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asm {
    /// `@value` or `@symbol`.
    At(Address),
    /// `dest=comp;jump`, with dest and jump optional.
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
    /// `(symbol)`.
    Label(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    Value(u16),
    Symbol(String),
}

/// Writable destinations; any non-empty subset of A, D and M.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dest {
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

/// The ALU computations of the Hack instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    NegOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jump {
    JGT,
    JEQ,
    JGE,
    JLT,
    JNE,
    JLE,
    JMP,
}

impl Asm {
    pub fn at_symbol(symbol: impl Into<String>) -> Asm {
        Asm::At(Address::Symbol(symbol.into()))
    }

    pub fn at_value(value: u16) -> Asm {
        Asm::At(Address::Value(value))
    }

    /// `dest=comp`
    pub fn assign(dest: Dest, comp: Comp) -> Asm {
        Asm::Compute {
            dest: Some(dest),
            comp,
            jump: None,
        }
    }

    /// `comp;jump`
    pub fn jump(comp: Comp, jump: Jump) -> Asm {
        Asm::Compute {
            dest: None,
            comp,
            jump: Some(jump),
        }
    }

    pub fn label(symbol: impl Into<String>) -> Asm {
        Asm::Label(symbol.into())
    }

    /// True for lines that occupy a ROM word (everything but labels).
    pub fn is_instruction(&self) -> bool {
        !matches!(self, Asm::Label(_))
    }
}

impl Dest {
    const ALL: [Dest; 7] = [
        Dest::M,
        Dest::D,
        Dest::MD,
        Dest::A,
        Dest::AM,
        Dest::AD,
        Dest::AMD,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Dest::M => "M",
            Dest::D => "D",
            Dest::MD => "MD",
            Dest::A => "A",
            Dest::AM => "AM",
            Dest::AD => "AD",
            Dest::AMD => "AMD",
        }
    }

    pub fn writes_a(self) -> bool {
        matches!(self, Dest::A | Dest::AM | Dest::AD | Dest::AMD)
    }

    pub fn writes_d(self) -> bool {
        matches!(self, Dest::D | Dest::MD | Dest::AD | Dest::AMD)
    }

    pub fn writes_m(self) -> bool {
        matches!(self, Dest::M | Dest::MD | Dest::AM | Dest::AMD)
    }
}

impl Comp {
    const ALL: [Comp; 28] = [
        Comp::Zero,
        Comp::One,
        Comp::NegOne,
        Comp::D,
        Comp::A,
        Comp::M,
        Comp::NotD,
        Comp::NotA,
        Comp::NotM,
        Comp::NegD,
        Comp::NegA,
        Comp::NegM,
        Comp::DPlusOne,
        Comp::APlusOne,
        Comp::MPlusOne,
        Comp::DMinusOne,
        Comp::AMinusOne,
        Comp::MMinusOne,
        Comp::DPlusA,
        Comp::DPlusM,
        Comp::DMinusA,
        Comp::DMinusM,
        Comp::AMinusD,
        Comp::MMinusD,
        Comp::DAndA,
        Comp::DAndM,
        Comp::DOrA,
        Comp::DOrM,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Comp::Zero => "0",
            Comp::One => "1",
            Comp::NegOne => "-1",
            Comp::D => "D",
            Comp::A => "A",
            Comp::M => "M",
            Comp::NotD => "!D",
            Comp::NotA => "!A",
            Comp::NotM => "!M",
            Comp::NegD => "-D",
            Comp::NegA => "-A",
            Comp::NegM => "-M",
            Comp::DPlusOne => "D+1",
            Comp::APlusOne => "A+1",
            Comp::MPlusOne => "M+1",
            Comp::DMinusOne => "D-1",
            Comp::AMinusOne => "A-1",
            Comp::MMinusOne => "M-1",
            Comp::DPlusA => "D+A",
            Comp::DPlusM => "D+M",
            Comp::DMinusA => "D-A",
            Comp::DMinusM => "D-M",
            Comp::AMinusD => "A-D",
            Comp::MMinusD => "M-D",
            Comp::DAndA => "D&A",
            Comp::DAndM => "D&M",
            Comp::DOrA => "D|A",
            Comp::DOrM => "D|M",
        }
    }

    /// Evaluate with wrapping 16-bit arithmetic.
    pub fn eval(self, d: i16, a: i16, m: i16) -> i16 {
        match self {
            Comp::Zero => 0,
            Comp::One => 1,
            Comp::NegOne => -1,
            Comp::D => d,
            Comp::A => a,
            Comp::M => m,
            Comp::NotD => !d,
            Comp::NotA => !a,
            Comp::NotM => !m,
            Comp::NegD => d.wrapping_neg(),
            Comp::NegA => a.wrapping_neg(),
            Comp::NegM => m.wrapping_neg(),
            Comp::DPlusOne => d.wrapping_add(1),
            Comp::APlusOne => a.wrapping_add(1),
            Comp::MPlusOne => m.wrapping_add(1),
            Comp::DMinusOne => d.wrapping_sub(1),
            Comp::AMinusOne => a.wrapping_sub(1),
            Comp::MMinusOne => m.wrapping_sub(1),
            Comp::DPlusA => d.wrapping_add(a),
            Comp::DPlusM => d.wrapping_add(m),
            Comp::DMinusA => d.wrapping_sub(a),
            Comp::DMinusM => d.wrapping_sub(m),
            Comp::AMinusD => a.wrapping_sub(d),
            Comp::MMinusD => m.wrapping_sub(d),
            Comp::DAndA => d & a,
            Comp::DAndM => d & m,
            Comp::DOrA => d | a,
            Comp::DOrM => d | m,
        }
    }

    /// Whether the computation reads the addressed memory word.
    pub fn reads_m(self) -> bool {
        self.mnemonic().contains('M')
    }
}

impl Jump {
    const ALL: [Jump; 7] = [
        Jump::JGT,
        Jump::JEQ,
        Jump::JGE,
        Jump::JLT,
        Jump::JNE,
        Jump::JLE,
        Jump::JMP,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Jump::JGT => "JGT",
            Jump::JEQ => "JEQ",
            Jump::JGE => "JGE",
            Jump::JLT => "JLT",
            Jump::JNE => "JNE",
            Jump::JLE => "JLE",
            Jump::JMP => "JMP",
        }
    }

    pub fn taken(self, value: i16) -> bool {
        match self {
            Jump::JGT => value > 0,
            Jump::JEQ => value == 0,
            Jump::JGE => value >= 0,
            Jump::JLT => value < 0,
            Jump::JNE => value != 0,
            Jump::JLE => value <= 0,
            Jump::JMP => true,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Value(v) => write!(f, "{}", v),
            Address::Symbol(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for Asm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asm::At(addr) => write!(f, "@{}", addr),
            Asm::Compute { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{}=", dest.mnemonic())?;
                }
                f.write_str(comp.mnemonic())?;
                if let Some(jump) = jump {
                    write!(f, ";{}", jump.mnemonic())?;
                }
                Ok(())
            }
            Asm::Label(symbol) => write!(f, "({})", symbol),
        }
    }
}

/// Error from reading a textual assembly line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsmParseError(pub String);

impl fmt::Display for AsmParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for AsmParseError {}

impl FromStr for Asm {
    type Err = AsmParseError;

    /// Parse one non-blank, comment-free line. Inner whitespace is ignored.
    fn from_str(line: &str) -> Result<Asm, AsmParseError> {
        let text: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(rest) = text.strip_prefix('@') {
            if rest.is_empty() {
                return Err(AsmParseError(format!("empty address in `{}`", line)));
            }
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                return match rest.parse::<u16>() {
                    Ok(v) if v <= 0x7fff => Ok(Asm::at_value(v)),
                    _ => Err(AsmParseError(format!("address out of range in `{}`", line))),
                };
            }
            return Ok(Asm::at_symbol(rest));
        }
        if let Some(inner) = text.strip_prefix('(') {
            return match inner.strip_suffix(')') {
                Some(symbol) if !symbol.is_empty() => Ok(Asm::label(symbol)),
                _ => Err(AsmParseError(format!("malformed label `{}`", line))),
            };
        }

        let (dest_text, rest) = match text.split_once('=') {
            Some((d, r)) => (Some(d), r),
            None => (None, text.as_str()),
        };
        let (comp_text, jump_text) = match rest.split_once(';') {
            Some((c, j)) => (c, Some(j)),
            None => (rest, None),
        };
        let dest = dest_text
            .map(|d| {
                Dest::ALL
                    .into_iter()
                    .find(|x| x.mnemonic() == d)
                    .ok_or_else(|| AsmParseError(format!("unknown dest `{}` in `{}`", d, line)))
            })
            .transpose()?;
        let comp = Comp::ALL
            .into_iter()
            .find(|x| x.mnemonic() == comp_text)
            .ok_or_else(|| AsmParseError(format!("unknown comp `{}` in `{}`", comp_text, line)))?;
        let jump = jump_text
            .map(|j| {
                Jump::ALL
                    .into_iter()
                    .find(|x| x.mnemonic() == j)
                    .ok_or_else(|| AsmParseError(format!("unknown jump `{}` in `{}`", j, line)))
            })
            .transpose()?;
        if dest.is_none() && jump.is_none() {
            return Err(AsmParseError(format!(
                "compute instruction `{}` has neither dest nor jump",
                line
            )));
        }
        Ok(Asm::Compute { dest, comp, jump })
    }
}

/// Parse a whole assembly listing, skipping blank lines and `//` comments.
pub fn parse_listing(text: &str) -> Result<Vec<Asm>, AsmParseError> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let code = match raw.find("//") {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        if code.trim().is_empty() {
            continue;
        }
        let asm = code
            .parse::<Asm>()
            .map_err(|e| AsmParseError(format!("line {}: {}", i + 1, e)))?;
        out.push(asm);
    }
    Ok(out)
}
