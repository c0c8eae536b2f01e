use std::fmt;

use crate::span::Spanned;

/// A parsed input file: the commands of one module, in source order.
#[derive(Clone, Debug)]
pub struct Module {
    /// Module name; namespaces the `static` segment.
    pub name: String,
    pub file_id: u16,
    pub commands: Vec<Spanned<Command>>,
}

/// One stack-machine command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

/// A virtual memory segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Static,
    Temp,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Segment {
    pub const ALL: [Segment; 8] = [
        Segment::Constant,
        Segment::Local,
        Segment::Argument,
        Segment::This,
        Segment::That,
        Segment::Static,
        Segment::Temp,
        Segment::Pointer,
    ];

    pub fn from_keyword(word: &str) -> Option<Segment> {
        Self::ALL.into_iter().find(|s| s.keyword() == word)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Static => "static",
            Segment::Temp => "temp",
            Segment::Pointer => "pointer",
        }
    }
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 9] = [
        ArithmeticOp::Add,
        ArithmeticOp::Sub,
        ArithmeticOp::Neg,
        ArithmeticOp::Eq,
        ArithmeticOp::Gt,
        ArithmeticOp::Lt,
        ArithmeticOp::And,
        ArithmeticOp::Or,
        ArithmeticOp::Not,
    ];

    pub fn from_keyword(word: &str) -> Option<ArithmeticOp> {
        Self::ALL.into_iter().find(|op| op.keyword() == word)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(seg, i) => write!(f, "push {} {}", seg.keyword(), i),
            Command::Pop(seg, i) => write!(f, "pop {} {}", seg.keyword(), i),
            Command::Arithmetic(op) => f.write_str(op.keyword()),
            Command::Label(l) => write!(f, "label {}", l),
            Command::Goto(l) => write!(f, "goto {}", l),
            Command::IfGoto(l) => write!(f, "if-goto {}", l),
            Command::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Command::Call { name, args } => write!(f, "call {} {}", name, args),
            Command::Return => f.write_str("return"),
        }
    }
}
