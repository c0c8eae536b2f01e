use crate::ast::{ArithmeticOp, Command, Module, Segment};
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};

/// Largest value an address instruction can carry (15 bits).
pub const MAX_INDEX: u16 = 0x7fff;

/// Line-oriented parser for one stack-machine source file.
pub struct Parser<'src> {
    source: &'src str,
    file_id: u16,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, file_id: u16) -> Self {
        Self { source, file_id }
    }

    /// Parse every command in the file. Stops at the first malformed line.
    pub fn parse_module(self, name: &str) -> Result<Module, Diagnostic> {
        let mut commands = Vec::new();
        let mut offset = 0usize;
        for raw in self.source.split_inclusive('\n') {
            let line_start = offset;
            offset += raw.len();

            let code = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let content = code.trim();
            if content.is_empty() {
                continue;
            }
            let lead = code.len() - code.trim_start().len();
            let start = line_start + lead;
            let span = Span::new(
                self.file_id,
                start as u32,
                (start + content.len()) as u32,
            );
            let command = parse_command(content, span)?;
            commands.push(Spanned::new(command, span));
        }
        Ok(Module {
            name: name.to_string(),
            file_id: self.file_id,
            commands,
        })
    }
}

/// Classify one comment-free, non-blank line.
pub(crate) fn parse_command(line: &str, span: Span) -> Result<Command, Diagnostic> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let Some((&keyword, operands)) = fields.split_first() else {
        return Err(Diagnostic::error("empty command".to_string(), span));
    };

    if let Some(op) = ArithmeticOp::from_keyword(keyword) {
        expect_arity(keyword, operands, 0, "no operands", span)?;
        return Ok(Command::Arithmetic(op));
    }

    match keyword {
        "push" | "pop" => {
            expect_arity(keyword, operands, 2, "a segment and an index", span)?;
            let segment = parse_segment(operands[0], span)?;
            let index = parse_number(operands[1], "index", span)?;
            if keyword == "push" {
                Ok(Command::Push(segment, index))
            } else {
                Ok(Command::Pop(segment, index))
            }
        }
        "label" | "goto" | "if-goto" => {
            expect_arity(keyword, operands, 1, "a label name", span)?;
            let label = parse_identifier(operands[0], span)?;
            Ok(match keyword {
                "label" => Command::Label(label),
                "goto" => Command::Goto(label),
                _ => Command::IfGoto(label),
            })
        }
        "function" => {
            expect_arity(keyword, operands, 2, "a name and a local count", span)?;
            Ok(Command::Function {
                name: parse_identifier(operands[0], span)?,
                locals: parse_number(operands[1], "local count", span)?,
            })
        }
        "call" => {
            expect_arity(keyword, operands, 2, "a name and an argument count", span)?;
            Ok(Command::Call {
                name: parse_identifier(operands[0], span)?,
                args: parse_number(operands[1], "argument count", span)?,
            })
        }
        "return" => {
            expect_arity(keyword, operands, 0, "no operands", span)?;
            Ok(Command::Return)
        }
        _ => Err(
            Diagnostic::error(format!("unknown command `{}`", keyword), span).with_help(
                "expected push, pop, add, sub, neg, eq, gt, lt, and, or, not, \
                 label, goto, if-goto, function, call or return"
                    .to_string(),
            ),
        ),
    }
}

fn expect_arity(
    keyword: &str,
    operands: &[&str],
    expected: usize,
    what: &str,
    span: Span,
) -> Result<(), Diagnostic> {
    if operands.len() == expected {
        return Ok(());
    }
    Err(Diagnostic::error(
        format!(
            "malformed command: `{}` takes {}, found {} operand{}",
            keyword,
            what,
            operands.len(),
            if operands.len() == 1 { "" } else { "s" }
        ),
        span,
    ))
}

fn parse_segment(word: &str, span: Span) -> Result<Segment, Diagnostic> {
    Segment::from_keyword(word).ok_or_else(|| {
        Diagnostic::error(format!("unknown segment `{}`", word), span).with_help(
            "segments are constant, local, argument, this, that, static, temp and pointer"
                .to_string(),
        )
    })
}

/// Unsigned decimal only: no sign, no whitespace.
fn parse_number(word: &str, what: &str, span: Span) -> Result<u16, Diagnostic> {
    let digits = !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit());
    match word.parse::<u16>() {
        Ok(n) if digits && n <= MAX_INDEX => Ok(n),
        _ => Err(Diagnostic::error(
            format!(
                "invalid {} `{}`: expected an integer between 0 and {}",
                what, word, MAX_INDEX
            ),
            span,
        )),
    }
}

pub(crate) const IDENTIFIER_HELP: &str =
    "names use letters, digits, `_`, `.` and `:`, and do not start with a digit";

/// Function, label and module names: `[A-Za-z_.:][A-Za-z0-9_.:]*`.
///
/// `$` is reserved for translator-generated symbols.
pub(crate) fn is_symbol(word: &str) -> bool {
    let is_symbol_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':');
    word.chars().all(is_symbol_char) && word.chars().next().is_some_and(|c| !c.is_ascii_digit())
}

fn parse_identifier(word: &str, span: Span) -> Result<String, Diagnostic> {
    if is_symbol(word) {
        Ok(word.to_string())
    } else {
        Err(
            Diagnostic::error(format!("invalid identifier `{}`", word), span)
                .with_help(IDENTIFIER_HELP.to_string()),
        )
    }
}
