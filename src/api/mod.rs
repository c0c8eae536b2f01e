pub mod pipeline;

use log::debug;

use crate::asm::Asm;
use crate::ast::Command;
use crate::codegen::Emitter;
use crate::diagnostic::Diagnostic;
use crate::project::Project;
use crate::span::{SourceMap, Span, MAX_FILES};
use crate::syntax::parser::{is_symbol, Parser, IDENTIFIER_HELP, MAX_INDEX};


pub const DEFAULT_ENTRY: &str = "Sys.init";
pub const DEFAULT_STACK_BASE: u16 = 256;

/// Options controlling translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Emit the bootstrap sequence. `None` means: only for directory input.
    pub bootstrap: Option<bool>,
    /// Function called by the bootstrap sequence.
    pub entry: String,
    /// Initial stack pointer set by the bootstrap sequence.
    pub stack_base: u16,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            bootstrap: None,
            entry: DEFAULT_ENTRY.to_string(),
            stack_base: DEFAULT_STACK_BASE,
        }
    }
}

impl TranslateOptions {
    /// Take every value the project file sets. Apply CLI flags afterwards.
    pub fn with_project(mut self, project: &Project) -> Self {
        if let Some(bootstrap) = project.program.bootstrap {
            self.bootstrap = Some(bootstrap);
        }
        if let Some(entry) = &project.program.entry {
            self.entry = entry.clone();
        }
        if let Some(base) = project.program.stack_base {
            self.stack_base = base;
        }
        self
    }
}

/// One input file handed to the translator.
#[derive(Clone, Debug)]
pub struct SourceUnit {
    /// Module name; namespaces the `static` segment.
    pub module: String,
    /// Display name for diagnostics.
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(module: &str, name: &str, text: &str) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            text: text.to_string(),
        }
    }
}

/// Source map for a unit list; `file_id` is the unit's position.
pub fn source_map(units: &[SourceUnit]) -> SourceMap {
    let mut map = SourceMap::new();
    for unit in units {
        if map.add(unit.name.as_str(), unit.text.as_str()).is_none() {
            break;
        }
    }
    map
}

/// A complete translated program.
#[derive(Clone, Debug)]
pub struct Program {
    /// Output name (file stem).
    pub name: String,
    pub lines: Vec<Asm>,
    /// Non-fatal findings, e.g. an undefined bootstrap entry.
    pub warnings: Vec<Diagnostic>,
}

impl Program {
    /// Assembly text, one line per instruction, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    /// BLAKE3 digest of the rendered text.
    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(self.render().as_bytes())
    }

    /// Number of ROM words the program occupies.
    pub fn instruction_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_instruction()).count()
    }
}

/// Translate a list of units into one program named `name`.
///
/// Units are parsed and emitted in order through a single emitter, so
/// label numbering continues across files. Module and entry names are
/// checked before anything is emitted. The first error aborts.
pub fn translate_units(
    name: &str,
    units: &[SourceUnit],
    bootstrap: bool,
    options: &TranslateOptions,
) -> Result<Program, Diagnostic> {
    if units.len() > MAX_FILES {
        return Err(Diagnostic::error(
            format!(
                "too many input files ({}, at most {})",
                units.len(),
                MAX_FILES
            ),
            Span::dummy(),
        ));
    }
    for unit in units {
        if !is_symbol(&unit.module) {
            return Err(Diagnostic::error(
                format!("invalid module name `{}`", unit.module),
                Span::dummy(),
            )
            .with_note(format!("module name of '{}'", unit.name))
            .with_help(IDENTIFIER_HELP.to_string()));
        }
    }

    let mut emitter = Emitter::new();
    if bootstrap {
        if !is_symbol(&options.entry) {
            return Err(Diagnostic::error(
                format!("invalid entry function name `{}`", options.entry),
                Span::dummy(),
            )
            .with_help(IDENTIFIER_HELP.to_string()));
        }
        if options.stack_base > MAX_INDEX {
            return Err(Diagnostic::error(
                format!(
                    "stack base {} out of range (expected at most {})",
                    options.stack_base, MAX_INDEX
                ),
                Span::dummy(),
            ));
        }
        emitter.emit_bootstrap(options.stack_base, &options.entry);
    }

    let mut entry_defined = false;
    for (index, unit) in units.iter().enumerate() {
        let file_id = u16::try_from(index).map_err(|_| {
            Diagnostic::error(format!("no file id left for '{}'", unit.name), Span::dummy())
        })?;
        let module = Parser::new(&unit.text, file_id).parse_module(&unit.module)?;
        entry_defined |= module.commands.iter().any(|c| {
            matches!(&c.node, Command::Function { name, .. } if *name == options.entry)
        });
        emitter.emit_module(&module)?;
    }

    let mut warnings = Vec::new();
    if bootstrap && !entry_defined {
        warnings.push(
            Diagnostic::warning(
                format!(
                    "entry function `{}` is not defined in any input file",
                    options.entry
                ),
                Span::dummy(),
            )
            .with_help("pass --entry NAME, or --no-bootstrap for a library".to_string()),
        );
    }
    debug!(
        "translated {} unit(s) into {} lines",
        units.len(),
        emitter.output().len()
    );
    Ok(Program {
        name: name.to_string(),
        lines: emitter.finish(),
        warnings,
    })
}

/// Translate one source file without bootstrap and render it.
pub fn translate(source: &str, module: &str) -> Result<String, Diagnostic> {
    let units = [SourceUnit::new(module, module, source)];
    let program = translate_units(module, &units, false, &TranslateOptions::default())?;
    Ok(program.render())
}
