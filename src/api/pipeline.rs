//! Filesystem side of the driver: input discovery and output writing.
//!
//! Everything here is thin I/O around [`translate_units`]; module names
//! are derived from file stems at this layer and nowhere else.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{source_map, translate_units, Program, SourceUnit, TranslateOptions};
use crate::diagnostic::Diagnostic;
use crate::project::Project;
use crate::span::{SourceMap, Span};

pub const SOURCE_EXTENSION: &str = "vm";
pub const OUTPUT_EXTENSION: &str = "asm";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
}

/// Loaded input: source units, where the output goes, optional project.
#[derive(Clone, Debug)]
pub struct Input {
    pub kind: InputKind,
    pub units: Vec<SourceUnit>,
    /// Default output path.
    pub output: PathBuf,
    pub project: Option<Project>,
}

impl Input {
    /// Source map for rendering diagnostics against these units.
    pub fn sources(&self) -> SourceMap {
        source_map(&self.units)
    }

    /// Output file stem.
    pub fn name(&self) -> String {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the bootstrap sequence is emitted under `options`.
    pub fn bootstraps(&self, options: &TranslateOptions) -> bool {
        options
            .bootstrap
            .unwrap_or(self.kind == InputKind::Directory)
    }

    pub fn translate(&self, options: &TranslateOptions) -> Result<Program, Diagnostic> {
        translate_units(&self.name(), &self.units, self.bootstraps(options), options)
    }
}

/// Resolve a `.vm` file or a directory of `.vm` files.
pub fn load_input(path: &Path) -> Result<Input, Diagnostic> {
    if path.is_dir() {
        load_directory(path)
    } else if path.extension().is_some_and(|e| e == SOURCE_EXTENSION) {
        let unit = read_unit(path)?;
        Ok(Input {
            kind: InputKind::File,
            units: vec![unit],
            output: path.with_extension(OUTPUT_EXTENSION),
            project: None,
        })
    } else if !path.exists() {
        Err(Diagnostic::error(
            format!("'{}' does not exist", path.display()),
            Span::dummy(),
        ))
    } else {
        Err(Diagnostic::error(
            format!(
                "input must be a .{} file or a directory, got '{}'",
                SOURCE_EXTENSION,
                path.display()
            ),
            Span::dummy(),
        ))
    }
}

fn load_directory(dir: &Path) -> Result<Input, Diagnostic> {
    let project = match Project::find(dir) {
        Some(toml_path) => Some(Project::load(&toml_path)?),
        None => None,
    };

    let files = collect_vm_files(dir)?;
    if files.is_empty() {
        return Err(Diagnostic::error(
            format!("no .{} files in '{}'", SOURCE_EXTENSION, dir.display()),
            Span::dummy(),
        ));
    }
    let mut units = Vec::with_capacity(files.len());
    for file in &files {
        units.push(read_unit(file)?);
    }

    let dir_name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "out".to_string());
    let name = project
        .as_ref()
        .and_then(|p| p.program.name.clone())
        .unwrap_or(dir_name);
    debug!("directory input '{}': {} file(s)", dir.display(), units.len());

    Ok(Input {
        kind: InputKind::Directory,
        units,
        output: dir.join(format!("{}.{}", name, OUTPUT_EXTENSION)),
        project,
    })
}

/// `.vm` files directly inside `dir`, sorted by file name.
fn collect_vm_files(dir: &Path) -> Result<Vec<PathBuf>, Diagnostic> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Diagnostic::error(
            format!("cannot read directory '{}': {}", dir.display(), e),
            Span::dummy(),
        )
    })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == SOURCE_EXTENSION))
        .collect();
    files.sort();
    Ok(files)
}

fn read_unit(path: &Path) -> Result<SourceUnit, Diagnostic> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Diagnostic::error(
            format!("cannot read '{}': {}", path.display(), e),
            Span::dummy(),
        )
    })?;
    let module = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SourceUnit {
        module,
        name: path.display().to_string(),
        text,
    })
}

/// Write `contents` to `path` all at once: a temp file in the same
/// directory is filled, then renamed over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), Diagnostic> {
    let io_error = |e: std::io::Error| {
        Diagnostic::error(
            format!("cannot write '{}': {}", path.display(), e),
            Span::dummy(),
        )
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(contents.as_bytes()).map_err(io_error)?;
    tmp.flush().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    info!("wrote {} bytes to '{}'", contents.len(), path.display());
    Ok(())
}

/// Load, translate and write in one go. Nothing is written on failure.
pub fn build(
    input: &Input,
    output: Option<&Path>,
    options: &TranslateOptions,
) -> Result<(Program, PathBuf), Diagnostic> {
    let program = input.translate(options)?;
    let out_path = output.map(Path::to_path_buf).unwrap_or_else(|| input.output.clone());
    write_atomic(&out_path, &program.render())?;
    Ok((program, out_path))
}
