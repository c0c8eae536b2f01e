use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::syntax::parser::{is_symbol, IDENTIFIER_HELP};

pub const PROJECT_FILE: &str = "hackvm.toml";

/// Project configuration from hackvm.toml.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Project {
    #[serde(default)]
    pub program: ProgramSection,
}

/// The `[program]` table. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramSection {
    /// Output file stem (default: directory name).
    pub name: Option<String>,
    /// Function the bootstrap sequence calls.
    pub entry: Option<String>,
    pub bootstrap: Option<bool>,
    pub stack_base: Option<u16>,
}

impl Project {
    /// Load project from a hackvm.toml file.
    pub fn load(toml_path: &Path) -> Result<Project, Diagnostic> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read '{}': {}", toml_path.display(), e),
                Span::dummy(),
            )
        })?;
        Self::parse(&content).map_err(|e| {
            e.with_note(format!("in project file '{}'", toml_path.display()))
        })
    }

    pub fn parse(content: &str) -> Result<Project, Diagnostic> {
        let project: Project = toml::from_str(content).map_err(|e| {
            Diagnostic::error(
                format!("invalid project file: {}", e.message()),
                Span::dummy(),
            )
        })?;
        if let Some(name) = &project.program.name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(Diagnostic::error(
                    format!("invalid program name '{}'", name),
                    Span::dummy(),
                )
                .with_help("the name becomes the output file stem".to_string()));
            }
        }
        if let Some(entry) = &project.program.entry {
            if !is_symbol(entry) {
                return Err(Diagnostic::error(
                    format!("invalid entry function name `{}`", entry),
                    Span::dummy(),
                )
                .with_help(IDENTIFIER_HELP.to_string()));
            }
        }
        Ok(project)
    }

    /// The project file inside `dir`, if there is one.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(PROJECT_FILE);
        candidate.is_file().then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_project() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(PROJECT_FILE);
        fs::write(
            &toml_path,
            r#"[program]
name = "Pong"
entry = "Main.main"
bootstrap = true
stack_base = 300
"#,
        )
        .unwrap();

        let project = Project::load(&toml_path).unwrap();
        assert_eq!(project.program.name.as_deref(), Some("Pong"));
        assert_eq!(project.program.entry.as_deref(), Some("Main.main"));
        assert_eq!(project.program.bootstrap, Some(true));
        assert_eq!(project.program.stack_base, Some(300));
    }

    #[test]
    fn test_empty_project_is_all_defaults() {
        let project = Project::parse("").unwrap();
        assert_eq!(project.program, ProgramSection::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Project::parse("[program]\nentri = \"x\"\n").unwrap_err();
        assert!(err.message.starts_with("invalid project file"));
    }

    #[test]
    fn test_bad_name_rejected() {
        let err = Project::parse("[program]\nname = \"a/b\"\n").unwrap_err();
        assert_eq!(err.message, "invalid program name 'a/b'");
    }

    #[test]
    fn test_bad_entry_rejected() {
        let err = Project::parse("[program]\nentry = \"not valid\"\n").unwrap_err();
        assert_eq!(err.message, "invalid entry function name `not valid`");
        assert!(Project::parse("[program]\nentry = \"Main.main\"\n").is_ok());
    }

    #[test]
    fn test_find() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Project::find(dir.path()).is_none());
        fs::write(dir.path().join(PROJECT_FILE), "").unwrap();
        assert_eq!(
            Project::find(dir.path()),
            Some(dir.path().join(PROJECT_FILE))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::load(&dir.path().join(PROJECT_FILE)).unwrap_err();
        assert!(err.message.starts_with("cannot read"));
    }
}
