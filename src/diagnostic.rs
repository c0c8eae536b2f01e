use crate::span::{SourceMap, Span};

/// A translator diagnostic (error or warning).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// One-line form: `file:line: message: `offending text``.
    ///
    /// Falls back to the bare message when the span carries no location
    /// (I/O and configuration errors).
    pub fn describe(&self, sources: &SourceMap) -> String {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.span.is_dummy() {
            return format!("{}: {}", prefix, self.message);
        }
        match (sources.get(self.span.file_id), sources.line_of(self.span)) {
            (Some(file), Some((line, text))) => format!(
                "{}: {}:{}: {}: `{}`",
                prefix, file.name, line, self.message, text
            ),
            _ => format!("{}: {}", prefix, self.message),
        }
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, sources: &SourceMap) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let file = match sources.get(self.span.file_id) {
            Some(file) if !self.span.is_dummy() => file,
            _ => {
                eprintln!("{}", self.describe(sources));
                for note in &self.notes {
                    eprintln!("  = note: {}", note);
                }
                if let Some(help) = &self.help {
                    eprintln!("  = help: {}", help);
                }
                return;
            }
        };

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let filename = file.name.as_str();
        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.range()))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if report
            .finish()
            .eprint((filename, Source::from(file.text.as_str())))
            .is_err()
        {
            eprintln!("{}", self.describe(sources));
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], sources: &SourceMap) {
    for diag in diagnostics {
        diag.render(sources);
    }
}
