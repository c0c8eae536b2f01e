/// Number of distinct `file_id`s a span can carry.
pub const MAX_FILES: usize = u16::MAX as usize + 1;

/// A source location: file ID + byte offset range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub file_id: u16,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    pub fn dummy() -> Self {
        Self {
            file_id: 0,
            start: 0,
            end: 0,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// A value annotated with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One input file, owned by the driver and indexed by `Span::file_id`.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Display name used in diagnostics (usually the path).
    pub name: String,
    pub text: String,
}

/// All sources taking part in one translation run.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id, or `None` once every id is taken.
    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> Option<u16> {
        let id = u16::try_from(self.files.len()).ok()?;
        self.files.push(SourceFile {
            name: name.into(),
            text: text.into(),
        });
        Some(id)
    }

    pub fn get(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    /// 1-based line number of the span start, and the trimmed text of that line.
    pub fn line_of(&self, span: Span) -> Option<(usize, &str)> {
        let file = self.get(span.file_id)?;
        let start = (span.start as usize).min(file.text.len());
        let line_no = file.text[..start].matches('\n').count() + 1;
        let line = file.text.lines().nth(line_no - 1).unwrap_or("");
        Some((line_no, line.trim()))
    }
}
