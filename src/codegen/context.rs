/// Mutable naming state threaded through one translation run.
///
/// Every generated symbol is qualified by the module or function it
/// belongs to and, where it can repeat, by a counter shared across all
/// modules of the run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslationContext {
    module: String,
    function: Option<String>,
    label_counter: u32,
    return_counter: u32,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the counters and forget the current scope.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Enter a new module. The enclosing function does not carry over.
    pub fn enter_module(&mut self, name: &str) {
        self.module = name.to_string();
        self.function = None;
    }

    pub fn enter_function(&mut self, name: &str) {
        self.function = Some(name.to_string());
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The function name, or the module name outside any function.
    pub fn scope(&self) -> &str {
        self.function.as_deref().unwrap_or(&self.module)
    }

    /// `static i` in the current module.
    pub fn static_symbol(&self, index: u16) -> String {
        format!("{}.{}", self.module, index)
    }

    /// A `label`/`goto`/`if-goto` target in the current function.
    ///
    /// Outside any function: `<module>$$L`, a form no function name produces.
    pub fn scoped_label(&self, label: &str) -> String {
        match &self.function {
            Some(function) => format!("{}${}", function, label),
            None => format!("{}$${}", self.module, label),
        }
    }

    /// A fresh internal label, unique across the run.
    pub fn fresh_label(&mut self, kind: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{}${}${}", self.scope(), kind, n)
    }

    /// A fresh return-address label for a call to `callee`.
    pub fn fresh_return_label(&mut self, callee: &str) -> String {
        let n = self.return_counter;
        self.return_counter += 1;
        format!("{}$ret${}", callee, n)
    }
}
