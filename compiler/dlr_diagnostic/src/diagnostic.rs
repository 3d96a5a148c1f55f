use std::fmt;

/// Category of a compile-time fault.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DiagnosticKind {
    /// Malformed script text.
    Parse,
    /// Reference to an attribute or parameter that is not defined.
    Undefined,
    /// A name declared twice in the same scope.
    Redefined,
    /// Call to a host class method that has no declared signature.
    UndefinedFunction,
    /// Reference to a node that does not exist.
    UndefinedNode,
    /// A definition that depends on itself.
    Recursion,
    /// Call with an argument count outside the declared range.
    BadCall,
    /// An import that the module resolver could not satisfy.
    ModuleNotFound,
}

impl DiagnosticKind {
    /// Stable error code for searchability.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "E1001",
            DiagnosticKind::Undefined => "E2001",
            DiagnosticKind::Redefined => "E2002",
            DiagnosticKind::UndefinedFunction => "E2003",
            DiagnosticKind::UndefinedNode => "E2004",
            DiagnosticKind::Recursion => "E2005",
            DiagnosticKind::BadCall => "E2006",
            DiagnosticKind::ModuleNotFound => "E3001",
        }
    }

    /// Name of the error class as shown to script authors.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "ParseError",
            DiagnosticKind::Undefined => "UndefinedError",
            DiagnosticKind::Redefined => "RedefinedError",
            DiagnosticKind::UndefinedFunction => "UndefinedFunctionError",
            DiagnosticKind::UndefinedNode => "UndefinedNodeError",
            DiagnosticKind::Recursion => "RecursionError",
            DiagnosticKind::BadCall => "BadCallError",
            DiagnosticKind::ModuleNotFound => "ModuleNotFoundError",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compile-time fault located at `module:line`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub module: String,
    /// 1-based; 0 when the fault has no single source line.
    pub line: u32,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            module: String::new(),
            line: 0,
        }
    }

    /// Attach the location of the declaration being compiled.
    pub fn at(mut self, module: impl Into<String>, line: u32) -> Self {
        self.module = module.into();
        self.line = line;
        self
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, message)
    }

    pub fn undefined(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Undefined, message)
    }

    pub fn redefined(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Redefined, message)
    }

    pub fn undefined_function(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UndefinedFunction, message)
    }

    pub fn undefined_node(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UndefinedNode, message)
    }

    pub fn recursion(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Recursion, message)
    }

    pub fn bad_call(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::BadCall, message)
    }

    pub fn module_not_found(name: &str) -> Self {
        Self::new(DiagnosticKind::ModuleNotFound, format!("module '{name}' not found"))
    }

    pub fn is(&self, kind: DiagnosticKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.kind, self.kind.code(), self.message)?;
        if !self.module.is_empty() || self.line > 0 {
            write!(f, " ({}:{})", self.module, self.line)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
