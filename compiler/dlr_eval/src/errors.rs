//! Runtime error types.
//!
//! `EvalErrorKind` is the typed category callers match on; the factory
//! functions at the bottom of this module are the public way to build errors
//! and populate both `kind` and `message`.
//!
//! Errors collect a chain of [`Frame`]s while they unwind through attribute
//! evaluations. Frames are pushed innermost first; [`EvalError::backtrace`]
//! returns them outermost first.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Access
    InvalidGetAttribute {
        attr: String,
        receiver: String,
        cause: String,
    },
    InvalidIndex {
        receiver: String,
        reason: String,
    },
    UndefinedParam {
        name: String,
    },
    UndefinedNode {
        name: String,
    },
    ModuleNotFound {
        name: String,
    },

    // Sandbox
    NoSuchMethod {
        method: String,
        receiver: Option<String>,
    },
    BadArgument {
        method: String,
        detail: String,
    },
    BadCall {
        target: String,
        detail: String,
    },

    // Arithmetic
    DivisionByZero,
    IntegerOverflow {
        operation: String,
    },
    TypeMismatch {
        operation: String,
        left: String,
        right: Option<String>,
    },

    /// Raised by the `ERR(...)` form.
    Raised {
        message: String,
    },
    /// Failure reported by a host class or host object.
    Host {
        message: String,
    },
    /// Catch-all for invariant failures inside the runtime.
    Internal {
        message: String,
    },
}

impl EvalErrorKind {
    /// Stable error-class name, shown in translated errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidGetAttribute { .. } => "InvalidGetAttribute",
            Self::InvalidIndex { .. } => "InvalidIndex",
            Self::UndefinedParam { .. } => "UndefinedParamError",
            Self::UndefinedNode { .. } => "UndefinedNodeError",
            Self::ModuleNotFound { .. } => "ModuleNotFound",
            Self::NoSuchMethod { .. } => "NoSuchMethod",
            Self::BadArgument { .. } => "BadArgument",
            Self::BadCall { .. } => "BadCallError",
            Self::DivisionByZero => "ZeroDivisionError",
            Self::IntegerOverflow { .. } => "IntegerOverflow",
            Self::TypeMismatch { .. } => "TypeError",
            Self::Raised { .. } => "RuntimeError",
            Self::Host { .. } => "HostError",
            Self::Internal { .. } => "InternalError",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGetAttribute {
                attr,
                receiver,
                cause,
            } => write!(f, "bad attribute '{attr}' on {receiver}: {cause}"),
            Self::InvalidIndex { receiver, reason } => {
                write!(f, "bad index on {receiver}: {reason}")
            }
            Self::UndefinedParam { name } => write!(f, "undefined parameter {name}"),
            Self::UndefinedNode { name } => write!(f, "unknown node {name}"),
            Self::ModuleNotFound { name } => write!(f, "module '{name}' not found"),
            Self::NoSuchMethod {
                method,
                receiver: None,
            } => write!(f, "no such method {method}"),
            Self::NoSuchMethod {
                method,
                receiver: Some(receiver),
            } => write!(f, "no such method {method} for {receiver}"),
            Self::BadArgument { detail, .. } => f.write_str(detail),
            Self::BadCall { target, detail } => write!(f, "bad call to {target}: {detail}"),
            Self::DivisionByZero => f.write_str("divided by 0"),
            Self::IntegerOverflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::TypeMismatch {
                operation,
                left,
                right: None,
            } => write!(f, "operator `{operation}` cannot be applied to {left}"),
            Self::TypeMismatch {
                operation,
                left,
                right: Some(right),
            } => write!(f, "operator `{operation}` cannot be applied to {left} and {right}"),
            Self::Raised { message } | Self::Host { message } | Self::Internal { message } => {
                f.write_str(message)
            }
        }
    }
}

/// One step of the evaluation chain an error unwound through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Module the attribute's code was written in.
    pub module: Arc<str>,
    /// 1-based source line of the attribute definition.
    pub line: u32,
    pub attr: Arc<str>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.module, self.line, self.attr)
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Innermost first.
    frames: Vec<Frame>,
}

impl EvalError {
    /// Create an internal error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Internal {
            message: message.into(),
        })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            frames: Vec::new(),
        }
    }

    /// Record that the error unwound through `frame`.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Frames innermost first, in the order they were recorded.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frames outermost first.
    pub fn backtrace(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)?;
        for frame in self.backtrace() {
            write!(f, "\n  at {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Factory functions

#[cold]
pub fn invalid_get_attribute(attr: &str, receiver: &str, cause: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidGetAttribute {
        attr: attr.to_string(),
        receiver: receiver.to_string(),
        cause: cause.into(),
    })
}

#[cold]
pub fn invalid_index(receiver: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidIndex {
        receiver: receiver.to_string(),
        reason: reason.into(),
    })
}

#[cold]
pub fn undefined_param(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedParam {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_node(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedNode {
        name: name.to_string(),
    })
}

#[cold]
pub fn module_not_found(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuleNotFound {
        name: name.to_string(),
    })
}

#[cold]
pub fn no_such_method(method: &str, receiver: Option<&str>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoSuchMethod {
        method: method.to_string(),
        receiver: receiver.map(str::to_string),
    })
}

#[cold]
pub fn bad_argument(method: &str, detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BadArgument {
        method: method.to_string(),
        detail: detail.into(),
    })
}

#[cold]
pub fn bad_call(target: &str, detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BadCall {
        target: target.to_string(),
        detail: detail.into(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn type_mismatch(operation: &str, left: &Value, right: Option<&Value>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        operation: operation.to_string(),
        left: left.type_name().to_string(),
        right: right.map(|r| r.type_name().to_string()),
    })
}

#[cold]
pub fn raised(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Raised {
        message: message.into(),
    })
}

#[cold]
pub fn host_error(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Host {
        message: message.into(),
    })
}
