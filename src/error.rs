//! Purpose: Layer-side error model shared by builders, drivers, the ABI and the CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Carries failures that originate in this crate; engine-reported failures
//! travel as `Status::Error` result trees instead.
//! Invariants: Every kind renders to a non-empty message at the boundary.
//! Invariants: Exit code mapping is stable once published.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    InvalidHandle,
    Validation,
    Construction,
    Engine,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::Usage => "usage",
            ErrorKind::InvalidHandle => "invalid_handle",
            ErrorKind::Validation => "validation",
            ErrorKind::Construction => "construction",
            ErrorKind::Engine => "engine",
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    field: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            field: None,
            source: None,
        }
    }

    /// Shorthand for the cardinality failure raised by correlated arrays.
    pub fn count_mismatch(field: &str) -> Self {
        Self::new(ErrorKind::Validation)
            .with_message(format!("{field} must equal num_coordinates"))
            .with_field(field)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Text handed across the boundary: the message, or the kind when none was set.
    pub fn reply_text(&self) -> String {
        match (&self.message, &self.source) {
            (Some(message), Some(source)) if self.kind == ErrorKind::Construction => {
                format!("{message}: {source}")
            }
            (Some(message), _) => message.clone(),
            (None, Some(source)) => source.to_string(),
            (None, None) => self.kind.as_str().to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::InvalidHandle => 3,
        ErrorKind::Validation => 4,
        ErrorKind::Construction => 5,
        ErrorKind::Engine => 6,
    }
}
