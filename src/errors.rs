//! Error types for the rigging crate

use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing, resolving, or converging resources
#[derive(Error, Debug)]
pub enum Error {
    /// A string could not be parsed as a fully qualified resource name
    #[error("invalid resource name '{fqrn}': {reason}")]
    InvalidFqrn { fqrn: String, reason: String },

    /// A resource with the same ID is already registered
    #[error("resource '{0}' already exists")]
    ResourceExists(String),

    /// No resource matches the given address
    #[error("resource '{0}' not found")]
    ResourceNotFound(String),

    /// A reference in a resource body could not be resolved
    #[error("unresolved reference '{reference}' in {file}:{line}:{column}")]
    UnresolvedReference {
        reference: String,
        file: String,
        line: usize,
        column: usize,
    },

    /// Two or more resources depend on each other
    #[error("circular reference: {0}")]
    CircularReference(String),

    /// A destroy candidate is still referenced by surviving resources
    #[error("resource '{resource}' cannot be destroyed, still referenced by '{referrer}'")]
    DependencyViolation { resource: String, referrer: String },

    /// A resource body could not be decoded against the evaluation context
    #[error("failed to decode resource '{resource}': {reason}")]
    Decode { resource: String, reason: String },

    /// No provider is registered for a resource type
    #[error("no provider registered for resource type '{0}'")]
    ProviderNotFound(String),

    /// A provider operation failed
    #[error("{operation} failed for resource '{resource}': {source}")]
    Lifecycle {
        operation: String,
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for rigging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Interpolation-only issue, the run continued
    Warning,
    /// Structural or lifecycle failure
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single per-resource diagnostic produced during a walk or apply
#[derive(Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Canonical ID of the resource the diagnostic belongs to
    pub resource_id: String,
    /// Source position of the resource declaration, if known
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    /// Create an error-severity diagnostic for a resource
    pub fn error(resource_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            severity: Severity::Error,
            resource_id: resource_id.into(),
            file: None,
            line: 0,
            column: 0,
            message: message.to_string(),
        }
    }

    /// Create a warning-severity diagnostic for a resource
    pub fn warning(resource_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            severity: Severity::Warning,
            resource_id: resource_id.into(),
            file: None,
            line: 0,
            column: 0,
            message: message.to_string(),
        }
    }

    /// Attach the source position of the declaring block
    pub fn at(mut self, file: impl Into<String>, line: usize, column: usize) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(
                f,
                "{}: {} ({}:{}:{}): {}",
                self.severity, self.resource_id, file, self.line, self.column, self.message
            ),
            None => write!(f, "{}: {}: {}", self.severity, self.resource_id, self.message),
        }
    }
}

/// Aggregate of all per-resource diagnostics from a single run
///
/// Returned once the walk drains so callers see every failure,
/// not just the first one.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.diags.extend(other.diags);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Check whether any diagnostic is error severity
    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(|d| d.severity == Severity::Error)
    }

    /// Turn the aggregate into a `Result`, erroring if any
    /// error-severity diagnostic is present
    pub fn into_result(self) -> std::result::Result<(), Diagnostics> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.diags.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self { diags: vec![diag] }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diags.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_severity_split() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("resource.network.cloud", "unused value"));
        assert!(!diags.has_errors());
        assert!(diags.into_result().is_ok());

        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("resource.network.cloud", "unused value"));
        diags.push(Diagnostic::error("resource.container.app", "create failed"));
        assert!(diags.has_errors());
        assert_eq!(diags.into_result().unwrap_err().len(), 2);
    }

    #[test]
    fn test_diagnostic_display_with_position() {
        let diag = Diagnostic::error("resource.container.app", "boom").at("main.hcl", 4, 2);
        assert_eq!(
            diag.to_string(),
            "error: resource.container.app (main.hcl:4:2): boom"
        );
    }
}
