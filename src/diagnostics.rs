// src/diagnostics.rs

//! User-facing diagnostics.
//!
//! Every phase of a test run appends to one ordered [`Diagnostics`]
//! collection. Fatal conditions are returned as a single [`Diagnostic`] in
//! the `Err` arm of a `Result`; the caller appends it last and stops.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Configuration attribute this diagnostic is attributed to, if any.
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// A diagnostic not tied to any configuration attribute.
    pub fn sourceless(
        severity: Severity,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    /// An error attributed to a named configuration attribute (e.g. `source`).
    pub fn attribute(
        summary: impl Into<String>,
        detail: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Wrap an arbitrary error with a summary describing what was attempted.
    ///
    /// The error's display text is kept verbatim as the detail.
    pub fn general_error(summary: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::sourceless(Severity::Error, summary, err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{label}: {}", self.summary)?;
        if let Some(attr) = &self.attribute {
            write!(f, " (attribute \"{attr}\")")?;
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n{}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered, append-only collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_error_keeps_error_text_verbatim() {
        let diag = Diagnostic::general_error("Failed to retrieve logs", "connection reset");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Failed to retrieve logs");
        assert_eq!(diag.detail, "connection reset");
        assert!(diag.attribute.is_none());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::sourceless(Severity::Warning, "heads up", ""));
        assert!(!diags.has_errors());

        diags.push(Diagnostic::attribute("bad source", "", "source"));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn display_includes_attribute_and_detail() {
        let diag = Diagnostic::attribute("Invalid source", "missing provider", "source");
        let text = diag.to_string();
        assert!(text.starts_with("Error: Invalid source (attribute \"source\")"));
        assert!(text.ends_with("missing provider"));
    }
}
