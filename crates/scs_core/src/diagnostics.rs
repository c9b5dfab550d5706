//! Non-fatal decode warnings.
//!
//! A [`Diagnostics`] collector is created per load and returned with the
//! decoded records. Recording a diagnostic also emits it through `log`.

use std::fmt;

use serde::Serialize;

/// What went wrong.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Unknown property in a known section. The property is dropped.
    UnknownField { key: String },

    /// A declared count differs from what was actually parsed.
    CountMismatch {
        field: String,
        declared: Option<i64>,
        actual: usize,
    },

    /// A record has no key. Keyless materials, attributes and textures are
    /// kept apart from the keyed ones; a part without a name is dropped.
    MissingField { key: String },

    /// A known property holds a value of the wrong type. The field is left absent.
    InvalidValue { key: String },
}

/// One warning with the section path it occurred in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Slash-joined section path, e.g. `Look/Material/Attribute`
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnknownField { key } => {
                write!(f, "Unknown property in \"{}\" data: \"{}\"", self.context, key)
            }
            DiagnosticKind::CountMismatch { field, declared, actual } => match declared {
                Some(declared) => write!(
                    f,
                    "{} in \"{}\" declares {} but {} were found",
                    field, self.context, declared, actual
                ),
                None => write!(
                    f,
                    "{} in \"{}\" is not declared but {} were found",
                    field, self.context, actual
                ),
            },
            DiagnosticKind::MissingField { key } => {
                write!(f, "Missing \"{}\" in \"{}\" data", key, self.context)
            }
            DiagnosticKind::InvalidValue { key } => {
                write!(f, "Invalid value for \"{}\" in \"{}\" data", key, self.context)
            }
        }
    }
}

/// Ordered list of warnings for a single load.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn push(&mut self, context: &str, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            kind,
            context: context.to_string(),
        };
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn unknown_field(&mut self, context: &str, key: &str) {
        self.push(context, DiagnosticKind::UnknownField { key: key.to_string() });
    }

    pub fn missing_field(&mut self, context: &str, key: &str) {
        self.push(context, DiagnosticKind::MissingField { key: key.to_string() });
    }

    pub fn invalid_value(&mut self, context: &str, key: &str) {
        self.push(context, DiagnosticKind::InvalidValue { key: key.to_string() });
    }

    pub fn count_mismatch(&mut self, context: &str, field: &str, declared: Option<i64>, actual: usize) {
        self.push(
            context,
            DiagnosticKind::CountMismatch {
                field: field.to_string(),
                declared,
                actual,
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics matching `pred`.
    pub fn count_where(&self, pred: impl Fn(&DiagnosticKind) -> bool) -> usize {
        self.entries.iter().filter(|d| pred(&d.kind)).count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.unknown_field("Look", "Foo");
        diagnostics.count_mismatch("Look/Material", "AttributeCount", Some(2), 1);

        let kinds: Vec<_> = diagnostics.iter().map(|d| d.context.as_str()).collect();
        assert_eq!(kinds, vec!["Look", "Look/Material"]);
        assert_eq!(
            diagnostics.count_where(|k| matches!(k, DiagnosticKind::UnknownField { .. })),
            1
        );
    }

    #[test]
    fn test_display_names_section_and_key() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.unknown_field("Look/Material", "Glossy");

        let text = diagnostics.iter().next().unwrap().to_string();
        assert!(text.contains("Look/Material"));
        assert!(text.contains("Glossy"));
    }
}
