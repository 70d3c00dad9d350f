use indexmap::IndexSet;
use serde::Serialize;
use tracing::warn;

use crate::{Destination, OrderKind, schema};

/// Outcome of comparing uploaded columns against a registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderDiagnostic {
    pub ok: bool,
    /// Expected columns absent from the upload, in schema order.
    pub missing: Vec<String>,
    /// Uploaded columns the schema does not know, in upload order.
    pub unexpected: Vec<String>,
}

impl HeaderDiagnostic {
    /// Human-readable problem list, empty when the headers match.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("Missing: {}", self.missing.join(", ")));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("Unexpected: {}", self.unexpected.join(", ")));
        }
        parts.join(" | ")
    }
}

/// Header state for a destination/kind selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderCheck {
    /// Nothing uploaded yet.
    NoUpload,
    /// The registry has no rules for this selection. Informational only.
    NoRules {
        destination: Destination,
        kind: OrderKind,
    },
    Checked(HeaderDiagnostic),
}

fn normalize<S: AsRef<str>>(columns: &[S]) -> IndexSet<String> {
    columns
        .iter()
        .map(|column| column.as_ref().to_lowercase())
        .collect()
}

pub fn validate<E: AsRef<str>, A: AsRef<str>>(expected: &[E], actual: &[A]) -> HeaderDiagnostic {
    let expected = normalize(expected);
    let actual = normalize(actual);

    let missing: Vec<String> = expected
        .iter()
        .filter(|column| !actual.contains(*column))
        .cloned()
        .collect();
    let unexpected: Vec<String> = actual
        .iter()
        .filter(|column| !expected.contains(*column))
        .cloned()
        .collect();

    HeaderDiagnostic {
        ok: missing.is_empty() && unexpected.is_empty(),
        missing,
        unexpected,
    }
}

pub fn check<S: AsRef<str>>(
    destination: Destination,
    kind: OrderKind,
    columns: &[S],
) -> HeaderCheck {
    if columns.is_empty() {
        return HeaderCheck::NoUpload;
    }

    match schema::lookup(destination, kind) {
        Ok(expected) => HeaderCheck::Checked(validate(expected, columns)),
        Err(_) => {
            warn!("No validation rules found for {destination} {kind}");
            HeaderCheck::NoRules { destination, kind }
        }
    }
}
