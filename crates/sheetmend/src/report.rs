//! Report shapes shared by both detection paths and the repair engine.
//!
//! These are the externally visible results: `ValidationReport` and
//! `RepairReport` serialize to the JSON shapes calling tools consume, and
//! `PipelineReport` is the combined result the report builder assembles.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};
use sheetmend_core::{CellError, CellLocation};

/// The closed taxonomy of reportable error kinds.
///
/// The seven spreadsheet error literals plus the synthetic `SyntaxError`
/// that only static analysis can produce. Unknown-sheet references are
/// canonicalized to [`ErrorKind::Ref`] before they reach a report, so this
/// enum is exactly the set of keys `error_summary` can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// #DIV/0!
    Div0,
    /// #REF! (including unknown-sheet references found statically)
    Ref,
    /// #VALUE!
    Value,
    /// #NAME?
    Name,
    /// #NULL!
    Null,
    /// #NUM!
    Num,
    /// #N/A
    Na,
    /// Formula missing its leading `=` (static analysis only)
    Syntax,
}

impl ErrorKind {
    /// The literal token this kind reports as
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Div0 => "#DIV/0!",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Value => "#VALUE!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Null => "#NULL!",
            ErrorKind::Num => "#NUM!",
            ErrorKind::Na => "#N/A",
            ErrorKind::Syntax => "SyntaxError",
        }
    }

    /// Parse a report token back into a kind (used for allow-lists)
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("SyntaxError") {
            return Some(ErrorKind::Syntax);
        }
        CellError::parse(s).map(ErrorKind::from)
    }
}

impl From<CellError> for ErrorKind {
    fn from(e: CellError) -> Self {
        match e {
            CellError::Div0 => ErrorKind::Div0,
            CellError::Ref => ErrorKind::Ref,
            CellError::Value => ErrorKind::Value,
            CellError::Name => ErrorKind::Name,
            CellError::Null => ErrorKind::Null,
            CellError::Num => ErrorKind::Num,
            CellError::Na => ErrorKind::Na,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Overall status of one validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Formulas present, no errors found
    Success,
    /// At least one error cell
    ErrorsFound,
    /// Nothing to validate (no formula cells)
    Warning,
    /// The requested detection path could not run at all
    Error,
}

/// Which detection path produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMethod {
    /// True recalculation through the external engine
    External,
    /// Static inspection of cached results
    Fallback,
}

/// Per-kind slice of a validation report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    /// Number of distinct flagged cells
    pub count: usize,
    /// Flagged cells, deduplicated, in detection order
    pub locations: Vec<CellLocation>,
}

/// The canonical validation result, identical in shape for both detection
/// paths. Built once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub total_formulas: usize,
    pub total_errors: usize,
    pub validation_method: ValidationMethod,
    pub error_summary: BTreeMap<ErrorKind, KindSummary>,
    /// Informational note (reduced-confidence caveat on the fallback path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set when an external attempt degraded and static results should be
    /// treated with suspicion
    #[serde(skip_serializing_if = "is_false")]
    pub fallback_recommended: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One per-cell repair attempt, in the order the engine worked
#[derive(Debug, Clone, PartialEq)]
pub struct RepairAttempt {
    pub location: CellLocation,
    pub kind: ErrorKind,
    pub strategy: &'static str,
    pub succeeded: bool,
}

/// Per-kind repair accounting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairDetail {
    pub attempted: usize,
    pub successful: usize,
    /// Strategy name, `"annotate_only"` for kinds without a safe rewrite,
    /// `"none"` for kinds outside the allow-list
    pub method: &'static str,
}

/// The result of one repair engine run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairReport {
    pub repairs_attempted: usize,
    pub repairs_successful: usize,
    pub repairs_failed: usize,
    /// Error count from the mandatory post-repair re-validation
    pub remaining_errors: usize,
    /// Present iff a backup was written
    pub backup_location: Option<PathBuf>,
    pub details: BTreeMap<ErrorKind, RepairDetail>,
    /// Ordered per-cell attempts; in-memory detail, not part of the wire
    /// shape
    #[serde(skip)]
    pub attempts: Vec<RepairAttempt>,
}

/// Outcome category consumed by calling tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No remaining errors after any requested repair
    Success,
    /// Validation or repair left unresolved errors
    ErrorsRemain,
    /// The sanitizer blocked a formula
    SecurityRejected,
}

/// The externally visible combined result: sanitizer warnings, validation,
/// and optional repair, folded into one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sanitizer_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairReport>,
}

impl PipelineReport {
    /// Assemble the combined result. Overall success requires zero errors
    /// remaining after any requested repair.
    pub fn build(
        sanitizer_warnings: Vec<String>,
        validation: ValidationReport,
        repair: Option<RepairReport>,
    ) -> Self {
        let remaining = match &repair {
            Some(r) => r.remaining_errors,
            None => validation.total_errors,
        };
        let outcome = if remaining == 0 && validation.status != ValidationStatus::Error {
            Outcome::Success
        } else {
            Outcome::ErrorsRemain
        };

        Self {
            outcome,
            sanitizer_warnings,
            validation: Some(validation),
            repair,
        }
    }

    /// The result shape for a formula the sanitizer refused to pass through.
    pub fn security_rejected(warnings: Vec<String>) -> Self {
        Self {
            outcome: Outcome::SecurityRejected,
            sanitizer_warnings: warnings,
            validation: None,
            repair: None,
        }
    }
}
