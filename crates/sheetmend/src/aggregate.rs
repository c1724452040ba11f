//! Error aggregation: raw findings from either detection path canonicalized
//! into one [`ValidationReport`] shape.

use std::collections::BTreeMap;
use std::collections::HashSet;

use sheetmend_core::{CellError, CellLocation};

use crate::report::{ErrorKind, KindSummary, ValidationMethod, ValidationReport, ValidationStatus};

/// What a detection path actually observed at a cell, before
/// canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detected {
    /// The cell's displayed result was one of the error literals
    Literal(CellError),
    /// The formula text is missing its leading `=`
    MissingEquals,
    /// The formula references a sheet the workbook does not contain
    UnknownSheetRef,
}

impl Detected {
    /// Canonical report kind for this observation.
    ///
    /// Unknown-sheet references report as `#REF!`; the missing-`=` case
    /// stays its own synthetic kind.
    pub fn canonical_kind(&self) -> ErrorKind {
        match self {
            Detected::Literal(e) => ErrorKind::from(*e),
            Detected::MissingEquals => ErrorKind::Syntax,
            Detected::UnknownSheetRef => ErrorKind::Ref,
        }
    }
}

/// One raw finding: where, and what was observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: CellLocation,
    pub detected: Detected,
}

impl Finding {
    pub fn new(location: CellLocation, detected: Detected) -> Self {
        Self { location, detected }
    }
}

/// Fold raw findings into the canonical report shape.
///
/// Identical `(kind, location)` pairs are deduplicated with first-seen
/// order preserved; `total_errors` is the sum over the per-kind counts by
/// construction.
pub fn aggregate(
    findings: impl IntoIterator<Item = Finding>,
    total_formulas: usize,
    method: ValidationMethod,
) -> ValidationReport {
    let mut summary: BTreeMap<ErrorKind, KindSummary> = BTreeMap::new();
    let mut seen: HashSet<(ErrorKind, CellLocation)> = HashSet::new();

    for finding in findings {
        let kind = finding.detected.canonical_kind();
        if !seen.insert((kind, finding.location.clone())) {
            continue;
        }

        let entry = summary.entry(kind).or_insert_with(|| KindSummary {
            count: 0,
            locations: Vec::new(),
        });
        entry.count += 1;
        entry.locations.push(finding.location);
    }

    let total_errors: usize = summary.values().map(|s| s.count).sum();

    let status = if total_errors > 0 {
        ValidationStatus::ErrorsFound
    } else if total_formulas == 0 {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Success
    };

    ValidationReport {
        status,
        total_formulas,
        total_errors,
        validation_method: method,
        error_summary: summary,
        note: None,
        fallback_recommended: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> CellLocation {
        CellLocation::parse(s).unwrap()
    }

    #[test]
    fn test_empty_workbook_is_warning() {
        let report = aggregate(Vec::new(), 0, ValidationMethod::Fallback);
        assert_eq!(report.status, ValidationStatus::Warning);
        assert_eq!(report.total_formulas, 0);
        assert_eq!(report.total_errors, 0);
    }

    #[test]
    fn test_clean_formulas_are_success() {
        let report = aggregate(Vec::new(), 5, ValidationMethod::External);
        assert_eq!(report.status, ValidationStatus::Success);
    }

    #[test]
    fn test_dedup_and_ordering() {
        let findings = vec![
            Finding::new(loc("Sheet1!A1"), Detected::Literal(CellError::Div0)),
            Finding::new(loc("Sheet1!B1"), Detected::Literal(CellError::Div0)),
            // Exact duplicate of the first finding
            Finding::new(loc("Sheet1!A1"), Detected::Literal(CellError::Div0)),
        ];
        let report = aggregate(findings, 3, ValidationMethod::External);

        let summary = &report.error_summary[&ErrorKind::Div0];
        assert_eq!(summary.count, 2);
        assert_eq!(
            summary.locations,
            vec![loc("Sheet1!A1"), loc("Sheet1!B1")]
        );
        assert_eq!(report.total_errors, 2);
    }

    #[test]
    fn test_same_cell_different_kinds_both_kept() {
        let findings = vec![
            Finding::new(loc("Sheet1!A1"), Detected::MissingEquals),
            Finding::new(loc("Sheet1!A1"), Detected::Literal(CellError::Value)),
        ];
        let report = aggregate(findings, 1, ValidationMethod::Fallback);
        assert_eq!(report.total_errors, 2);
        assert!(report.error_summary.contains_key(&ErrorKind::Syntax));
        assert!(report.error_summary.contains_key(&ErrorKind::Value));
    }

    #[test]
    fn test_unknown_sheet_canonicalizes_to_ref() {
        let findings = vec![Finding::new(loc("Sheet1!B1"), Detected::UnknownSheetRef)];
        let report = aggregate(findings, 1, ValidationMethod::Fallback);
        assert_eq!(report.error_summary[&ErrorKind::Ref].count, 1);
        assert_eq!(report.status, ValidationStatus::ErrorsFound);
    }

    #[test]
    fn test_total_errors_matches_sum() {
        let findings = vec![
            Finding::new(loc("A!A1"), Detected::Literal(CellError::Div0)),
            Finding::new(loc("A!A2"), Detected::Literal(CellError::Na)),
            Finding::new(loc("A!A3"), Detected::UnknownSheetRef),
        ];
        let report = aggregate(findings, 10, ValidationMethod::External);
        let sum: usize = report.error_summary.values().map(|s| s.count).sum();
        assert_eq!(report.total_errors, sum);
    }
}
