//! Static fallback validator.
//!
//! Cannot trigger a recalculation; inspects a loaded snapshot only. Errors
//! it can see are the ones already baked into the file: cached error
//! results, formulas missing their leading `=`, and references to sheets
//! that do not exist.

use once_cell::sync::Lazy;
use regex::Regex;
use sheetmend_core::{CellLocation, Workbook};

use crate::aggregate::{Detected, Finding};

/// Sheet references in formula text: `'Quoted Name'!` or a bare `Name!`.
///
/// String literals are not stripped first; a quoted mention of a missing
/// sheet still flags, which matches the static validator's
/// better-safe-than-silent posture.
static SHEET_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:'([^']+)'|([A-Za-z_][A-Za-z0-9_]*))!").expect("static pattern")
});

/// Result of one static scan
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Formula cells inspected
    pub total_formulas: usize,
    /// Raw findings, in row-major sheet order
    pub findings: Vec<Finding>,
}

/// Statically inspect every formula cell in the workbook.
///
/// Running this twice on the same snapshot yields identical results; the
/// scan reads nothing outside the workbook.
pub fn scan_workbook(workbook: &Workbook) -> Scan {
    let mut scan = Scan::default();

    for sheet in workbook.worksheets() {
        for (addr, text, value) in sheet.formula_cells() {
            scan.total_formulas += 1;
            let location = CellLocation::new(sheet.name(), addr);

            if !text.starts_with('=') {
                scan.findings
                    .push(Finding::new(location.clone(), Detected::MissingEquals));
            }

            for captures in SHEET_REF.captures_iter(text) {
                let Some(name) = captures.get(1).or_else(|| captures.get(2)) else {
                    continue;
                };
                if !workbook.has_sheet(name.as_str()) {
                    scan.findings
                        .push(Finding::new(location.clone(), Detected::UnknownSheetRef));
                }
            }

            if let Some(error) = value.cached_error() {
                scan.findings
                    .push(Finding::new(location.clone(), Detected::Literal(error)));
            }
        }
    }

    scan
}

/// The reduced-confidence note every fallback report carries.
pub fn confidence_note(total_formulas: usize) -> String {
    format!(
        "Static validation inspected {} formula(s) without recalculating; \
         only errors already recorded in the file are visible",
        total_formulas
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetmend_core::{CellError, CellValue};

    fn workbook_with(cells: &[(&str, CellValue)]) -> Workbook {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        for (addr, value) in cells {
            sheet.set_cell_formula_raw(addr, value.clone()).unwrap();
        }
        wb
    }

    #[test]
    fn test_counts_formulas_only() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("A2", "=A1*2").unwrap();
        sheet.set_cell_value("A3", "text").unwrap();

        let scan = scan_workbook(&wb);
        assert_eq!(scan.total_formulas, 1);
        assert!(scan.findings.is_empty());
    }

    #[test]
    fn test_cached_error_literal() {
        let wb = workbook_with(&[(
            "A1",
            CellValue::formula_with_cached("=1/0", CellError::Div0.into()),
        )]);
        let scan = scan_workbook(&wb);
        assert_eq!(
            scan.findings,
            vec![Finding::new(
                CellLocation::parse("Sheet1!A1").unwrap(),
                Detected::Literal(CellError::Div0)
            )]
        );
    }

    #[test]
    fn test_missing_equals() {
        let wb = workbook_with(&[("A1", CellValue::formula("SUM(B1:B2)"))]);
        let scan = scan_workbook(&wb);
        assert_eq!(scan.findings[0].detected, Detected::MissingEquals);
    }

    #[test]
    fn test_unknown_sheet_reference() {
        let wb = workbook_with(&[("B1", CellValue::formula("=Sheet9!A1"))]);
        let scan = scan_workbook(&wb);
        assert_eq!(scan.findings[0].detected, Detected::UnknownSheetRef);
        assert_eq!(scan.findings[0].location.to_string(), "Sheet1!B1");
    }

    #[test]
    fn test_quoted_sheet_reference() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Q1 Data").unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_formula("A1", "='Q1 Data'!B2").unwrap();
        sheet.set_cell_formula("A2", "='Missing Sheet'!B2").unwrap();

        let scan = scan_workbook(&wb);
        assert_eq!(scan.findings.len(), 1);
        assert_eq!(scan.findings[0].location.to_string(), "Sheet1!A2");
    }

    #[test]
    fn test_known_sheet_reference_is_clean() {
        let mut wb = Workbook::new();
        wb.add_worksheet("Data").unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_formula("A1", "=Data!B2+1").unwrap();

        let scan = scan_workbook(&wb);
        assert!(scan.findings.is_empty());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let wb = workbook_with(&[
            (
                "A1",
                CellValue::formula_with_cached("=1/0", CellError::Div0.into()),
            ),
            ("B1", CellValue::formula("=Sheet9!A1")),
        ]);

        let first = scan_workbook(&wb);
        let second = scan_workbook(&wb);
        assert_eq!(first.total_formulas, second.total_formulas);
        assert_eq!(first.findings, second.findings);
    }
}
