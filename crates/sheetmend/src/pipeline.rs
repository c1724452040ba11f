//! Pipeline façade: one place to sanitize, validate, and repair, with a
//! bounded audit trail of what ran.

use std::path::Path;

use crate::audit::AuditLog;
use crate::error::{Error, Result};
use crate::report::{PipelineReport, ValidationReport};
use crate::repair::{self, RepairOptions};
use crate::sanitize::{self, Sanitized};
use crate::store::WorkbookStore;
use crate::validate::{self, ValidateOptions};

/// The validation-and-repair pipeline over one workbook store.
///
/// The store is owned; workbooks are borrowed per call — loaded, inspected,
/// possibly mutated in memory, and committed with one guarded save. Each
/// operation is recorded in the audit log.
#[derive(Debug)]
pub struct Pipeline<S: WorkbookStore> {
    store: S,
    options: ValidateOptions,
    audit: AuditLog,
}

impl<S: WorkbookStore> Pipeline<S> {
    /// Create a pipeline over `store` with the given validation options
    pub fn new(store: S, options: ValidateOptions) -> Self {
        Self {
            store,
            options,
            audit: AuditLog::default(),
        }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The audit trail, oldest-first
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Screen a formula before it is written anywhere.
    ///
    /// A rejection is recorded and returned as [`Error::Security`] so the
    /// caller can branch (for example, require an explicit opt-in).
    pub fn check_formula(&mut self, formula: &str, allow_external: bool) -> Result<Sanitized> {
        match sanitize::sanitize_formula(formula, allow_external) {
            Ok(sanitized) => {
                let detail = if sanitized.warnings.is_empty() {
                    "clean".to_string()
                } else {
                    format!("passed with warnings: {}", sanitized.warnings.join("; "))
                };
                self.audit.record("sanitize", detail);
                Ok(sanitized)
            }
            Err(err) => {
                self.audit
                    .record("sanitize", format!("rejected: {}", err.warnings.join("; ")));
                Err(Error::Security(err))
            }
        }
    }

    /// Validate the workbook at `path`
    pub fn validate(&mut self, path: &Path) -> Result<ValidationReport> {
        let report = validate::validate_workbook(&self.store, path, &self.options)?;
        self.audit.record(
            "validate",
            format!(
                "{}: {} formulas, {} errors ({:?})",
                path.display(),
                report.total_formulas,
                report.total_errors,
                report.validation_method
            ),
        );
        Ok(report)
    }

    /// Validate and, when errors are found, repair — returning the combined
    /// externally visible result.
    pub fn validate_and_repair(
        &mut self,
        path: &Path,
        repair_options: Option<RepairOptions>,
    ) -> Result<PipelineReport> {
        let validation = self.validate(path)?;

        let repair = match repair_options {
            Some(options) if validation.total_errors > 0 => {
                let report = repair::repair_workbook(&self.store, path, &validation, &options)?;
                self.audit.record(
                    "repair",
                    format!(
                        "{}: {}/{} repairs succeeded, {} errors remain",
                        path.display(),
                        report.repairs_successful,
                        report.repairs_attempted,
                        report.remaining_errors
                    ),
                );
                Some(report)
            }
            _ => None,
        };

        Ok(PipelineReport::build(Vec::new(), validation, repair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;
    use crate::store::MemoryStore;
    use crate::validate::MethodChoice;
    use sheetmend_core::{CellError, CellValue, Workbook};
    use std::path::PathBuf;

    fn pipeline_with_errors() -> (Pipeline<MemoryStore>, PathBuf) {
        let mut wb = Workbook::new();
        wb.worksheet_mut(0)
            .unwrap()
            .set_cell_formula_raw(
                "A1",
                CellValue::formula_with_cached("=1/0", CellError::Div0.into()),
            )
            .unwrap();

        let store = MemoryStore::new();
        let path = PathBuf::from("/model.xlsx");
        store.insert(path.clone(), wb);

        let options = ValidateOptions {
            method: MethodChoice::Fallback,
            ..Default::default()
        };
        (Pipeline::new(store, options), path)
    }

    #[test]
    fn test_check_formula_records_audit() {
        let (mut pipeline, _) = pipeline_with_errors();

        pipeline.check_formula("=A1+1", false).unwrap();
        let err = pipeline.check_formula("=WEBSERVICE(\"u\")", false);
        assert!(matches!(err, Err(Error::Security(_))));

        let ops: Vec<&str> = pipeline.audit().entries().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["sanitize", "sanitize"]);
    }

    #[test]
    fn test_validate_and_repair_outcome() {
        let (mut pipeline, path) = pipeline_with_errors();

        let options = RepairOptions {
            backup: false,
            validate: ValidateOptions {
                method: MethodChoice::Fallback,
                ..Default::default()
            },
            ..Default::default()
        };
        let report = pipeline.validate_and_repair(&path, Some(options)).unwrap();

        assert_eq!(report.outcome, Outcome::Success);
        let repair = report.repair.expect("repair ran");
        assert_eq!(repair.repairs_successful, 1);
        assert_eq!(repair.remaining_errors, 0);

        let ops: Vec<&str> = pipeline.audit().entries().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["validate", "repair"]);
    }

    #[test]
    fn test_validate_without_repair() {
        let (mut pipeline, path) = pipeline_with_errors();
        let report = pipeline.validate_and_repair(&path, None).unwrap();
        assert_eq!(report.outcome, Outcome::ErrorsRemain);
        assert!(report.repair.is_none());
    }
}
