//! Validation orchestrator.
//!
//! Chooses between the external recalculation bridge and the static
//! fallback validator, normalizes both outcomes into the canonical
//! [`ValidationReport`] shape, and converts every infrastructure failure on
//! the external path into a degradation instead of an error.

use std::path::Path;

use sheetmend_recalc::{RecalcBridge, RecalcConfig, RecalcError, RecalcOutcome};

use crate::aggregate::{self, Detected, Finding};
use crate::error::Result;
use crate::fallback;
use crate::report::{ValidationMethod, ValidationReport, ValidationStatus};
use crate::store::WorkbookStore;

/// Which detection path the caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodChoice {
    /// Try the external engine, degrade to static inspection on any failure
    #[default]
    Auto,
    /// External engine only
    External,
    /// Static inspection only
    Fallback,
}

/// Options for one validation run
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Detection path selection
    pub method: MethodChoice,
    /// Bridge configuration; its `timeout` is the hard wall-clock ceiling
    /// for the external path
    pub recalc: RecalcConfig,
}

/// Validate the workbook at `path`.
///
/// Never fails for reasons of engine availability: with `Auto`, a bridge
/// failure degrades to the fallback validator; with a forced `External`, it
/// yields a `status = error` report carrying the failure as a note. The
/// only hard error is a workbook the store cannot load at all.
pub fn validate_workbook<S: WorkbookStore>(
    store: &S,
    path: &Path,
    options: &ValidateOptions,
) -> Result<ValidationReport> {
    match options.method {
        MethodChoice::External => match run_external(path, &options.recalc) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::warn!(error = %err, "forced external validation failed");
                Ok(external_failure_report(&err))
            }
        },
        MethodChoice::Fallback => run_fallback(store, path, false),
        MethodChoice::Auto => match run_external(path, &options.recalc) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::warn!(error = %err, "external validation unavailable, using static fallback");
                run_fallback(store, path, true)
            }
        },
    }
}

/// Drive the bridge and aggregate its findings.
fn run_external(
    path: &Path,
    config: &RecalcConfig,
) -> std::result::Result<ValidationReport, RecalcError> {
    let bridge = RecalcBridge::new(config.clone());
    let outcome: RecalcOutcome = bridge.recalculate(path)?;

    let findings = outcome
        .findings
        .into_iter()
        .map(|f| Finding::new(f.location, Detected::Literal(f.error)));

    Ok(aggregate::aggregate(
        findings,
        outcome.total_formulas,
        ValidationMethod::External,
    ))
}

/// Load a snapshot and run the static validator.
fn run_fallback<S: WorkbookStore>(
    store: &S,
    path: &Path,
    degraded: bool,
) -> Result<ValidationReport> {
    let workbook = store.load(path)?;
    let scan = fallback::scan_workbook(&workbook);

    let mut report = aggregate::aggregate(
        scan.findings,
        scan.total_formulas,
        ValidationMethod::Fallback,
    );
    report.note = Some(fallback::confidence_note(scan.total_formulas));
    report.fallback_recommended = degraded;
    Ok(report)
}

/// The degraded report for a forced external run that could not produce
/// results.
fn external_failure_report(err: &RecalcError) -> ValidationReport {
    ValidationReport {
        status: ValidationStatus::Error,
        total_formulas: 0,
        total_errors: 0,
        validation_method: ValidationMethod::External,
        error_summary: Default::default(),
        note: Some(format!("External validation failed: {}", err)),
        fallback_recommended: true,
    }
}
