//! Repair engine: bounded, per-kind auto-repairs with re-verification.
//!
//! Repairs are computed on the in-memory snapshot and committed with a
//! single guarded save; nothing touches the stored workbook until every
//! attempt has run. A failing attempt marks that cell failed and moves on —
//! repairs are all-or-nothing per cell, never partial across cells.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use sheetmend_core::{CellComment, CellLocation, Workbook};

use crate::error::Result;
use crate::lock::with_path_lock;
use crate::report::{
    ErrorKind, RepairAttempt, RepairDetail, RepairReport, ValidationReport,
};
use crate::store::WorkbookStore;
use crate::validate::{self, ValidateOptions};

/// Author string on repair annotations
const ANNOTATION_AUTHOR: &str = "sheetmend";

/// What the engine may do about one kind of error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    /// Rewrite the formula to trap the error and substitute a safe sentinel
    GuardWithFallback,
    /// No safe rewrite exists; annotate the cell and leave the formula alone
    AnnotateOnly,
}

impl RepairAction {
    /// Strategy name as reported in `RepairDetail::method`
    pub fn method_name(&self) -> &'static str {
        match self {
            RepairAction::GuardWithFallback => "iferror_guard",
            RepairAction::AnnotateOnly => "annotate_only",
        }
    }
}

impl ErrorKind {
    /// The registered strategy for this kind.
    ///
    /// Exhaustive by construction: adding a kind forces a decision here.
    pub fn repair_action(&self) -> RepairAction {
        match self {
            ErrorKind::Div0 => RepairAction::GuardWithFallback,
            ErrorKind::Ref
            | ErrorKind::Value
            | ErrorKind::Name
            | ErrorKind::Null
            | ErrorKind::Num
            | ErrorKind::Na
            | ErrorKind::Syntax => RepairAction::AnnotateOnly,
        }
    }
}

/// Options for one repair run
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Kinds eligible for handling; `None` means every kind
    pub kinds: Option<Vec<ErrorKind>>,
    /// Write a timestamped copy of the workbook before committing changes
    pub backup: bool,
    /// How to re-validate after the repairs are committed
    pub validate: ValidateOptions,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            kinds: None,
            backup: true,
            validate: ValidateOptions::default(),
        }
    }
}

impl RepairOptions {
    fn allows(&self, kind: ErrorKind) -> bool {
        match &self.kinds {
            None => true,
            Some(kinds) => kinds.contains(&kind),
        }
    }
}

/// Attempt repairs for every flagged cell in `report`, commit them with one
/// guarded save, and re-validate.
pub fn repair_workbook<S: WorkbookStore>(
    store: &S,
    path: &Path,
    report: &ValidationReport,
    options: &RepairOptions,
) -> Result<RepairReport> {
    let mut workbook = store.load(path)?;
    let original = workbook.clone();

    let mut attempts: Vec<RepairAttempt> = Vec::new();
    let mut details: BTreeMap<ErrorKind, RepairDetail> = BTreeMap::new();
    let mut mutated = false;

    for (&kind, summary) in &report.error_summary {
        if !options.allows(kind) {
            details.insert(
                kind,
                RepairDetail {
                    attempted: 0,
                    successful: 0,
                    method: "none",
                },
            );
            continue;
        }

        match kind.repair_action() {
            RepairAction::GuardWithFallback => {
                let mut detail = RepairDetail {
                    attempted: 0,
                    successful: 0,
                    method: RepairAction::GuardWithFallback.method_name(),
                };
                for location in &summary.locations {
                    detail.attempted += 1;
                    let succeeded = match guard_formula(&mut workbook, location) {
                        Ok(()) => {
                            detail.successful += 1;
                            mutated = true;
                            true
                        }
                        Err(err) => {
                            tracing::warn!(
                                cell = %location,
                                error = %err,
                                "repair attempt failed"
                            );
                            false
                        }
                    };
                    attempts.push(RepairAttempt {
                        location: location.clone(),
                        kind,
                        strategy: RepairAction::GuardWithFallback.method_name(),
                        succeeded,
                    });
                }
                details.insert(kind, detail);
            }
            RepairAction::AnnotateOnly => {
                for location in &summary.locations {
                    if annotate_cell(&mut workbook, location, kind).is_ok() {
                        mutated = true;
                    }
                }
                details.insert(
                    kind,
                    RepairDetail {
                        attempted: 0,
                        successful: 0,
                        method: RepairAction::AnnotateOnly.method_name(),
                    },
                );
            }
        }
    }

    let repairs_attempted = attempts.len();
    let repairs_successful = attempts.iter().filter(|a| a.succeeded).count();
    let repairs_failed = repairs_attempted - repairs_successful;

    let mut backup_location = None;
    if mutated {
        let backup = options.backup.then(|| backup_path(path));
        with_path_lock(path, || -> Result<()> {
            if let Some(backup) = &backup {
                store.save(&original, backup)?;
                tracing::info!(backup = %backup.display(), "wrote pre-repair backup");
            }
            store.save(&workbook, path)
        })?;
        backup_location = backup;
        tracing::info!(
            workbook = %path.display(),
            attempted = repairs_attempted,
            successful = repairs_successful,
            "committed repairs"
        );
    }

    // Mandatory re-verification of whatever state is now stored
    let revalidation = validate::validate_workbook(store, path, &options.validate)?;

    Ok(RepairReport {
        repairs_attempted,
        repairs_successful,
        repairs_failed,
        remaining_errors: revalidation.total_errors,
        backup_location,
        details,
        attempts,
    })
}

/// Rewrite the formula at `location` to substitute 0 when it errors.
fn guard_formula(workbook: &mut Workbook, location: &CellLocation) -> Result<()> {
    let address = location.address.to_string();
    let sheet = workbook
        .worksheet_by_name_mut(&location.sheet)
        .ok_or_else(|| sheetmend_core::Error::SheetNotFound(location.sheet.clone()))?;

    let text = sheet
        .formula(&address)?
        .ok_or_else(|| sheetmend_core::Error::NotAFormula(location.to_string()))?;

    let expr = text.trim_start_matches('=').to_string();
    let guarded = format!("=IFERROR({}, 0)", expr);
    sheet.set_cell_formula(&address, &guarded)?;
    Ok(())
}

/// Attach the explanatory note for a kind with no safe rewrite.
fn annotate_cell(
    workbook: &mut Workbook,
    location: &CellLocation,
    kind: ErrorKind,
) -> Result<()> {
    let address = location.address.to_string();
    let sheet = workbook
        .worksheet_by_name_mut(&location.sheet)
        .ok_or_else(|| sheetmend_core::Error::SheetNotFound(location.sheet.clone()))?;

    let comment = CellComment::new(ANNOTATION_AUTHOR, annotation_text(kind));
    sheet.set_comment(&address, comment)?;
    Ok(())
}

/// The note text per kind. Exhaustive so a new kind cannot ship without
/// deciding what its annotation says.
fn annotation_text(kind: ErrorKind) -> String {
    let advice = match kind {
        ErrorKind::Div0 => "Division by zero; guard the divisor",
        ErrorKind::Ref => "Dangling reference: the formula points at a cell or sheet that no longer exists",
        ErrorKind::Value => "Operand has the wrong type for this formula",
        ErrorKind::Name => "Unrecognized function or defined name",
        ErrorKind::Null => "Ranges in this formula do not intersect",
        ErrorKind::Num => "Numeric argument is invalid or out of range",
        ErrorKind::Na => "A lookup found no matching value",
        ErrorKind::Syntax => "Formula text is missing its leading '='",
    };
    format!("{} ({}); not auto-repaired", advice, kind)
}

/// `<stem>_backup_<timestamp>.<ext>` next to the original.
fn backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%dT%H%M%S");
    backup_path_with_stamp(path, &stamp.to_string())
}

fn backup_path_with_stamp(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_backup_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_backup_{}", stem, stamp),
    };
    path.with_file_name(name)
}
