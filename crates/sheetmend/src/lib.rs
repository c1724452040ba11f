//! # sheetmend
//!
//! Validation and bounded auto-repair for spreadsheet formulas.
//!
//! The pipeline finds error cells (`#DIV/0!`, `#REF!`, and friends) and
//! attempts a constrained set of safe repairs with re-verification. True
//! recalculation is delegated to an external engine through
//! [`sheetmend-recalc`](sheetmend_recalc); when the engine is unavailable,
//! a static in-process checker inspects the results already cached in the
//! file. Both paths produce the same [`ValidationReport`] shape.
//!
//! ```text
//! formula text ── sanitize ──► write path (caller's)
//!
//! validate(path) ── orchestrator ──► { external bridge | static fallback }
//!                       │                      │
//!                       └── aggregate ──► ValidationReport
//!                                              │
//!                              repair ──► RepairReport (re-verified)
//!                                              │
//!                                       PipelineReport
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sheetmend::{MemoryStore, MethodChoice, Pipeline, ValidateOptions};
//! use sheetmend_core::Workbook;
//!
//! let store = MemoryStore::new();
//! store.insert("/model.xlsx", Workbook::new());
//!
//! let options = ValidateOptions {
//!     method: MethodChoice::Fallback,
//!     ..Default::default()
//! };
//! let mut pipeline = Pipeline::new(store, options);
//! let report = pipeline.validate("/model.xlsx".as_ref()).unwrap();
//! assert_eq!(report.total_errors, 0);
//! ```
//!
//! Expected findings — error cells, failed individual repairs, an engine
//! that is not installed — are always data in the reports. Only a workbook
//! that cannot be loaded at all, or a sanitizer rejection, surfaces as an
//! [`Error`].

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod fallback;
pub mod lock;
pub mod pipeline;
pub mod repair;
pub mod report;
pub mod sanitize;
pub mod store;
pub mod validate;

// Re-exports for convenience
pub use audit::{AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use repair::{repair_workbook, RepairAction, RepairOptions};
pub use report::{
    ErrorKind, KindSummary, Outcome, PipelineReport, RepairAttempt, RepairDetail, RepairReport,
    ValidationMethod, ValidationReport, ValidationStatus,
};
pub use sanitize::{sanitize_formula, Sanitized, SecurityError};
pub use store::{MemoryStore, WorkbookStore};
pub use validate::{validate_workbook, MethodChoice, ValidateOptions};

// The bridge configuration rides along so callers can tune timeouts without
// depending on the bridge crate directly.
pub use sheetmend_recalc::RecalcConfig;
