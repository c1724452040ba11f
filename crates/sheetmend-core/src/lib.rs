//! # sheetmend-core
//!
//! Workbook model for the sheetmend validation and repair pipeline.
//!
//! This crate provides the document structures the pipeline borrows per
//! call:
//! - [`CellValue`] and [`CellError`] - cell contents and the closed set of
//!   spreadsheet error literals
//! - [`CellAddress`] and [`CellLocation`] - A1-notation addressing and the
//!   `"Sheet!A1"` locations the reports key on
//! - [`Workbook`] and [`Worksheet`] - the document structure, with sparse
//!   row-major cell storage
//! - [`CellComment`] - the annotations the repair engine attaches
//!
//! File formats live elsewhere: loaders hand a [`Workbook`] to the pipeline
//! and get it back for saving.
//!
//! ## Example
//!
//! ```rust
//! use sheetmend_core::{CellValue, Workbook};
//!
//! let mut wb = Workbook::new();
//! let sheet = wb.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 42.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! assert_eq!(sheet.formula("B1").unwrap(), Some("=A1*2"));
//! ```

pub mod address;
pub mod cell;
pub mod comment;
pub mod error;
pub mod location;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use address::CellAddress;
pub use cell::{CellError, CellValue};
pub use comment::CellComment;
pub use error::{Error, Result};
pub use location::CellLocation;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum sheet name length (Excel limit)
pub const MAX_SHEET_NAME_LEN: usize = 31;
