//! External recalculation bridge for sheetmend.
//!
//! Forces a true recalculation of a workbook by driving an external
//! spreadsheet engine as a child process, then harvests the cells whose
//! displayed result is a known error literal.
//!
//! # Protocol
//!
//! ```text
//! RecalcBridge::recalculate(path)
//!     ├── render transient probe script (open hidden, calculateAll,
//!     │   walk used ranges, write JSON artifact)
//!     ├── spawn engine child on the script
//!     ├── poll for the artifact with capped exponential backoff
//!     ├── parse the artifact into RecalcOutcome
//!     └── Drop guard: kill + reap the child, delete script and artifact
//! ```
//!
//! Every [`RecalcError`] is recoverable: the validation orchestrator treats
//! a bridge failure as a trigger to fall back to static inspection, never as
//! a fatal condition.

pub mod bridge;
pub mod error;
pub mod script;

pub use bridge::{RecalcBridge, RecalcConfig, RecalcFinding, RecalcOutcome};
pub use error::{RecalcError, Result};
