//! Fully qualified cell locations ("Sheet!A1")

use crate::address::CellAddress;
use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A cell location qualified with its sheet name
///
/// This is the value type the validation and repair reports key on. It
/// renders and serializes as `"Sheet!A1"` and orders by sheet name, then
/// row-major within the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellLocation {
    /// Sheet name (unquoted, as the workbook stores it)
    pub sheet: String,
    /// Address within the sheet
    pub address: CellAddress,
}

impl CellLocation {
    /// Create a new location
    pub fn new<S: Into<String>>(sheet: S, address: CellAddress) -> Self {
        Self {
            sheet: sheet.into(),
            address,
        }
    }

    /// Parse a `"Sheet!A1"` string
    ///
    /// Quoted sheet names (`'My Sheet'!A1`) are unquoted. The split is on the
    /// last `!` so sheet names containing `!` inside quotes survive.
    pub fn parse(s: &str) -> Result<Self> {
        let idx = s
            .rfind('!')
            .ok_or_else(|| Error::InvalidLocation(s.to_string()))?;

        let (sheet_part, addr_part) = (&s[..idx], &s[idx + 1..]);
        if sheet_part.is_empty() {
            return Err(Error::InvalidLocation(s.to_string()));
        }

        let sheet = sheet_part
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or(sheet_part);

        Ok(Self {
            sheet: sheet.to_string(),
            address: CellAddress::parse(addr_part)?,
        })
    }
}

impl fmt::Display for CellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.address)
    }
}

impl FromStr for CellLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CellLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
