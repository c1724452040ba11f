//! Cell address parsing and display

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address in A1 notation (e.g. "A1", "BC23")
///
/// Rows and columns are 0-based internally; display is 1-based with column
/// letters, matching what the external engine and the report format use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ...)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an address from A1-style notation
    ///
    /// Absolute markers (`$`) are accepted and discarded; the pipeline never
    /// distinguishes absolute from relative references.
    ///
    /// # Examples
    /// ```
    /// use sheetmend_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B3").unwrap();
    /// assert_eq!(addr.row, 2);
    /// assert_eq!(addr.col, 1);
    /// assert_eq!(addr.to_string(), "B3");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let stripped: String = s.chars().filter(|c| *c != '$').collect();
        let bytes = stripped.as_bytes();

        let mut pos = 0;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&stripped[..pos])?;

        let row_str = &stripped[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row_1based: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        if row_1based == 0 {
            return Err(Error::InvalidAddress(format!("row 0 in '{}'", s)));
        }

        Ok(Self {
            row: row_1based - 1,
            col,
        })
    }

    /// Convert column letters to a 0-based column index
    fn letters_to_column(letters: &str) -> Result<u16> {
        let mut col: u32 = 0;
        for c in letters.chars() {
            let c = c.to_ascii_uppercase();
            if !c.is_ascii_uppercase() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c as u32 - 'A' as u32 + 1);
            if col > 16384 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' out of range",
                    letters
                )));
            }
        }
        Ok((col - 1) as u16)
    }

    /// Convert a 0-based column index to letters
    pub fn column_letters(col: u16) -> String {
        let mut n = col as u32 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            letters.push(char::from(b'A' + rem));
            n = (n - 1) / 26;
        }
        letters.into_iter().rev().collect()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::column_letters(self.col), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
