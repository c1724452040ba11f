//! Worksheet type

use std::collections::BTreeMap;

use crate::address::CellAddress;
use crate::cell::CellValue;
use crate::comment::CellComment;
use crate::error::Result;

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely, keyed `(row, col)`, so iteration is always
/// row-major — the order the validation reports list locations in.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Sparse cell storage
    cells: BTreeMap<(u32, u16), CellValue>,
    /// Cell comments (keyed by (row, col))
    comments: BTreeMap<(u32, u16), CellComment>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            comments: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell value by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell value by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(&(row, col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /// Get the formula text at an address (if the cell is a formula)
    pub fn formula(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr.row, addr.col))
    }

    /// Get the formula text at a cell position (if it's a formula)
    pub fn formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.cells.get(&(row, col)).and_then(|v| v.formula_text())
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value);
        Ok(())
    }

    /// Set a cell value by row and column indices
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) {
        self.cells.insert((row, col), value.into());
    }

    /// Set a cell formula by address string, normalizing the leading `=`
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;

        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };

        self.cells
            .insert((addr.row, addr.col), CellValue::formula(formula));
        Ok(())
    }

    /// Store a formula exactly as a file recorded it, without normalization
    ///
    /// Loaders use this so that a formula missing its leading `=` survives
    /// into the snapshot for the static validator to flag.
    pub fn set_cell_formula_raw(&mut self, address: &str, value: CellValue) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cells.insert((addr.row, addr.col), value);
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cells.remove(&(addr.row, addr.col));
        Ok(())
    }

    // === Iteration ===

    /// Check if the worksheet has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all non-empty cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> {
        self.cells
            .iter()
            .map(|(&(row, col), value)| (CellAddress::new(row, col), value))
    }

    /// Iterate over all formula cells: (address, formula_text, full value)
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str, &CellValue)> {
        self.iter_cells().filter_map(|(addr, value)| {
            value.formula_text().map(|text| (addr, text, value))
        })
    }

    /// Get the used range (bounds of all non-empty cells) as
    /// `(min_row, min_col, max_row, max_col)`
    pub fn used_range(&self) -> Option<(u32, u16, u32, u16)> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for &(row, col) in self.cells.keys() {
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }
        bounds
    }

    // === Cell Comments ===

    /// Set a comment on a cell by address string
    pub fn set_comment(&mut self, address: &str, comment: CellComment) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.comments.insert((addr.row, addr.col), comment);
        Ok(())
    }

    /// Get the comment on a cell, if any
    pub fn comment(&self, address: &str) -> Result<Option<&CellComment>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.comments.get(&(addr.row, addr.col)))
    }

    /// Iterate over all comments
    pub fn iter_comments(&self) -> impl Iterator<Item = (CellAddress, &CellComment)> {
        self.comments
            .iter()
            .map(|(&(row, col), comment)| (CellAddress::new(row, col), comment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellError;

    #[test]
    fn test_set_and_get_value() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", 42.0).unwrap();
        assert_eq!(ws.cell("A1").unwrap(), CellValue::Number(42.0));
        assert_eq!(ws.cell("B1").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_set_cell_formula_normalizes() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula("A1", "SUM(B1:B10)").unwrap();
        assert_eq!(ws.formula("A1").unwrap(), Some("=SUM(B1:B10)"));

        ws.set_cell_formula("A2", "=A1*2").unwrap();
        assert_eq!(ws.formula("A2").unwrap(), Some("=A1*2"));
    }

    #[test]
    fn test_raw_formula_keeps_missing_equals() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula_raw("A1", CellValue::formula("SUM(B1:B2)"))
            .unwrap();
        assert_eq!(ws.formula("A1").unwrap(), Some("SUM(B1:B2)"));
    }

    #[test]
    fn test_formula_cells_iteration_order() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula("B2", "=1").unwrap();
        ws.set_cell_formula("A1", "=2").unwrap();
        ws.set_cell_value("C1", 3.0).unwrap();
        ws.set_cell_formula("B1", "=4").unwrap();

        let addrs: Vec<String> = ws
            .formula_cells()
            .map(|(addr, _, _)| addr.to_string())
            .collect();
        assert_eq!(addrs, vec!["A1", "B1", "B2"]);
    }

    #[test]
    fn test_used_range() {
        let mut ws = Worksheet::new("Test");
        assert!(ws.used_range().is_none());

        ws.set_cell_value("B2", 1.0).unwrap();
        ws.set_cell_value("D5", 2.0).unwrap();
        assert_eq!(ws.used_range(), Some((1, 1, 4, 3)));
    }

    #[test]
    fn test_comments() {
        let mut ws = Worksheet::new("Test");
        ws.set_comment("A1", CellComment::text_only("check this"))
            .unwrap();
        assert_eq!(ws.comment("A1").unwrap().unwrap().text, "check this");
        assert!(ws.comment("B1").unwrap().is_none());
    }

    #[test]
    fn test_cached_error_value() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_formula_raw(
            "A1",
            CellValue::formula_with_cached("=1/0", CellError::Div0.into()),
        )
        .unwrap();
        assert_eq!(ws.cell("A1").unwrap().cached_error(), Some(CellError::Div0));
    }
}
