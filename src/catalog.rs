// src/catalog.rs

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::{collections::HashSet, path::Path};
use tracing::{debug, instrument};

/// Distinct dataset names read from the metadata spreadsheet, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    /// Build a catalog from a cell range whose first row is the header row.
    pub fn from_range(range: &Range<Data>, column: &str) -> Result<Self> {
        let mut rows = range.rows();
        let header = rows
            .next()
            .ok_or_else(|| anyhow!("sheet is empty; expected a header row"))?;
        let idx = header
            .iter()
            .position(|cell| matches!(cell, Data::String(s) if s == column))
            .ok_or_else(|| anyhow!("no column named {:?} in header row", column))?;

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for row in rows {
            let name = match row.get(idx) {
                None | Some(Data::Empty) => continue,
                Some(Data::String(s)) if s.is_empty() => continue,
                Some(cell) => cell.to_string(),
            };
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for Catalog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let names = iter
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self { names }
    }
}

/// Read the first worksheet of `path` and collect the distinct values of `column`.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>, column: &str) -> Result<Catalog> {
    let path = path.as_ref();
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening workbook {}", path.display()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => {
            range.with_context(|| format!("reading first sheet of {}", path.display()))?
        }
        None => bail!("workbook {} has no worksheets", path.display()),
    };
    let catalog = Catalog::from_range(&range, column)
        .with_context(|| format!("extracting {:?} from {}", column, path.display()))?;
    debug!(datasets = catalog.len(), "catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() -> Result<()> {
        let range = sheet(&[
            &[s("question"), s("dataset")],
            &[s("q1"), s("050_ING")],
            &[s("q2"), s("001_Forbes")],
            &[s("q3"), s("050_ING")],
            &[s("q4"), s("006_London_Airbnb")],
            &[s("q5"), s("001_Forbes")],
        ]);
        let catalog = Catalog::from_range(&range, "dataset")?;
        assert_eq!(
            catalog.names(),
            &["050_ING", "001_Forbes", "006_London_Airbnb"]
        );
        Ok(())
    }

    #[test]
    fn test_empty_cells_are_skipped() -> Result<()> {
        let range = sheet(&[
            &[s("dataset")],
            &[s("a")],
            &[Data::Empty],
            &[s("")],
            &[s("b")],
        ]);
        let catalog = Catalog::from_range(&range, "dataset")?;
        assert_eq!(catalog.names(), &["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_non_string_cells_are_stringified() -> Result<()> {
        let range = sheet(&[&[s("dataset")], &[Data::Int(42)], &[s("42")]]);
        let catalog = Catalog::from_range(&range, "dataset")?;
        assert_eq!(catalog.names(), &["42"]);
        Ok(())
    }

    #[test]
    fn test_missing_column_errors() {
        let range = sheet(&[&[s("question"), s("answer")], &[s("q"), s("a")]]);
        let err = Catalog::from_range(&range, "dataset").unwrap_err();
        assert!(err.to_string().contains("dataset"));
    }

    #[test]
    fn test_header_only_sheet_is_empty_catalog() -> Result<()> {
        let range = sheet(&[&[s("dataset")]]);
        let catalog = Catalog::from_range(&range, "dataset")?;
        assert!(catalog.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_workbook_errors() {
        let err = load_catalog("/nonexistent/questions.xlsx", "dataset").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/questions.xlsx"));
    }

    #[test]
    fn test_from_iter_dedups() {
        let catalog: Catalog = ["a", "b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(catalog.names(), &["a", "b"]);
    }
}
