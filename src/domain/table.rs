// ============================================================
// TABLE TYPES
// ============================================================
// In-memory representation of parsed tabular content

use serde::{Deserialize, Serialize};

/// A parsed tabular file: one header row plus data rows.
///
/// Cells are kept as raw strings; a cell that is empty after trimming is
/// treated as a null by the summarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Build a table, padding short rows so every row matches the header width.
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        for row in rows.iter_mut() {
            if row.len() < width {
                row.resize(width, String::new());
            } else if row.len() > width {
                row.truncate(width);
            }
        }
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Iterate the values of one column, top to bottom. Rows shorter than
    /// the header yield empty cells rather than panicking.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }
}

/// Whether a cell counts as a null value.
pub fn is_null(cell: &str) -> bool {
    cell.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_short_rows() {
        let table = DataTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[0][1], "");
    }

    #[test]
    fn test_truncates_long_rows() {
        let table = DataTable::new(
            vec!["a".into()],
            vec![vec!["1".into(), "extra".into()]],
        );
        assert_eq!(table.rows[0], vec!["1".to_string()]);
    }

    #[test]
    fn test_column_iteration() {
        let table = DataTable::new(
            vec!["x".into(), "y".into()],
            vec![
                vec!["1".into(), "a".into()],
                vec!["2".into(), "b".into()],
            ],
        );
        let ys: Vec<&str> = table.column(1).collect();
        assert_eq!(ys, vec!["a", "b"]);
    }

    #[test]
    fn test_column_tolerates_ragged_rows() {
        // Hand-built table that skipped the width normalization in `new`.
        let table = DataTable {
            headers: vec!["x".into(), "y".into()],
            rows: vec![vec!["1".into()], vec!["2".into(), "b".into()]],
        };
        let ys: Vec<&str> = table.column(1).collect();
        assert_eq!(ys, vec!["", "b"]);
    }

    #[test]
    fn test_is_null() {
        assert!(is_null(""));
        assert!(is_null("   "));
        assert!(!is_null("0"));
    }
}
