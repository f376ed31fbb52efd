// ============================================================
// XLSX PARSER
// ============================================================
// Read the first worksheet of an Excel workbook into a DataTable

use std::path::Path;

use calamine::{open_workbook, Data, DataType, Reader, Xlsx};

use crate::domain::error::{AppError, Result};
use crate::domain::table::DataTable;

/// Parse an XLSX file. The first worksheet is used; its first row becomes
/// the header row.
pub fn parse_file(path: &Path) -> Result<DataTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| AppError::ParseError(format!("Failed to open Excel file: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
        .map_err(|e| AppError::ParseError(format!("Failed to read Excel range: {}", e)))?;

    let mut rows = range.rows().map(stringify_row);

    let headers = match rows.next() {
        Some(headers) => headers,
        None => return Ok(DataTable::new(Vec::new(), Vec::new())),
    };

    Ok(DataTable::new(headers, rows.collect()))
}

fn stringify_row(row: &[Data]) -> Vec<String> {
    row.iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => other
                .as_string()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{}", other)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_row_handles_cell_types() {
        let row = vec![
            Data::String("Alice".to_string()),
            Data::Int(30),
            Data::Float(1.5),
            Data::Bool(true),
            Data::Empty,
        ];
        let values = stringify_row(&row);
        assert_eq!(values[0], "Alice");
        assert_eq!(values[1], "30");
        assert_eq!(values[2], "1.5");
        assert_eq!(values[4], "");
    }

    #[test]
    fn test_missing_file_is_a_parse_error() {
        let err = parse_file(Path::new("/nonexistent/file.xlsx")).unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
