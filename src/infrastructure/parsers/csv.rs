// ============================================================
// CSV PARSER
// ============================================================
// Parse CSV files with encoding and delimiter detection

use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::domain::error::{AppError, Result};
use crate::domain::table::DataTable;

/// CSV parser producing a [`DataTable`]. The first record is the header row.
pub struct CsvTableParser {
    /// Delimiter character; detected from content when None.
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values.
    trim: bool,
}

impl Default for CsvTableParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvTableParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse a CSV file, detecting encoding and delimiter.
    pub fn parse_file(&self, path: &Path) -> Result<DataTable> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::IoError(format!("Failed to read file: {}", e)))?;
        let content = decode_bytes(&bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from a string.
    pub fn parse_content(&self, content: &str) -> Result<DataTable> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(DataTable::new(headers, rows))
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe) by scoring
    /// per-line consistency over a sample of lines.
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            let sample_lines: Vec<_> = content.lines().take(10).collect();
            if sample_lines.is_empty() {
                continue;
            }

            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.chars().filter(|&c| c as u32 == delimiter as u32).count())
                .collect();

            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());
            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Decode file bytes: UTF-8 first, WINDOWS-1252 as the legacy fallback.
fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "name,age,city\nAlice,30,NYC\nBob,25,LA";
        let table = CsvTableParser::new().parse_content(content).unwrap();

        assert_eq!(table.headers, vec!["name", "age", "city"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Alice", "30", "NYC"]);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvTableParser::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(CsvTableParser::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(CsvTableParser::detect_delimiter("a\tb\nc\td"), b'\t');
    }

    #[test]
    fn test_semicolon_content_auto_detected() {
        let content = "name;age\nAlice;30\nBob;25";
        let table = CsvTableParser::new().parse_content(content).unwrap();
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.rows[1], vec!["Bob", "25"]);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let content = "a,b,c\n1,2\n1,2,3,4";
        let table = CsvTableParser::new().parse_content(content).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_values_are_trimmed() {
        let content = "a,b\n 1 ,  x  ";
        let table = CsvTableParser::new().parse_content(content).unwrap();
        assert_eq!(table.rows[0], vec!["1", "x"]);
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "café" with a Latin-1 e-acute, invalid as UTF-8.
        let bytes = b"name\ncaf\xe9";
        let content = decode_bytes(bytes);
        assert_eq!(content, "name\ncaf\u{e9}");
    }

    #[test]
    fn test_header_only_content() {
        let content = "a,b,c";
        let table = CsvTableParser::new().parse_content(content).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert!(table.rows.is_empty());
    }
}
