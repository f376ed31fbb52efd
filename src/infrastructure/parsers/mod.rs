pub mod csv;
pub mod xlsx;

use std::path::Path;

use crate::domain::error::Result;
use crate::domain::table::DataTable;
use crate::domain::upload::FileKind;

/// Load a tabular file into memory according to its kind.
pub fn load_table(path: &Path, kind: FileKind) -> Result<DataTable> {
    match kind {
        FileKind::Csv => csv::CsvTableParser::new().parse_file(path),
        FileKind::Xlsx => xlsx::parse_file(path),
    }
}
