use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One analysis performed on an uploaded file. The summary itself is stored
/// as JSON text in `result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub data_upload_id: i64,
    pub analysis_type: String,
    pub result: String,
    pub confidence: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub data_upload_id: i64,
    pub analysis_type: String,
    pub result: String,
    pub confidence: Option<f64>,
}

pub const ANALYSIS_TYPE_DESCRIPTIVE: &str = "descriptive";

/// Inferred column type, from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Integer,
    Float,
    Boolean,
    Text,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dtype::Integer => "integer",
            Dtype::Float => "float",
            Dtype::Boolean => "boolean",
            Dtype::Text => "text",
        };
        f.write_str(s)
    }
}

/// Per-column metadata in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: Dtype,
    pub null_count: usize,
    pub unique_count: usize,
}

/// `describe()`-style statistics for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnStats {
    Numeric {
        count: usize,
        mean: f64,
        std: Option<f64>,
        min: f64,
        q25: f64,
        median: f64,
        q75: f64,
        max: f64,
    },
    Categorical {
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: usize,
    },
}

/// The full descriptive summary of one table.
///
/// `head` holds the first rows as header-keyed records; `describe` maps each
/// column name to its statistics. BTreeMap keeps the JSON output stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub head: Vec<BTreeMap<String, Option<String>>>,
    pub describe: BTreeMap<String, ColumnStats>,
    /// Fraction of non-null values that conform to the inferred dtypes.
    pub confidence: f64,
}
