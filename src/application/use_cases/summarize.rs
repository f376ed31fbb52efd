// ============================================================
// TABLE SUMMARIZER
// ============================================================
// Descriptive-statistics summary of a parsed table: dtype inference,
// null counts, head sample, and describe()-style statistics

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::analysis::{ColumnInfo, ColumnStats, Dtype, TableSummary};
use crate::domain::table::{is_null, DataTable};

/// Minimum fraction of non-null values that must parse as a type before the
/// column is inferred as that type.
const TYPE_INFERENCE_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Number of leading rows included in the head sample.
    pub preview_rows: usize,

    /// Maximum values per column inspected during dtype inference.
    pub type_sample_rows: usize,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            type_sample_rows: 2000,
        }
    }
}

pub struct Summarizer {
    options: SummarizeOptions,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new(SummarizeOptions::default())
    }
}

impl Summarizer {
    pub fn new(options: SummarizeOptions) -> Self {
        Self { options }
    }

    /// Compute the full descriptive summary of a table.
    pub fn summarize(&self, table: &DataTable) -> TableSummary {
        let mut columns = Vec::with_capacity(table.column_count());
        let mut describe = BTreeMap::new();
        let mut conformity_total = 0.0f64;

        for (idx, header) in table.headers.iter().enumerate() {
            let values: Vec<&str> = table.column(idx).collect();
            let non_null: Vec<&str> = values.iter().copied().filter(|v| !is_null(v)).collect();
            let null_count = values.len() - non_null.len();

            let (dtype, conformity) = self.infer_dtype(&non_null);
            conformity_total += conformity;

            // Trimmed, so the count agrees with the categorical describe block
            // when cells carry surrounding whitespace.
            let unique_count = non_null.iter().map(|v| v.trim()).collect::<HashSet<_>>().len();

            let stats = match dtype {
                Dtype::Integer | Dtype::Float => numeric_stats(&non_null),
                Dtype::Boolean | Dtype::Text => Some(categorical_stats(&non_null)),
            };
            if let Some(stats) = stats {
                describe.insert(header.clone(), stats);
            }

            columns.push(ColumnInfo {
                name: header.clone(),
                dtype,
                null_count,
                unique_count,
            });
        }

        let confidence = if columns.is_empty() {
            0.0
        } else {
            conformity_total / columns.len() as f64
        };

        TableSummary {
            row_count: table.row_count(),
            column_count: table.column_count(),
            columns,
            head: self.head_sample(table),
            describe,
            confidence,
        }
    }

    /// Infer the column dtype and report the fraction of non-null values
    /// that conform to it.
    fn infer_dtype(&self, non_null: &[&str]) -> (Dtype, f64) {
        if non_null.is_empty() {
            return (Dtype::Text, 1.0);
        }

        let sample: Vec<&str> = non_null
            .iter()
            .copied()
            .take(self.options.type_sample_rows)
            .collect();
        let n = sample.len() as f64;

        let int_ok = sample.iter().filter(|v| parses_as_int(v)).count();
        let float_ok = sample.iter().filter(|v| parses_as_float(v)).count();
        let bool_ok = sample.iter().filter(|v| parses_as_bool(v)).count();

        let bool_ratio = bool_ok as f64 / n;
        let int_ratio = int_ok as f64 / n;
        let float_ratio = float_ok as f64 / n;

        if bool_ratio >= TYPE_INFERENCE_THRESHOLD {
            (Dtype::Boolean, bool_ratio)
        } else if int_ratio >= TYPE_INFERENCE_THRESHOLD && int_ok == float_ok {
            // No float-only values present, the column is genuinely integral.
            (Dtype::Integer, int_ratio)
        } else if float_ratio >= TYPE_INFERENCE_THRESHOLD {
            (Dtype::Float, float_ratio)
        } else {
            (Dtype::Text, 1.0)
        }
    }

    /// First rows of the table as header-keyed records, nulls as None.
    fn head_sample(&self, table: &DataTable) -> Vec<BTreeMap<String, Option<String>>> {
        table
            .rows
            .iter()
            .take(self.options.preview_rows)
            .map(|row| {
                table
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| {
                        let value = if is_null(cell) {
                            None
                        } else {
                            Some(cell.trim().to_string())
                        };
                        (header.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

fn parses_as_int(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

fn parses_as_float(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

fn parses_as_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "false")
}

/// Numeric describe() block. Values that fail to parse are skipped, which
/// mirrors how a small minority of dirty cells is tolerated by inference.
fn numeric_stats(non_null: &[&str]) -> Option<ColumnStats> {
    let mut values: Vec<f64> = non_null
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();

    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    // Sample standard deviation (ddof = 1), None for a single observation.
    let std = if count > 1 {
        let variance = values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (count - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };

    Some(ColumnStats::Numeric {
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Categorical describe() block: count, unique, most frequent value and its
/// frequency. Ties break on the smaller value so output is deterministic.
fn categorical_stats(non_null: &[&str]) -> ColumnStats {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in non_null {
        *counts.entry(value.trim()).or_insert(0) += 1;
    }

    let unique = counts.len();
    let top = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(value, freq)| (value.to_string(), *freq));

    let (top, freq) = match top {
        Some((value, freq)) => (Some(value), freq),
        None => (None, 0),
    };

    ColumnStats::Categorical {
        count: non_null.len(),
        unique,
        top,
        freq,
    }
}

/// Linear-interpolation quantile over a sorted slice, matching the pandas
/// default. `values` must be non-empty and sorted ascending.
fn quantile(values: &[f64], q: f64) -> f64 {
    let n = values.len();
    if n == 1 {
        return values[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 < n {
        values[lo] + (values[lo + 1] - values[lo]) * frac
    } else {
        values[lo]
    }
}
