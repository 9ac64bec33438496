//! Summaries and statistics over small in-memory record lists.
//!
//! Records are flat JSON objects. There is no schema: the first record
//! decides which columns exist for the column-based operations.

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::{Map, Value};

/// One row.
pub type Record = Map<String, Value>;

/// The overall shape of a dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DataSummary {
    /// Number of records.
    pub total_records: usize,
    /// Every column seen in any record, sorted.
    pub columns: Vec<String>,
    /// Type of the first non-null value of each column.
    pub data_types: BTreeMap<String, String>,
    /// Number of records where the column is missing or null.
    pub missing_values: BTreeMap<String, usize>,
    /// The first records.
    pub sample_data: Vec<Record>,
}

/// Statistics of one column.
///
/// The numeric fields are only set when the column holds numbers. For
/// other columns `min` and `max` compare the values as text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataStats {
    /// The column name.
    pub column: String,
    /// Number of non-null values.
    pub count: usize,
    /// Number of distinct non-null values.
    pub unique_count: usize,
    /// Arithmetic mean.
    pub mean: Option<f64>,
    /// Median, the mean of the two middle values for even counts.
    pub median: Option<f64>,
    /// Population standard deviation.
    pub std: Option<f64>,
    /// Smallest value.
    pub min: Option<Value>,
    /// Largest value.
    pub max: Option<Value>,
    /// `[v[n/4], median, v[3n/4]]` over the sorted values.
    pub quartiles: Option<[f64; 3]>,
}

/// How [`aggregate_data`] folds the values of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of the values.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Number of values.
    Count,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

impl Aggregation {
    /// Parses an operation name. `avg` is an alias of `mean`, unknown
    /// names sum.
    pub fn parse(name: &str) -> Self {
        match name {
            "mean" | "avg" => Aggregation::Mean,
            "count" => Aggregation::Count,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            _ => Aggregation::Sum,
        }
    }

    fn apply(self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Count => values.len() as f64,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => {
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            }
        }
    }
}

/// Parses JSON text into records.
pub fn load_json_data(text: &str) -> Result<Vec<Record>, DataError> {
    let value = serde_json::from_str(text).map_err(DataError::Json)?;
    records_from_value(value)
}

/// Normalizes a value into records: an object is one record, an array
/// must hold objects only.
pub fn records_from_value(value: Value) -> Result<Vec<Record>, DataError> {
    let records = match value {
        Value::Object(record) => vec![record],
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(record) => Ok(record),
                _ => Err(DataError::NotARecord(idx)),
            })
            .collect::<Result<_, _>>()?,
        other => return Err(DataError::Unsupported(type_name(&other))),
    };
    info!("loaded {} records", records.len());
    Ok(records)
}

/// Summarizes a dataset, keeping `sample_size` records as a sample.
pub fn summarize_data(data: &[Record], sample_size: usize) -> DataSummary {
    let columns: BTreeSet<&String> = data.iter().flat_map(|r| r.keys()).collect();

    let mut summary = DataSummary {
        total_records: data.len(),
        sample_data: data.iter().take(sample_size).cloned().collect(),
        ..Default::default()
    };
    for column in columns {
        let mut first = None;
        let mut missing = 0;
        for record in data {
            match record.get(column).filter(|v| !v.is_null()) {
                Some(value) => {
                    first.get_or_insert(value);
                }
                None => missing += 1,
            }
        }
        let ty = first.map_or("unknown", type_name);
        summary.data_types.insert(column.clone(), ty.to_owned());
        summary.missing_values.insert(column.clone(), missing);
        summary.columns.push(column.clone());
    }

    info!(
        "generated summary for {} records with {} columns",
        data.len(),
        summary.columns.len()
    );
    summary
}

/// Computes the statistics of a column.
pub fn calculate_column_stats(
    data: &[Record],
    column: &str,
) -> Result<DataStats, DataError> {
    if !data.first().is_some_and(|r| r.contains_key(column)) {
        return Err(DataError::ColumnNotFound(column.to_owned()));
    }

    let values: Vec<&Value> = data
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .collect();
    if values.is_empty() {
        return Err(DataError::NoValues(column.to_owned()));
    }

    let unique: BTreeSet<String> = values.iter().map(|v| unique_key(v)).collect();
    let mut stats = DataStats {
        column: column.to_owned(),
        count: values.len(),
        unique_count: unique.len(),
        mean: None,
        median: None,
        std: None,
        min: None,
        max: None,
        quartiles: None,
    };

    let mut numbers: Vec<f64> = values.iter().filter_map(|v| number_of(v)).collect();
    if numbers.is_empty() {
        let texts = values.iter().map(|v| text_of(v));
        stats.min = texts.clone().min().map(Value::String);
        stats.max = texts.max().map(Value::String);
    } else {
        numbers.sort_by(f64::total_cmp);
        let n = numbers.len();
        let mean = numbers.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            numbers[n / 2]
        } else {
            (numbers[n / 2 - 1] + numbers[n / 2]) / 2.0
        };
        let variance =
            numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

        stats.mean = Some(mean);
        stats.median = Some(median);
        stats.std = Some(variance.sqrt());
        stats.min = Some(Value::from(numbers[0]));
        stats.max = Some(Value::from(numbers[n - 1]));
        stats.quartiles = Some([numbers[n / 4], median, numbers[(3 * n / 4).min(n - 1)]]);
    }

    info!("calculated statistics for column '{column}'");
    Ok(stats)
}

/// Keeps the records equal to `conditions` on every listed column.
///
/// A record without one of the columns never matches.
pub fn filter_data(data: &[Record], conditions: &Record) -> Vec<Record> {
    let filtered: Vec<Record> = data
        .iter()
        .filter(|record| {
            conditions
                .iter()
                .all(|(column, expected)| record.get(column) == Some(expected))
        })
        .cloned()
        .collect();
    info!("filtered data: {} -> {} records", data.len(), filtered.len());
    filtered
}

/// Groups records by the text form of a column.
///
/// Records without the column land in the `Unknown` group; `null` is keyed
/// as `None` and booleans as `True` or `False`.
pub fn group_data(
    data: &[Record],
    group_by: &str,
) -> Result<BTreeMap<String, Vec<Record>>, DataError> {
    if !data.first().is_some_and(|r| r.contains_key(group_by)) {
        return Err(DataError::ColumnNotFound(group_by.to_owned()));
    }

    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for record in data {
        let key = record
            .get(group_by)
            .map_or_else(|| "Unknown".to_owned(), group_key);
        groups.entry(key).or_default().push(record.clone());
    }
    info!("grouped data by '{group_by}' into {} groups", groups.len());
    Ok(groups)
}

/// Folds the numeric values of `column` in each group.
///
/// Groups without any numeric value are left out.
pub fn aggregate_data(
    data: &[Record],
    group_by: &str,
    column: &str,
    aggregation: Aggregation,
) -> Result<BTreeMap<String, f64>, DataError> {
    let results = group_data(data, group_by)?
        .into_iter()
        .filter_map(|(key, records)| {
            let values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(column).and_then(number_of))
                .collect();
            (!values.is_empty()).then(|| (key, aggregation.apply(&values)))
        })
        .collect();
    info!("aggregated data by '{group_by}' using {aggregation:?} on '{column}'");
    Ok(results)
}

/// Booleans count as 1 and 0.
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        other => other.as_f64(),
    }
}

/// Equal numbers share a key whatever their JSON form, so `1`, `1.0` and
/// `true` are one value.
fn unique_key(value: &Value) -> String {
    match number_of(value) {
        Some(n) if n == 0.0 => "#0".to_owned(),
        Some(n) => format!("#{n}"),
        None => value.to_string(),
    }
}

fn group_key(value: &Value) -> String {
    match value {
        Value::Null => "None".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        other => text_of(other),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
    }
}

/// The error type of the data tools.
#[derive(Debug)]
pub enum DataError {
    /// The text is not JSON.
    Json(serde_json::Error),
    /// The value is neither an object nor an array.
    Unsupported(&'static str),
    /// The array element at this index is not an object.
    NotARecord(usize),
    /// The column is not in the first record.
    ColumnNotFound(String),
    /// The column has no non-null value.
    NoValues(String),
}

impl Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Json(err) => write!(f, "error parsing JSON data: {err}"),
            DataError::Unsupported(ty) => write!(f, "unsupported data type: {ty}"),
            DataError::NotARecord(idx) => write!(f, "item {idx} is not a record"),
            DataError::ColumnNotFound(column) => {
                write!(f, "column '{column}' not found in data")
            }
            DataError::NoValues(column) => {
                write!(f, "no valid values found for column '{column}'")
            }
        }
    }
}

impl StdError for DataError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DataError::Json(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fixture() -> Vec<Record> {
        records_from_value(json!([
            {"id": 1, "name": "Item A", "value": 42.5, "category": "X", "active": true},
            {"id": 2, "name": "Item B", "value": 38.2, "category": "Y", "active": false},
            {"id": 3, "name": "Item C", "value": 55.1, "category": "X", "active": true},
            {"id": 4, "name": "Item D", "value": null, "category": "Z"},
        ]))
        .unwrap()
    }

    #[test]
    fn test_load() {
        assert_eq!(load_json_data(r#"{"a": 1}"#).unwrap().len(), 1);
        assert_eq!(load_json_data(r#"[{"a": 1}, {"a": 2}]"#).unwrap().len(), 2);
        assert!(matches!(load_json_data("42"), Err(DataError::Unsupported("integer"))));
        assert!(matches!(load_json_data("[{}, 1]"), Err(DataError::NotARecord(1))));
        assert!(matches!(load_json_data("{"), Err(DataError::Json(_))));
    }

    #[test]
    fn test_summarize() {
        let summary = summarize_data(&fixture(), 2);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.columns, ["active", "category", "id", "name", "value"]);
        assert_eq!(summary.data_types["active"], "boolean");
        assert_eq!(summary.data_types["id"], "integer");
        assert_eq!(summary.data_types["value"], "float");
        assert_eq!(summary.data_types["name"], "string");
        assert_eq!(summary.missing_values["active"], 1);
        assert_eq!(summary.missing_values["value"], 1);
        assert_eq!(summary.sample_data.len(), 2);

        assert_eq!(summarize_data(&[], 5), DataSummary::default());
    }

    #[test]
    fn test_numeric_stats() {
        let stats = calculate_column_stats(&fixture(), "value").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.unique_count, 3);
        assert!((stats.mean.unwrap() - 45.266_666).abs() < 1e-5);
        assert_eq!(stats.median, Some(42.5));
        assert_eq!(stats.min, Some(json!(38.2)));
        assert_eq!(stats.max, Some(json!(55.1)));
        assert_eq!(stats.quartiles, Some([38.2, 42.5, 55.1]));

        let ids = calculate_column_stats(&fixture(), "id").unwrap();
        assert_eq!(ids.median, Some(2.5));
        assert_eq!(ids.quartiles, Some([2.0, 2.5, 4.0]));
        assert!((ids.std.unwrap() - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_text_stats() {
        let stats = calculate_column_stats(&fixture(), "category").unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.unique_count, 3);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.min, Some(json!("X")));
        assert_eq!(stats.max, Some(json!("Z")));

        let bools = calculate_column_stats(&fixture(), "active").unwrap();
        assert_eq!(bools.unique_count, 2);
        assert!((bools.mean.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(bools.min, Some(json!(0.0)));
        assert_eq!(bools.max, Some(json!(1.0)));

        assert!(matches!(
            calculate_column_stats(&fixture(), "missing"),
            Err(DataError::ColumnNotFound(_))
        ));
        let nulls = records_from_value(json!([{"a": null}])).unwrap();
        assert!(matches!(
            calculate_column_stats(&nulls, "a"),
            Err(DataError::NoValues(_))
        ));
    }

    #[test]
    fn test_mixed_number_forms() {
        let data = records_from_value(json!([
            {"n": 1, "k": 1},
            {"n": 1.0, "k": 1.0},
            {"n": true, "k": null},
            {"n": 0, "k": false},
            {"n": "1", "k": "1"},
        ]))
        .unwrap();
        let stats = calculate_column_stats(&data, "n").unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.unique_count, 3);
        assert_eq!(stats.mean, Some(0.75));

        let groups = group_data(&data, "k").unwrap();
        let keys: Vec<_> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, ["1", "1.0", "False", "None"]);
        assert_eq!(groups["1"].len(), 2);

        let sums = aggregate_data(&data, "k", "n", Aggregation::Sum).unwrap();
        assert_eq!(sums["None"], 1.0);
        assert_eq!(sums["1"], 1.0);
    }

    #[test]
    fn test_filter() {
        let data = fixture();
        let conditions = json!({"category": "X", "active": true});
        let filtered = filter_data(&data, conditions.as_object().unwrap());
        assert_eq!(filtered.len(), 2);

        let conditions = json!({"active": false});
        assert_eq!(filter_data(&data, conditions.as_object().unwrap()).len(), 1);
    }

    #[test]
    fn test_group_and_aggregate() {
        let mut data = fixture();
        data.push(json!({"id": 5, "value": 1.0}).as_object().unwrap().clone());

        let groups = group_data(&data, "category").unwrap();
        let keys: Vec<_> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Unknown", "X", "Y", "Z"]);
        assert_eq!(groups["X"].len(), 2);

        let sums =
            aggregate_data(&data, "category", "value", Aggregation::Sum).unwrap();
        assert!((sums["X"] - 97.6).abs() < 1e-9);
        assert!(!sums.contains_key("Z"));
        assert_eq!(sums["Unknown"], 1.0);

        let counts =
            aggregate_data(&data, "category", "value", Aggregation::Count).unwrap();
        assert_eq!(counts["X"], 2.0);

        let max = aggregate_data(&data, "category", "value", Aggregation::parse("max"))
            .unwrap();
        assert_eq!(max["X"], 55.1);

        assert_eq!(Aggregation::parse("avg"), Aggregation::Mean);
        assert_eq!(Aggregation::parse("median"), Aggregation::Sum);
        assert!(group_data(&data, "nope").is_err());
    }
}
