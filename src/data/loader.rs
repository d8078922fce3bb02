use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, TimeUnit,
    TimestampMicrosecondType,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;

use super::model::{Dataset, Field, Value};
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Source – where a dataset comes from
// ---------------------------------------------------------------------------

/// A buoy data source: a remote URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    /// `http://` and `https://` strings are URLs, everything else a path.
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
    Parquet,
}

fn format_for_extension(ext: &str) -> Option<Format> {
    match ext.to_ascii_lowercase().as_str() {
        "csv" => Some(Format::Csv),
        "json" => Some(Format::Json),
        "parquet" | "pq" => Some(Format::Parquet),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset, normalise its column names and parse the `Date` column.
///
/// Local files dispatch by extension:
/// * `.csv`     – the buoy export format
/// * `.json`    – `[{ "Date": "...", "Temp": 21.3, ... }, ...]`
/// * `.parquet` – flat columns, `Date` as text, date or timestamp
///
/// URLs are fetched once with a blocking GET and parsed as CSV unless their
/// path ends in `.json` or `.parquet`.
pub fn load(source: &Source) -> Result<Dataset> {
    let raw = match source {
        Source::Url(url) => {
            let bytes = fetch_url(url)?.bytes()?;
            debug!("Fetched {} bytes from {url}", bytes.len());
            match url_format(url) {
                Format::Csv => read_csv(&bytes[..])?,
                Format::Json => read_json(&bytes)?,
                Format::Parquet => read_parquet(bytes)?,
            }
        }
        Source::Path(path) => load_path(path)?,
    };

    let dataset = parse_dates(&raw.normalize_columns())?;
    info!(
        "Loaded {} rows from {source} with columns {:?}",
        dataset.len(),
        dataset.columns
    );
    Ok(dataset)
}

fn load_path(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();

    match format_for_extension(&ext) {
        Some(Format::Csv) => read_csv(std::fs::File::open(path)?),
        Some(Format::Json) => read_json(&std::fs::read(path)?),
        Some(Format::Parquet) => read_parquet(std::fs::File::open(path)?),
        None => Err(PipelineError::UnsupportedFormat(ext)),
    }
}

fn url_format(url: &str) -> Format {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.')
        .and_then(|(_, ext)| format_for_extension(ext))
        .unwrap_or(Format::Csv)
}

/// Blocking GET; anything but a 2xx status is a fetch failure.
fn fetch_url(url: &str) -> Result<reqwest::blocking::Response> {
    info!("Fetching {url}");
    let fetch_error = |message: String| PipelineError::Fetch {
        url: url.to_string(),
        message,
    };

    let response = reqwest::blocking::get(url).map_err(|e| fetch_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {status}")));
    }
    Ok(response)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Header row with column names, one buoy reading per line. Cells are typed
/// by [`guess_value_type`]; `Date` stays text until [`parse_dates`].
///
/// Rows shorter than the header are padded with `Null`; longer rows are an
/// error.
pub fn read_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > columns.len() {
            return Err(PipelineError::RowWidth {
                row,
                expected: columns.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(guess_value_type).collect());
    }

    Ok(Dataset::from_rows(columns, rows))
}

/// Infer a cell type the way a dataframe reader would: empty and `NaN`
/// markers are missing, then integer, float, boolean, text.
pub fn guess_value_type(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() || matches!(s, "NaN" | "nan" | "NA" | "N/A" | "null") {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient="records")`.
/// Columns appear in order of first occurrence across the records.
pub fn read_json(bytes: &[u8]) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root.as_array().ok_or_else(|| {
        PipelineError::Json(serde::de::Error::custom("expected top-level JSON array"))
    })?;

    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| {
            PipelineError::Json(serde::de::Error::custom(format!(
                "row {i} is not a JSON object"
            )))
        })?;

        let mut row = vec![Value::Null; columns.len()];
        for (key, val) in obj {
            let pos = *positions.entry(key.clone()).or_insert_with(|| {
                columns.push(key.clone());
                columns.len() - 1
            });
            if pos >= row.len() {
                row.resize(pos + 1, Value::Null);
            }
            row[pos] = json_to_value(val);
        }
        rows.push(row);
    }

    Ok(Dataset::from_rows(columns, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Flat Parquet table. Strings, integers, floats and booleans map directly;
/// `Date32`/`Date64`/`Timestamp` columns become [`Value::Timestamp`].
pub fn read_parquet<T: ChunkReader + 'static>(input: T) -> Result<Dataset> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let start = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(columns.len())));

        for col in batch.columns() {
            for (offset, value) in arrow_column_values(col)?.into_iter().enumerate() {
                rows[start + offset].push(value);
            }
        }
    }

    Ok(Dataset::from_rows(columns, rows))
}

/// Convert one Arrow column to cells, nulls included.
fn arrow_column_values(col: &ArrayRef) -> Result<Vec<Value>> {
    let n = col.len();
    let values = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            collect_cells(n, col, |i| Value::String(arr.value(i).to_string()))
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            collect_cells(n, col, |i| Value::String(arr.value(i).to_string()))
        }
        DataType::Int8 => {
            let arr = col.as_primitive::<Int8Type>();
            collect_cells(n, col, |i| Value::Integer(arr.value(i) as i64))
        }
        DataType::Int16 => {
            let arr = col.as_primitive::<Int16Type>();
            collect_cells(n, col, |i| Value::Integer(arr.value(i) as i64))
        }
        DataType::Int32 => {
            let arr = col.as_primitive::<Int32Type>();
            collect_cells(n, col, |i| Value::Integer(arr.value(i) as i64))
        }
        DataType::Int64 => {
            let arr = col.as_primitive::<Int64Type>();
            collect_cells(n, col, |i| Value::Integer(arr.value(i)))
        }
        DataType::Float32 => {
            let arr = col.as_primitive::<Float32Type>();
            collect_cells(n, col, |i| Value::Float(arr.value(i) as f64))
        }
        DataType::Float64 => {
            let arr = col.as_primitive::<Float64Type>();
            collect_cells(n, col, |i| Value::Float(arr.value(i)))
        }
        DataType::Boolean => {
            let arr = col.as_boolean();
            collect_cells(n, col, |i| Value::Bool(arr.value(i)))
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let micros = cast(col, &DataType::Timestamp(TimeUnit::Microsecond, None))?;
            let arr = micros.as_primitive::<TimestampMicrosecondType>();
            collect_cells(n, col, |i| {
                arr.value_as_datetime(i)
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null)
            })
        }
        other => collect_cells(n, col, |_| Value::String(format!("{other:?}"))),
    };
    Ok(values)
}

fn collect_cells<F>(n: usize, col: &ArrayRef, mut cell: F) -> Vec<Value>
where
    F: FnMut(usize) -> Value,
{
    (0..n)
        .map(|i| if col.is_null(i) { Value::Null } else { cell(i) })
        .collect()
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse one textual date or datetime; bare dates land on midnight.
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Convert the `Date` column to timestamps. No-op without a `Date` column;
/// nulls stay null and any other unparseable cell fails the whole dataset.
pub fn parse_dates(dataset: &Dataset) -> Result<Dataset> {
    let Some(col) = dataset.field_index(Field::Date) else {
        debug!("No {} column; skipping date parsing", Field::Date);
        return Ok(dataset.clone());
    };

    let mut parsed = dataset.clone();
    for record in &mut parsed.records {
        let cell = &mut record.values[col];
        let converted = match &*cell {
            Value::Timestamp(_) | Value::Null => continue,
            Value::String(s) => parse_date_text(s),
            _ => None,
        };
        *cell = match converted {
            Some(ts) => Value::Timestamp(ts),
            None => {
                return Err(PipelineError::DateParse {
                    row: record.index,
                    value: cell.to_string(),
                })
            }
        };
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = " Date ,Appr_depth, Longitude,Latitude ,Temp\n\
        2024-06-01,0,-95.36,38.92,24.5\n\
        2024-06-01,4,-95.37,38.93,\n\
        2024-06-02,7,-95.38,38.91,22.25\n";

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_value_type(""), Value::Null);
        assert_eq!(guess_value_type("NaN"), Value::Null);
        assert_eq!(guess_value_type("7"), Value::Integer(7));
        assert_eq!(guess_value_type("-95.5"), Value::Float(-95.5));
        assert_eq!(guess_value_type("true"), Value::Bool(true));
        assert_eq!(guess_value_type("buoy"), Value::String("buoy".into()));
    }

    #[test]
    fn source_parse_recognises_urls() {
        assert_eq!(
            Source::parse("https://example.org/a.csv"),
            Source::Url("https://example.org/a.csv".into())
        );
        assert_eq!(
            Source::parse("data/buoy.csv"),
            Source::Path(PathBuf::from("data/buoy.csv"))
        );
    }

    #[test]
    fn url_format_ignores_query_and_defaults_to_csv() {
        assert_eq!(url_format("https://x.org/data.json?raw=1"), Format::Json);
        assert_eq!(url_format("https://x.org/data.parquet"), Format::Parquet);
        assert_eq!(url_format("https://x.org/export"), Format::Csv);
    }

    #[test]
    fn load_csv_file_normalises_and_parses_dates() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let ds = load(&Source::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(
            ds.columns,
            vec!["Date", "Appr_depth", "Longitude", "Latitude", "Temp"]
        );
        assert_eq!(ds.len(), 3);
        let first_date = ds.value(&ds.records[0], Field::Date).unwrap();
        assert_eq!(
            first_date.as_timestamp().unwrap().date(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(ds.value(&ds.records[1], Field::Temp), Some(&Value::Null));
    }

    #[test]
    fn load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"Date":"2024-06-01","Temp":20.5},{"Temp":19,"Date":"2024-06-02"}]"#)
            .unwrap();

        let ds = load(&Source::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.has(Field::Date));
        assert_eq!(ds.value(&ds.records[1], Field::Temp), Some(&Value::Integer(19)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load(&Source::Path(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn short_csv_rows_are_padded_with_null() {
        let ds = read_csv("a,b,c\n1,2\n4,5,6\n".as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.records[0].values,
            vec![Value::Integer(1), Value::Integer(2), Value::Null]
        );
        assert_eq!(ds.records[1].values[2], Value::Integer(6));
    }

    #[test]
    fn long_csv_rows_are_rejected() {
        let err = read_csv("a,b\n1,2\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RowWidth { row: 1, expected: 2, found: 3 }
        ));
    }

    #[test]
    fn non_utf8_csv_fails() {
        let err = read_csv(&b"a,b\n\xff,2\n"[..]).unwrap_err();
        assert!(matches!(err, PipelineError::Csv(_)));
    }

    #[test]
    fn unreachable_url_is_a_fetch_error() {
        let url = "http://127.0.0.1:1/buoys.csv";
        let err = load(&Source::Url(url.into())).unwrap_err();
        assert!(matches!(&err, PipelineError::Fetch { url: u, .. } if u == url));
    }

    #[test]
    fn parse_date_text_accepts_common_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_time(NaiveTime::MIN);
        assert_eq!(parse_date_text("2024-01-02"), Some(midnight));
        assert_eq!(parse_date_text("01/02/2024"), Some(midnight));
        assert_eq!(
            parse_date_text("2024-01-02 06:30:00").map(|t| t.time()),
            NaiveTime::from_hms_opt(6, 30, 0)
        );
        assert_eq!(parse_date_text("yesterday"), None);
    }

    #[test]
    fn parse_dates_rejects_garbage() {
        let ds = read_csv("Date,Temp\n2024-01-01,1\nnot a date,2\n".as_bytes()).unwrap();
        let err = parse_dates(&ds).unwrap_err();
        assert!(matches!(err, PipelineError::DateParse { row: 1, .. }));
    }

    #[test]
    fn parse_dates_without_date_column_is_noop() {
        let ds = read_csv("Temp\n1\n".as_bytes()).unwrap();
        assert_eq!(parse_dates(&ds).unwrap(), ds);
    }
}
