use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// Value – a single cell of the buoy table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV reader infers.
/// Used as a `BTreeSet` key downstream so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

// Equality follows `cmp`, so NaN equals itself and -0.0 differs from 0.0,
// matching `Hash` on the float bits.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Timestamp(_) => 5,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the cell; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Field – the columns the pipeline knows about
// ---------------------------------------------------------------------------

/// Columns with a meaning to the pipeline. Any of them may be missing from
/// a given source; each stage checks [`Dataset::has`] before touching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    ApprDepth,
    Longitude,
    Latitude,
    Temp,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Date,
        Field::ApprDepth,
        Field::Longitude,
        Field::Latitude,
        Field::Temp,
    ];

    /// Column name after whitespace normalisation.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Date => "Date",
            Field::ApprDepth => "Appr_depth",
            Field::Longitude => "Longitude",
            Field::Latitude => "Latitude",
            Field::Temp => "Temp",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single buoy reading. `values` is aligned with [`Dataset::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Position of the row in the source file; survives filtering.
    pub index: usize,
    pub values: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Dataset – the loaded table
// ---------------------------------------------------------------------------

/// The loaded table. Treated as immutable: filters build new datasets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from raw rows, numbering them in source order.
    /// Short rows are padded with `Null`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut values)| {
                values.resize(width, Value::Null);
                Record { index, values }
            })
            .collect();
        Dataset { columns, records }
    }

    /// Strip surrounding whitespace from every column name. Case and inner
    /// spacing are kept, so applying this twice changes nothing.
    pub fn normalize_columns(mut self) -> Self {
        for col in &mut self.columns {
            let trimmed = col.trim();
            if trimmed.len() != col.len() {
                *col = trimmed.to_string();
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.column_index(field.column_name())
    }

    /// Capability check for a known column.
    pub fn has(&self, field: Field) -> bool {
        self.field_index(field).is_some()
    }

    /// Cell of `record` for `field`, if the column exists.
    pub fn value<'a>(&self, record: &'a Record, field: Field) -> Option<&'a Value> {
        self.field_index(field).and_then(|i| record.values.get(i))
    }

    /// All cells of one column, in record order. Empty when absent.
    pub fn column_values(&self, field: Field) -> Vec<&Value> {
        match self.field_index(field) {
            Some(i) => self.records.iter().filter_map(|r| r.values.get(i)).collect(),
            None => Vec::new(),
        }
    }

    /// Sorted distinct values of one column.
    pub fn unique_values(&self, field: Field) -> BTreeSet<Value> {
        self.column_values(field).into_iter().cloned().collect()
    }

    /// New dataset holding the records that satisfy `keep`, order preserved.
    pub fn retain_records<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        Dataset {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
