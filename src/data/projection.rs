use chrono::NaiveTime;
use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

use super::model::{Dataset, Field, Value};
use crate::error::{PipelineError, Result};

/// Reserved key under which each render record carries `[lon, lat]`.
pub const POSITION_KEY: &str = "getPosition";

/// One flat, scalar-only row handed to the renderer.
pub type RenderRecord = Map<String, JsonValue>;

// ---------------------------------------------------------------------------
// Timestamp → text
// ---------------------------------------------------------------------------

/// Text layout for one timestamp column: date only when every value sits on
/// midnight, full date-time otherwise.
fn timestamp_format(dataset: &Dataset, col: usize) -> &'static str {
    let all_midnight = dataset
        .records
        .iter()
        .filter_map(|r| r.values[col].as_timestamp())
        .all(|t| t.time() == NaiveTime::MIN);
    if all_midnight {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    }
}

fn cell_to_json(value: &Value, ts_format: &str, row: usize, column: &str) -> Result<JsonValue> {
    Ok(match value {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => {
            JsonValue::Number(Number::from_f64(*f).ok_or_else(|| PipelineError::Projection {
                row,
                column: column.to_string(),
                message: format!("{f} cannot be represented as a JSON number"),
            })?)
        }
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Timestamp(t) => JsonValue::String(t.format(ts_format).to_string()),
        Value::Null => JsonValue::Null,
    })
}

/// Flatten every record to a scalar-only map, timestamps rendered as text.
/// Any cell that cannot be expressed fails the whole batch.
pub fn serializable_rows(dataset: &Dataset) -> Result<Vec<RenderRecord>> {
    let formats: Vec<&str> = (0..dataset.columns.len())
        .map(|col| timestamp_format(dataset, col))
        .collect();

    dataset
        .records
        .iter()
        .map(|record| -> Result<RenderRecord> {
            let mut row = Map::with_capacity(dataset.columns.len() + 1);
            for ((name, value), fmt) in dataset.columns.iter().zip(&record.values).zip(&formats) {
                row.insert(name.clone(), cell_to_json(value, fmt, record.index, name)?);
            }
            Ok(row)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Render records
// ---------------------------------------------------------------------------

/// Render records with a `getPosition` pair per row.
///
/// Empty when either coordinate column is missing. Rows whose longitude or
/// latitude is missing or not numeric are left out, so every record
/// that is emitted has a position.
pub fn render_records(dataset: &Dataset) -> Result<Vec<RenderRecord>> {
    let (Some(lon_col), Some(lat_col)) = (
        dataset.field_index(Field::Longitude),
        dataset.field_index(Field::Latitude),
    ) else {
        log::debug!("Coordinates missing; no render records");
        return Ok(Vec::new());
    };

    let rows = serializable_rows(dataset)?;
    let mut out = Vec::with_capacity(rows.len());
    for (mut row, record) in rows.into_iter().zip(&dataset.records) {
        let coord = |col: usize| record.values[col].as_f64().and_then(Number::from_f64);
        let (Some(lon), Some(lat)) = (coord(lon_col), coord(lat_col)) else {
            log::warn!(
                "Row {}: no position ({}={}, {}={}); skipped",
                record.index,
                Field::Longitude,
                record.values[lon_col],
                Field::Latitude,
                record.values[lat_col]
            );
            continue;
        };
        let position = vec![JsonValue::Number(lon), JsonValue::Number(lat)];
        row.insert(POSITION_KEY.to_string(), JsonValue::Array(position));
        out.push(row);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Cell size
// ---------------------------------------------------------------------------

/// Grid cell size in metres: an integer in `MIN..=MAX` on a `STEP` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CellSize(u32);

impl CellSize {
    pub const MIN: u32 = 100;
    pub const MAX: u32 = 600;
    pub const STEP: u32 = 5;
    pub const DEFAULT: CellSize = CellSize(200);

    /// Accept exactly the values the slider can produce.
    pub fn new(value: i64) -> Result<Self> {
        let in_range = (Self::MIN as i64..=Self::MAX as i64).contains(&value);
        if in_range && value % Self::STEP as i64 == 0 {
            Ok(CellSize(value as u32))
        } else {
            Err(PipelineError::CellSize(value))
        }
    }

    /// Clamp into range and snap to the nearest step.
    pub fn clamped(value: i64) -> Self {
        let v = value.clamp(Self::MIN as i64, Self::MAX as i64) as u32;
        let snapped = ((v + Self::STEP / 2) / Self::STEP) * Self::STEP;
        CellSize(snapped.min(Self::MAX))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Grid layer descriptor
// ---------------------------------------------------------------------------

/// deck.gl `GridLayer` as understood by the pydeck/maplibre JSON converter.
/// The `@@=` strings are accessor expressions evaluated per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayer {
    #[serde(rename = "@@type")]
    pub layer_type: &'static str,
    pub id: String,
    pub data: Vec<RenderRecord>,
    pub extruded: bool,
    pub get_position: String,
    pub get_color_weight: String,
    pub get_elevation_weight: String,
    pub elevation_scale: u32,
    pub cell_size: CellSize,
    pub pickable: bool,
}

impl GridLayer {
    pub const TYPE: &'static str = "GridLayer";
    pub const ELEVATION_SCALE: u32 = 4;

    /// Build the layer from the filtered dataset itself, not from the render
    /// records: rows carry their columns only, with timestamps as text.
    pub fn build(dataset: &Dataset, cell_size: CellSize) -> Result<Self> {
        Ok(GridLayer {
            layer_type: Self::TYPE,
            id: Self::TYPE.to_string(),
            data: serializable_rows(dataset)?,
            extruded: true,
            get_position: format!(
                "@@=[{}, {}]",
                Field::Longitude.column_name(),
                Field::Latitude.column_name()
            ),
            get_color_weight: format!("@@={}", Field::Temp.column_name()),
            get_elevation_weight: format!("@@={}", Field::ApprDepth.column_name()),
            elevation_scale: Self::ELEVATION_SCALE,
            cell_size,
            pickable: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse_dates, read_csv};
    use serde_json::json;

    fn dataset(csv: &str) -> Dataset {
        parse_dates(&read_csv(csv.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn render_records_carry_position_in_lon_lat_order() {
        let ds = dataset("Date,Longitude,Latitude,Temp\n2024-01-01,-95.36,38.92,20.5\n");
        let records = render_records(&ds).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][POSITION_KEY], json!([-95.36, 38.92]));
        assert_eq!(records[0]["Date"], json!("2024-01-01"));
        assert_eq!(records[0]["Temp"], json!(20.5));
    }

    #[test]
    fn render_records_empty_without_coordinates() {
        let ds = dataset("Date,Longitude,Temp\n2024-01-01,-95.36,20.5\n");
        assert!(render_records(&ds).unwrap().is_empty());
    }

    #[test]
    fn render_records_skip_rows_without_a_position() {
        let ds = dataset("Longitude,Latitude,Temp\n-95.0,,20\n-95.1,38.9,21\nabc,38.8,22\n");
        let records = render_records(&ds).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][POSITION_KEY], json!([-95.1, 38.9]));
        assert_eq!(records[0]["Temp"], json!(21));
    }

    #[test]
    fn timestamps_keep_time_when_any_is_off_midnight() {
        let ds = dataset("Date\n2024-01-01\n2024-01-02 06:00:00\n");
        let rows = serializable_rows(&ds).unwrap();
        assert_eq!(rows[0]["Date"], json!("2024-01-01 00:00:00"));
        assert_eq!(rows[1]["Date"], json!("2024-01-02 06:00:00"));
    }

    #[test]
    fn non_finite_floats_fail_the_batch() {
        let ds = dataset("Temp\n1.0\ninf\n");
        assert!(matches!(
            serializable_rows(&ds),
            Err(PipelineError::Projection { row: 1, .. })
        ));
    }

    #[test]
    fn cell_size_rejects_out_of_range() {
        assert!(CellSize::new(95).is_err());
        assert!(CellSize::new(605).is_err());
        assert!(CellSize::new(203).is_err());
        assert_eq!(CellSize::new(100).unwrap().get(), 100);
        assert_eq!(CellSize::new(600).unwrap().get(), 600);
        assert_eq!(CellSize::default().get(), 200);
    }

    #[test]
    fn cell_size_clamps_and_snaps() {
        assert_eq!(CellSize::clamped(20).get(), 100);
        assert_eq!(CellSize::clamped(10_000).get(), 600);
        assert_eq!(CellSize::clamped(203).get(), 205);
        assert_eq!(CellSize::clamped(201).get(), 200);
    }

    #[test]
    fn grid_layer_serialises_deck_json() {
        let ds = dataset("Date,Appr_depth,Longitude,Latitude,Temp\n2024-01-01,0,-95.36,38.92,20.5\n");
        let layer = GridLayer::build(&ds, CellSize::new(250).unwrap()).unwrap();
        let v = serde_json::to_value(&layer).unwrap();
        assert_eq!(v["@@type"], json!("GridLayer"));
        assert_eq!(v["id"], json!("GridLayer"));
        assert_eq!(v["extruded"], json!(true));
        assert_eq!(v["getPosition"], json!("@@=[Longitude, Latitude]"));
        assert_eq!(v["getColorWeight"], json!("@@=Temp"));
        assert_eq!(v["getElevationWeight"], json!("@@=Appr_depth"));
        assert_eq!(v["elevationScale"], json!(4));
        assert_eq!(v["cellSize"], json!(250));
        assert_eq!(v["pickable"], json!(true));
        assert_eq!(v["data"][0]["Date"], json!("2024-01-01"));
        assert!(v["data"][0].get(POSITION_KEY).is_none());
    }
}
