use super::model::{Dataset, Field, Value};

/// Tooltip shown when the filters leave nothing to average.
pub const NO_DATA_TEXT: &str = "No data for selected filters";

/// Mean of the numeric `Temp` cells, nulls skipped. `None` when the column
/// is missing or holds no numbers.
pub fn mean_temperature(dataset: &Dataset) -> Option<f64> {
    let (sum, count) = dataset
        .column_values(Field::Temp)
        .into_iter()
        .filter_map(Value::as_f64)
        .fold((0.0, 0usize), |(sum, n), t| (sum + t, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Tooltip text for the grid layer, e.g. `Average Temp: 21.35°C`.
pub fn tooltip_text(dataset: &Dataset) -> String {
    if !dataset.has(Field::Temp) || dataset.is_empty() {
        return NO_DATA_TEXT.to_string();
    }
    match mean_temperature(dataset) {
        Some(avg) => format!("Average Temp: {avg:.2}°C"),
        None => NO_DATA_TEXT.to_string(),
    }
}
