use std::fmt;

use chrono::NaiveDate;

use super::model::{Dataset, Field, Value};

// ---------------------------------------------------------------------------
// Date filter
// ---------------------------------------------------------------------------

/// Earliest and latest calendar dates present in the `Date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateRange {
    /// The date a fresh selection starts on.
    pub fn default_date(&self) -> NaiveDate {
        self.min
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }

    /// Pull `date` back inside the range.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }
}

/// Selectable date range, or `None` when there is no `Date` column or it
/// holds no timestamps.
pub fn date_range(dataset: &Dataset) -> Option<DateRange> {
    let mut dates = dataset
        .column_values(Field::Date)
        .into_iter()
        .filter_map(Value::as_timestamp)
        .map(|t| t.date());

    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange { min, max })
}

/// Records whose date, ignoring time of day, equals `date`.
/// Without a `Date` column the dataset passes through unchanged.
pub fn filter_by_date(dataset: &Dataset, date: NaiveDate) -> Dataset {
    let Some(col) = dataset.field_index(Field::Date) else {
        return dataset.clone();
    };
    dataset.retain_records(|r| {
        r.values[col]
            .as_timestamp()
            .is_some_and(|t| t.date() == date)
    })
}

// ---------------------------------------------------------------------------
// Depth filter
// ---------------------------------------------------------------------------

/// Approximate depths offered to the user, in display order.
pub const DEPTH_ALLOW_LIST: [i64; 4] = [0, 1, 4, 7];

/// A depth selection: everything, or one approximate depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthChoice {
    #[default]
    All,
    Depth(i64),
}

impl fmt::Display for DepthChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthChoice::All => f.write_str("All"),
            DepthChoice::Depth(d) => write!(f, "{d}"),
        }
    }
}

impl std::str::FromStr for DepthChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(DepthChoice::All);
        }
        s.parse::<i64>()
            .map(DepthChoice::Depth)
            .map_err(|_| format!("expected 'All' or an integer depth, got '{s}'"))
    }
}

fn depth_matches(value: &Value, depth: i64) -> bool {
    value.as_f64().is_some_and(|v| v == depth as f64)
}

/// Options for the depth selector: `All`, then each allow-listed depth that
/// occurs in the data, always in [`DEPTH_ALLOW_LIST`] order.
/// `None` when there is no `Appr_depth` column.
pub fn depth_options(dataset: &Dataset) -> Option<Vec<DepthChoice>> {
    if !dataset.has(Field::ApprDepth) {
        return None;
    }
    let present = dataset.unique_values(Field::ApprDepth);

    let mut options = vec![DepthChoice::All];
    options.extend(
        DEPTH_ALLOW_LIST
            .iter()
            .filter(|&&d| present.iter().any(|v| depth_matches(v, d)))
            .map(|&d| DepthChoice::Depth(d)),
    );
    Some(options)
}

/// Records at the chosen depth. `All`, or a dataset without `Appr_depth`,
/// passes through unchanged.
pub fn filter_by_depth(dataset: &Dataset, choice: DepthChoice) -> Dataset {
    let DepthChoice::Depth(depth) = choice else {
        return dataset.clone();
    };
    let Some(col) = dataset.field_index(Field::ApprDepth) else {
        return dataset.clone();
    };
    dataset.retain_records(|r| depth_matches(&r.values[col], depth))
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// What the user picked in the current interaction. `date: None` means
/// "use the default date of the range".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub date: Option<NaiveDate>,
    pub depth: DepthChoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse_dates, read_csv};

    fn dataset(csv: &str) -> Dataset {
        parse_dates(&read_csv(csv.as_bytes()).unwrap()).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_spans_min_and_max() {
        let ds = dataset("Date\n2024-01-03\n2024-01-01 12:00:00\n2024-01-02\n");
        let range = date_range(&ds).unwrap();
        assert_eq!(range.min, ymd(2024, 1, 1));
        assert_eq!(range.max, ymd(2024, 1, 3));
        assert_eq!(range.default_date(), ymd(2024, 1, 1));
        assert_eq!(range.clamp(ymd(2025, 1, 1)), ymd(2024, 1, 3));
        assert!(range.contains(ymd(2024, 1, 2)));
    }

    #[test]
    fn date_range_absent_without_date_column() {
        assert_eq!(date_range(&dataset("Temp\n1\n")), None);
    }

    #[test]
    fn filter_by_date_ignores_time_of_day() {
        let ds = dataset("Date,Temp\n2024-01-01 06:00:00,1\n2024-01-02,2\n2024-01-01 18:30:00,3\n");
        let out = filter_by_date(&ds, ymd(2024, 1, 1));
        let indices: Vec<usize> = out.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
        for r in &out.records {
            let ts = out.value(r, Field::Date).and_then(Value::as_timestamp).unwrap();
            assert_eq!(ts.date(), ymd(2024, 1, 1));
        }
    }

    #[test]
    fn filter_by_date_with_no_match_is_empty() {
        let ds = dataset("Date\n2024-01-01\n");
        assert!(filter_by_date(&ds, ymd(1999, 1, 1)).is_empty());
    }

    #[test]
    fn filter_by_date_without_column_is_noop() {
        let ds = dataset("Temp\n1\n2\n");
        assert_eq!(filter_by_date(&ds, ymd(2024, 1, 1)), ds);
    }

    #[test]
    fn depth_options_follow_allow_list_order() {
        let ds = dataset("Appr_depth\n7\n1\n0\n9\n4\n");
        assert_eq!(
            depth_options(&ds).unwrap(),
            vec![
                DepthChoice::All,
                DepthChoice::Depth(0),
                DepthChoice::Depth(1),
                DepthChoice::Depth(4),
                DepthChoice::Depth(7),
            ]
        );
    }

    #[test]
    fn depth_options_match_float_depths() {
        let ds = dataset("Appr_depth\n4.0\n\n");
        assert_eq!(
            depth_options(&ds).unwrap(),
            vec![DepthChoice::All, DepthChoice::Depth(4)]
        );
    }

    #[test]
    fn depth_options_absent_without_column() {
        assert_eq!(depth_options(&dataset("Temp\n1\n")), None);
    }

    #[test]
    fn depth_all_is_identity() {
        let ds = dataset("Appr_depth,Temp\n0,1\n1,2\n");
        assert_eq!(filter_by_depth(&ds, DepthChoice::All), ds);
    }

    #[test]
    fn depth_value_keeps_all_and_only_matching_records() {
        let ds = dataset("Appr_depth,Temp\n0,1\n1,2\n0,3\n4,4\n");
        let out = filter_by_depth(&ds, DepthChoice::Depth(0));
        let indices: Vec<usize> = out.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn depth_choice_parses_from_text() {
        assert_eq!("All".parse::<DepthChoice>(), Ok(DepthChoice::All));
        assert_eq!(" 4 ".parse::<DepthChoice>(), Ok(DepthChoice::Depth(4)));
        assert!("deep".parse::<DepthChoice>().is_err());
    }
}
