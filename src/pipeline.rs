use chrono::NaiveDate;
use log::{debug, warn};

use crate::data::filter::{
    date_range, depth_options, filter_by_date, filter_by_depth, DateRange, DepthChoice, Selection,
};
use crate::data::model::{Dataset, Field};
use crate::data::projection::{render_records, CellSize, GridLayer, RenderRecord};
use crate::data::summary::tooltip_text;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Pipeline output
// ---------------------------------------------------------------------------

/// Everything one interaction produces for the rendering boundary, plus the
/// choices the input widgets should offer next.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Selectable dates, `None` without a `Date` column.
    pub date_range: Option<DateRange>,
    /// Depth selector entries, `None` without an `Appr_depth` column.
    pub depth_options: Option<Vec<DepthChoice>>,
    /// The selection actually applied (unset date resolved to the default).
    pub selection: Selection,
    /// The filtered dataset.
    pub rows: Dataset,
    pub render_records: Vec<RenderRecord>,
    pub layer: GridLayer,
    pub tooltip: String,
}

impl PipelineOutput {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Run the full filter → project → summarise pass.
///
/// Always starts from `dataset`, which is never modified, so the same
/// inputs give the same output.
pub fn run(dataset: &Dataset, selection: &Selection, cell_size: CellSize) -> Result<PipelineOutput> {
    let range = date_range(dataset);
    let date = if dataset.has(Field::Date) {
        resolve_date(range, selection.date)
    } else {
        None
    };
    let by_date = match date {
        Some(d) => filter_by_date(dataset, d),
        None => dataset.clone(),
    };

    let options = depth_options(&by_date);
    if let Some(opts) = &options {
        if !opts.contains(&selection.depth) {
            warn!(
                "Depth {} is not offered for this date (options: {:?})",
                selection.depth, opts
            );
        }
    }
    let rows = filter_by_depth(&by_date, selection.depth);

    let applied = Selection {
        date,
        depth: selection.depth,
    };
    debug!(
        "Pipeline: date={:?} depth={} cell_size={} → {} of {} rows",
        applied.date,
        applied.depth,
        cell_size.get(),
        rows.len(),
        dataset.len()
    );

    let render_records = render_records(&rows)?;
    let layer = GridLayer::build(&rows, cell_size)?;
    let tooltip = tooltip_text(&rows);

    Ok(PipelineOutput {
        date_range: range,
        depth_options: options,
        selection: applied,
        rows,
        render_records,
        layer,
        tooltip,
    })
}

/// An explicit pick wins, even when the column holds no dates at all;
/// otherwise the earliest date.
fn resolve_date(range: Option<DateRange>, picked: Option<NaiveDate>) -> Option<NaiveDate> {
    match (picked, range) {
        (Some(d), Some(r)) if !r.contains(d) => {
            warn!("Date {d} is outside {}..={}", r.min, r.max);
            Some(d)
        }
        (Some(d), _) => Some(d),
        (None, r) => r.map(|r| r.default_date()),
    }
}
