use chrono::NaiveDate;

use buoy_grid::config::Config;
use buoy_grid::data::filter::{DepthChoice, Selection};
use buoy_grid::data::loader::{self, Source};
use buoy_grid::data::model::Dataset;
use buoy_grid::data::projection::CellSize;
use buoy_grid::deck::DeckDocument;
use buoy_grid::pipeline::{self, PipelineOutput};

use crate::color::TempColorScale;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: Config,

    /// Loaded dataset (None until a source loads).
    pub dataset: Option<Dataset>,

    /// Where `dataset` came from.
    pub source: Option<Source>,

    /// Current date / depth selection.
    pub selection: Selection,

    /// Grid cell size from the slider.
    pub cell_size: CellSize,

    /// Result of the last pipeline run.
    pub output: Option<PipelineOutput>,

    /// Colour ramp over the whole dataset, so colours stay put while filtering.
    pub color_scale: Option<TempColorScale>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cell_size = config.cell_size();
        Self {
            config,
            dataset: None,
            source: None,
            selection: Selection::default(),
            cell_size,
            output: None,
            color_scale: None,
            status_message: None,
        }
    }

    /// Fetch and ingest a source. Failures end up in `status_message`.
    pub fn load_source(&mut self, source: Source) {
        match loader::load(&source) {
            Ok(dataset) => {
                self.source = Some(source);
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset the selection.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.color_scale = TempColorScale::from_dataset(&dataset);
        self.selection = Selection::default();
        self.dataset = Some(dataset);
        self.status_message = None;
        self.recompute();
    }

    /// Re-run the pipeline for the current selection and cell size.
    pub fn recompute(&mut self) {
        let result = match &self.dataset {
            Some(ds) => pipeline::run(ds, &self.selection, self.cell_size),
            None => return,
        };

        match result {
            Ok(out) => {
                // A depth picked for another date may not be on offer any more.
                if let Some(opts) = &out.depth_options {
                    if !opts.contains(&self.selection.depth) {
                        log::warn!(
                            "Depth {} not available on {:?}; showing all depths",
                            self.selection.depth,
                            out.selection.date
                        );
                        self.selection.depth = DepthChoice::All;
                        return self.recompute();
                    }
                }
                self.selection.date = out.selection.date;
                self.status_message = None;
                self.output = Some(out);
            }
            Err(e) => {
                log::error!("Pipeline failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.output = None;
            }
        }
    }

    /// Pick a date; kept inside the dataset's date range.
    pub fn set_date(&mut self, date: NaiveDate) {
        let range = self.output.as_ref().and_then(|o| o.date_range);
        self.selection.date = Some(match range {
            Some(r) => r.clamp(date),
            None => date,
        });
        self.recompute();
    }

    pub fn set_depth(&mut self, depth: DepthChoice) {
        self.selection.depth = depth;
        self.recompute();
    }

    /// Slider input; clamped and snapped before it reaches the layer.
    pub fn set_cell_size(&mut self, value: i64) {
        self.cell_size = CellSize::clamped(value);
        self.recompute();
    }

    /// Deck document for the current output, as pretty JSON.
    pub fn export_json(&self) -> Option<serde_json::Result<String>> {
        self.output
            .as_ref()
            .map(|out| DeckDocument::new(&self.config, out).to_json_pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoy_grid::data::loader::{parse_dates, read_csv};

    fn state_with(csv: &str) -> AppState {
        let mut state = AppState::new(Config::default());
        state.set_dataset(parse_dates(&read_csv(csv.as_bytes()).unwrap()).unwrap());
        state
    }

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    const CSV: &str = "Date,Appr_depth,Longitude,Latitude,Temp\n\
        2024-01-01,0,-95.36,38.92,20\n\
        2024-01-02,4,-95.37,38.93,18\n\
        2024-01-01,1,-95.38,38.91,22\n";

    #[test]
    fn new_dataset_selects_first_date() {
        let state = state_with(CSV);
        assert_eq!(state.selection.date, Some(ymd(1)));
        assert_eq!(state.output.as_ref().unwrap().row_count(), 2);
    }

    #[test]
    fn depth_not_on_new_date_resets_to_all() {
        let mut state = state_with(CSV);
        state.set_depth(DepthChoice::Depth(1));
        assert_eq!(state.output.as_ref().unwrap().row_count(), 1);

        state.set_date(ymd(2));
        assert_eq!(state.selection.depth, DepthChoice::All);
        assert_eq!(state.output.as_ref().unwrap().row_count(), 1);
    }

    #[test]
    fn date_outside_range_is_clamped() {
        let mut state = state_with(CSV);
        state.set_date(ymd(20));
        assert_eq!(state.selection.date, Some(ymd(2)));
    }

    #[test]
    fn slider_value_is_clamped() {
        let mut state = state_with(CSV);
        state.set_cell_size(5000);
        assert_eq!(state.cell_size.get(), 600);
        assert_eq!(state.output.as_ref().unwrap().layer.cell_size.get(), 600);
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = state_with(CSV);
        state.load_source(Source::Path("/nonexistent/buoys.csv".into()));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
        assert_eq!(state.dataset.as_ref().unwrap().len(), 3);
        assert_eq!(state.output.as_ref().unwrap().row_count(), 2);
    }

    #[test]
    fn export_includes_tooltip() {
        let state = state_with(CSV);
        let json = state.export_json().unwrap().unwrap();
        assert!(json.contains("Average Temp: 21.00°C"));
    }
}
