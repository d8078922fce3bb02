use eframe::egui;

use buoy_grid::config::Config;
use buoy_grid::data::loader::Source;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct BuoyGridApp {
    pub state: AppState,
}

impl BuoyGridApp {
    /// Build the app and load `source` before the first frame.
    pub fn new(config: Config, source: Source) -> Self {
        let mut state = AppState::new(config);
        state.load_source(source);
        Self { state }
    }
}

impl eframe::App for BuoyGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: positions ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::position_plot(ui, &self.state);
        });
    }
}
