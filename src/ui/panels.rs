use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use buoy_grid::data::filter::DepthChoice;
use buoy_grid::data::loader::Source;
use buoy_grid::data::projection::CellSize;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(output) = &state.output else {
        ui.label(if state.dataset.is_some() {
            "Nothing to show for this source."
        } else {
            "No dataset loaded."
        });
        return;
    };

    // Copy what the widgets need so `state` can be mutated below.
    let date_range = output.date_range;
    let depth_options = output.depth_options.clone();
    let tooltip = output.tooltip.clone();
    let row_count = output.row_count();

    // ---- Date ----
    if let (Some(range), Some(mut date)) = (date_range, state.selection.date) {
        ui.strong("Select Date");
        ui.add(DatePickerButton::new(&mut date));
        ui.small(format!("{} – {}", range.min, range.max));
        if Some(date) != state.selection.date {
            state.set_date(date);
        }
        ui.separator();
    }

    // ---- Appr_depth ----
    if let Some(options) = depth_options {
        ui.strong("Select Appr_depth");
        let current = state.selection.depth;
        let mut picked = current;
        egui::ComboBox::from_id_salt("appr_depth")
            .selected_text(current.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for opt in &options {
                    ui.selectable_value(&mut picked, *opt, opt.to_string());
                }
            });
        if picked != current {
            state.set_depth(picked);
        }
        ui.separator();
    }

    // ---- Cell size ----
    let mut cell = state.cell_size.get();
    let slider = egui::Slider::new(&mut cell, CellSize::MIN..=CellSize::MAX)
        .step_by(CellSize::STEP as f64)
        .text("cell size");
    if ui.add(slider).changed() {
        state.set_cell_size(cell as i64);
    }
    ui.separator();

    ui.label(format!("{row_count} readings"));
    ui.label(RichText::new(tooltip).strong());
    if state.selection.depth != DepthChoice::All {
        ui.small(format!("Depth {} only", state.selection.depth));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload configured source").clicked() {
                let source = Source::parse(&state.config.source_url);
                state.load_source(source);
                ui.close_menu();
            }
            if ui.button("Export deck JSON…").clicked() {
                save_export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(source) = &state.source {
            ui.label(RichText::new(source.to_string()).weak());
            ui.separator();
        }
        if let (Some(ds), Some(out)) = (&state.dataset, &state.output) {
            ui.label(format!("{} readings loaded, {} visible", ds.len(), out.row_count()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open buoy data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_source(Source::Path(path));
    }
}

pub fn save_export_dialog(state: &mut AppState) {
    let json = match state.export_json() {
        Some(Ok(json)) => json,
        Some(Err(e)) => {
            log::error!("Failed to serialise deck document: {e}");
            state.status_message = Some(format!("Error: {e}"));
            return;
        }
        None => return,
    };

    let file = rfd::FileDialog::new()
        .set_title("Export deck JSON")
        .set_file_name("buoy-grid.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        match std::fs::write(&path, json) {
            Ok(()) => log::info!("Exported deck document to {}", path.display()),
            Err(e) => {
                log::error!("Failed to write {}: {e}", path.display());
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
