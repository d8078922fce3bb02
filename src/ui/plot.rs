use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Plot, PlotPoints, Points};

use buoy_grid::data::model::Field;

use crate::state::AppState;

/// Number of temperature bands in the legend.
const TEMP_BINS: usize = 8;

// ---------------------------------------------------------------------------
// Position preview (central panel)
// ---------------------------------------------------------------------------

/// Scatter of the filtered readings at their buoy positions, coloured by
/// temperature. A stand-in for the basemap grid layer, which lives outside
/// this app.
pub fn position_plot(ui: &mut Ui, state: &AppState) {
    let Some(output) = &state.output else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view buoy readings  (File → Open…)");
        });
        return;
    };

    ui.heading(&state.config.title);
    ui.label(&output.tooltip);

    let rows = &output.rows;
    if !(rows.has(Field::Longitude) && rows.has(Field::Latitude)) {
        ui.label("This source has no Longitude/Latitude columns.");
        return;
    }

    // Bucket points by temperature band so each band is one legend entry.
    let bins = state.color_scale.map(|s| s.bins(TEMP_BINS)).unwrap_or_default();
    let mut banded: Vec<Vec<[f64; 2]>> = vec![Vec::new(); bins.len()];
    let mut unbanded: Vec<[f64; 2]> = Vec::new();

    for record in &rows.records {
        let lon = rows.value(record, Field::Longitude).and_then(|v| v.as_f64());
        let lat = rows.value(record, Field::Latitude).and_then(|v| v.as_f64());
        let (Some(lon), Some(lat)) = (lon, lat) else {
            continue;
        };
        let temp = rows.value(record, Field::Temp).and_then(|v| v.as_f64());
        match (temp, state.color_scale) {
            (Some(t), Some(scale)) if !bins.is_empty() => {
                banded[scale.bin_index(t, bins.len())].push([lon, lat]);
            }
            _ => unbanded.push([lon, lat]),
        }
    }

    let radius = 2.0 + state.cell_size.get() as f32 / 100.0;

    Plot::new("position_plot")
        .legend(Legend::default())
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .data_aspect(1.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for ((label, _, color), points) in bins.iter().zip(banded) {
                if points.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .name(label)
                        .color(*color)
                        .radius(radius),
                );
            }
            if !unbanded.is_empty() {
                plot_ui.points(
                    Points::new(PlotPoints::new(unbanded))
                        .name("no Temp")
                        .color(Color32::GRAY)
                        .radius(radius),
                );
            }
        });
}
