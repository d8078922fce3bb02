use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data::projection::{GridLayer, RenderRecord};
use crate::pipeline::PipelineOutput;

pub const CARTO_POSITRON: &str = "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json";

/// Basemap camera and style, as passed to MapLibre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub style: String,
    /// `(longitude, latitude)`
    pub center: (f64, f64),
    pub zoom: f64,
    pub pitch: f64,
    pub hash: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            style: CARTO_POSITRON.to_string(),
            center: (-95.3678, 38.9219),
            zoom: 12.0,
            pitch: 40.0,
            hash: true,
        }
    }
}

/// The document handed to the map renderer for one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct DeckDocument {
    pub title: String,
    pub map: MapOptions,
    pub layers: Vec<GridLayer>,
    pub tooltip: String,
    pub records: Vec<RenderRecord>,
}

impl DeckDocument {
    pub fn new(config: &Config, output: &PipelineOutput) -> Self {
        DeckDocument {
            title: config.title.clone(),
            map: config.map.clone(),
            layers: vec![output.layer.clone()],
            tooltip: output.tooltip.clone(),
            records: output.render_records.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
