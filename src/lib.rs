//! Buoy temperature pipeline: load a CSV of buoy readings, filter by date and
//! approximate depth, and emit deck.gl grid-layer JSON with an average
//! temperature tooltip.

pub mod config;
pub mod data;
pub mod deck;
pub mod error;
pub mod pipeline;
