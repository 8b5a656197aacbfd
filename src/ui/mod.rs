//! Presentation layer: thin egui glue over the pure data/chart/model
//! layers. All state lives in [`crate::state::AppState`]; these functions
//! only render it and write widget changes back.

pub mod panels;
pub mod plot;
pub mod predict;
