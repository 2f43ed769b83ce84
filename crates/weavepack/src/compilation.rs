//! Turns the entry document into an asset graph
pub use asset_graph_builder::*;

pub mod classify;
pub mod resolve;
pub mod transform;

mod asset_graph_builder;
