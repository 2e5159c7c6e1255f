//! Rendering of benchmark loss curves

#[macro_use]
extern crate log;

mod error;
mod graph;

pub use error::{PlotError, Result};
pub use graph::{graph, grid_shape, Panel};

/// Points of a single line, (timestep, value)
pub type Series = Vec<(f64, f64)>;
