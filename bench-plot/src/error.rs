use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PlotError>;

/// Errors that can occur while rendering a graph
#[derive(Error, Debug)]
pub enum PlotError {
    /// Nothing to draw
    #[error("no panels to plot")]
    Empty,

    /// The drawing backend failed
    #[error("drawing failed: {0}")]
    Drawing(String),
}
