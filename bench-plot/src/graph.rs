use plotters::prelude::*;

use crate::{PlotError, Result, Series};

/// One subplot: a title and a set of labeled lines
#[derive(Debug, Clone, Default)]
pub struct Panel {
    /// Caption of the subplot, usually the problem id
    pub title: String,
    /// Label and points of each line, usually one per model
    pub lines: Vec<(String, Series)>,
}

impl Panel {
    /// Create an empty panel
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: vec![],
        }
    }

    /// Add a labeled line
    pub fn push_line(&mut self, label: impl Into<String>, series: Series) {
        self.lines.push((label.into(), series))
    }

    /// Smallest rectangle containing every finite point
    fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut x = (f64::MAX, f64::MIN);
        let mut y = (f64::MAX, f64::MIN);
        for (px, py) in self.lines.iter().flat_map(|(_, s)| s.iter()) {
            if !px.is_finite() || !py.is_finite() {
                continue;
            }
            x = (x.0.min(*px), x.1.max(*px));
            y = (y.0.min(*py), y.1.max(*py));
        }
        (widen(x), widen(y))
    }
}

/// Make sure a range is non-empty so that the coordinate system can be built
fn widen(range: (f64, f64)) -> (f64, f64) {
    if range.0 > range.1 {
        return (0.0, 1.0);
    }
    if range.0 == range.1 {
        return (range.0 - 0.5, range.1 + 0.5);
    }
    range
}

/// Rows and columns of the subplot grid for `n` panels
pub fn grid_shape(n: usize) -> (usize, usize) {
    let rows = (n / 2).max(1);
    let cols = (n + rows - 1) / rows;
    (rows, cols.max(1))
}

/// Draw every panel into a grid and save it as a bitmap under `filename`
pub fn graph(panels: &[Panel], y_label: &str, filename: &str, dims: (u32, u32)) -> Result<()> {
    if panels.is_empty() {
        return Err(PlotError::Empty);
    }
    let (rows, cols) = grid_shape(panels.len());
    info!("plotting {} panels in a {}x{} grid to {}", panels.len(), rows, cols, filename);

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE).map_err(drawing)?;

    let areas = root_area.split_evenly((rows, cols));
    for (panel, area) in panels.iter().zip(areas.iter()) {
        let ((x_min, x_max), (y_min, y_max)) = panel.bounds();

        let mut cc = ChartBuilder::on(area)
            .margin(5)
            .set_all_label_area_size(50)
            .caption(&panel.title, ("sans-serif", 20).into_font().with_color(BLACK))
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(drawing)?;
        cc.configure_mesh()
            .x_labels(10)
            .y_labels(10)
            .x_desc("timestep")
            .y_desc(y_label)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.4}", v))
            .draw()
            .map_err(drawing)?;

        for (i, (label, series)) in panel.lines.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            cc.draw_series(LineSeries::new(series.iter().copied(), color))
                .map_err(drawing)?
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        cc.configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(drawing)?;
    }
    root_area.present().map_err(drawing)?;

    info!("successfully plotted to {}", filename);

    Ok(())
}

#[inline(always)]
fn drawing<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Drawing(e.to_string())
}
