use std::{fmt, io, path::Path};

use crate::{ExperimentError, Result, ResultsTable};

/// Problem x model table of mean scores for one metric.
/// Failed or missing trials have no score and are rendered as `-`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    metric: String,
    problems: Vec<String>,
    models: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl Scoreboard {
    /// Compute the means of every (problem, model) cell
    pub fn new(results: &ResultsTable, metric: &str, problems: &[String], models: &[String]) -> Self {
        let cells = problems
            .iter()
            .map(|p| {
                models
                    .iter()
                    .map(|m| {
                        if results.failed(p, m) {
                            return None;
                        }
                        results.get(metric, p, m).map(|v| v.mean())
                    })
                    .collect()
            })
            .collect();

        Self {
            metric: metric.to_string(),
            problems: problems.to_vec(),
            models: models.to_vec(),
            cells,
        }
    }

    /// The metric being compared
    #[inline(always)]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Mean score of a cell, `None` if the trial failed or was not run
    pub fn get(&self, problem: &str, model: &str) -> Option<f64> {
        let i = self.problems.iter().position(|p| p == problem)?;
        let j = self.models.iter().position(|m| m == model)?;
        self.cells[i][j]
    }

    /// Write rows of the form `problem_id,[scores...]` preceded by a `Models,[...]` header row
    pub fn write_csv<W: io::Write>(&self, writer: csv::Writer<W>) -> Result<csv::Writer<W>> {
        let mut writer = writer;
        writer.write_record(["Models".to_string(), format!("[{}]", self.models.join(", "))])?;
        for (problem, row) in self.problems.iter().zip(self.cells.iter()) {
            let scores: Vec<String> = row.iter().map(|c| fmt_cell(*c)).collect();
            writer.write_record([problem.clone(), format!("[{}]", scores.join(", "))])?;
        }
        writer.flush()?;

        Ok(writer)
    }

    /// The csv export as a string
    pub fn to_csv(&self) -> Result<String> {
        let writer = self.write_csv(csv_builder().from_writer(vec![]))?;
        let bytes = writer.into_inner().map_err(|e| ExperimentError::Io(e.into_error()))?;

        String::from_utf8(bytes).map_err(|e| ExperimentError::InvalidConfig(e.to_string()))
    }

    /// Write the csv export to `path`
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(csv_builder().from_path(path)?)?;
        info!("saved {} scoreboard to {}", self.metric, path.display());

        Ok(())
    }
}

/// Cells hold bracketed lists with commas, which are written out unquoted
fn csv_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false).quote_style(csv::QuoteStyle::Never);
    builder
}

fn fmt_cell(cell: Option<f64>) -> String {
    match cell {
        Some(v) => format!("{:.6}", v),
        None => "-".to_string(),
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CORNER: &str = "Problems\\Models";

        let rows: Vec<Vec<String>> = self
            .cells
            .iter()
            .map(|row| row.iter().map(|c| fmt_cell(*c)).collect())
            .collect();
        let first = self
            .problems
            .iter()
            .map(|p| p.len())
            .chain(std::iter::once(CORNER.len()))
            .max()
            .unwrap_or(CORNER.len());
        let widths: Vec<usize> = self
            .models
            .iter()
            .enumerate()
            .map(|(j, m)| rows.iter().map(|r| r[j].len()).chain(std::iter::once(m.len())).max().unwrap_or(0))
            .collect();

        let separator = {
            let mut s = format!("+{}+", "-".repeat(first + 2));
            for w in widths.iter() {
                s.push_str(&format!("{}+", "-".repeat(w + 2)));
            }
            s
        };

        writeln!(f, "Average {}:", self.metric)?;
        writeln!(f, "{}", separator)?;
        write!(f, "| {:<first$} |", CORNER, first = first)?;
        for (m, w) in self.models.iter().zip(widths.iter()) {
            write!(f, " {:<w$} |", m, w = w)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", separator)?;
        for (problem, row) in self.problems.iter().zip(rows.iter()) {
            write!(f, "| {:<first$} |", problem, first = first)?;
            for (cell, w) in row.iter().zip(widths.iter()) {
                write!(f, " {:>w$} |", cell, w = w)?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResultKey, ResultValue, TrialFailure, TrialOutcome};

    fn table() -> ResultsTable {
        let mut t = ResultsTable::new();
        t.insert(ResultKey::new("mse", "ARMA-v0", "RNN"), ResultValue::Series(vec![1.0, 3.0]));
        t.insert(ResultKey::new("time", "ARMA-v0", "RNN"), ResultValue::Scalar(0.25));
        t.insert_outcome("mse", "Pendulum-v0", "RNN", &TrialOutcome::Failed(TrialFailure::Incompatible));
        t
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn means_and_failures() {
        let board = Scoreboard::new(&table(), "mse", &ids(&["ARMA-v0", "Pendulum-v0"]), &ids(&["RNN"]));
        assert_eq!(board.get("ARMA-v0", "RNN"), Some(2.0));
        assert_eq!(board.get("Pendulum-v0", "RNN"), None);

        // failed trials are excluded from the timing comparison as well
        let board = Scoreboard::new(&table(), "time", &ids(&["ARMA-v0", "Pendulum-v0"]), &ids(&["RNN"]));
        assert_eq!(board.get("ARMA-v0", "RNN"), Some(0.25));
        assert_eq!(board.get("Pendulum-v0", "RNN"), None);
    }

    #[test]
    fn csv_and_display() {
        let board = Scoreboard::new(&table(), "mse", &ids(&["ARMA-v0", "Pendulum-v0"]), &ids(&["RNN"]));
        assert_eq!(
            board.to_csv().unwrap(),
            "Models,[RNN]\nARMA-v0,[2.000000]\nPendulum-v0,[-]\n"
        );
        let rendered = board.to_string();
        assert!(rendered.starts_with("Average mse:\n"));
        assert!(rendered.contains("| ARMA-v0         | 2.000000 |"));
        assert!(rendered.contains("| Pendulum-v0     |        - |"));
    }

    #[test]
    fn save_as_writes_file() {
        let board = Scoreboard::new(
            &table(),
            "mse",
            &ids(&["ARMA-v0"]),
            &ids(&["RNN", "ESN"]),
        );
        let path = std::env::temp_dir().join("scoreboard_save_as_writes_file.csv");
        board.save_as(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Models,[RNN, ESN]\nARMA-v0,[2.000000, -]\n");
        std::fs::remove_file(&path).unwrap();

        let missing_dir = std::env::temp_dir().join("no_such_dir_for_scoreboard").join("out.csv");
        assert!(matches!(board.save_as(&missing_dir), Err(ExperimentError::Csv(_))));
    }
}
