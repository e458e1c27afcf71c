use std::fmt;

use super::model::Table;

/// Rows shown in charts.
pub const CHART_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar",
            ChartKind::Line => "Line",
            ChartKind::Scatter => "Scatter",
        }
    }

    /// Numeric columns the chart needs.
    pub fn min_columns(self) -> usize {
        match self {
            ChartKind::Bar | ChartKind::Line => 1,
            ChartKind::Scatter => 2,
        }
    }
}

/// One numeric column over the charted rows. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Everything the plot needs, detached from the table.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Bar(Vec<Series>),
    Line(Vec<Series>),
    Scatter {
        x: String,
        y: String,
        points: Vec<[f64; 2]>,
    },
}

/// Why nothing can be charted. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartWarning {
    EmptyInput,
    InsufficientColumns { required: usize, found: usize },
}

impl fmt::Display for ChartWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartWarning::EmptyInput => {
                write!(f, "No numeric columns available for visualization.")
            }
            ChartWarning::InsufficientColumns { required, found } => write!(
                f,
                "Scatter plot needs at least {required} numeric columns, found {found}."
            ),
        }
    }
}

/// Build chart data from the numeric columns of `table`, first
/// [`CHART_ROWS`] rows only.
///
/// Whether a column is numeric is judged on the whole column, not on the
/// charted rows.
pub fn chart_data(table: &Table, kind: ChartKind) -> Result<ChartData, ChartWarning> {
    let series: Vec<Series> = table
        .numeric_columns()
        .map(|col| Series {
            name: col.name.clone(),
            values: col.cells.iter().take(CHART_ROWS).map(|c| c.as_f64()).collect(),
        })
        .collect();

    if series.is_empty() {
        return Err(ChartWarning::EmptyInput);
    }
    if series.len() < kind.min_columns() {
        return Err(ChartWarning::InsufficientColumns {
            required: kind.min_columns(),
            found: series.len(),
        });
    }

    Ok(match kind {
        ChartKind::Bar => ChartData::Bar(series),
        ChartKind::Line => ChartData::Line(series),
        ChartKind::Scatter => {
            let points = series[0]
                .values
                .iter()
                .zip(&series[1].values)
                .filter_map(|(x, y)| Some([(*x)?, (*y)?]))
                .collect();
            ChartData::Scatter {
                x: series[0].name.clone(),
                y: series[1].name.clone(),
                points,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load, FileKind};

    fn csv(text: &str) -> Table {
        load(FileKind::Csv, text.as_bytes()).unwrap()
    }

    #[test]
    fn bar_uses_numeric_columns_and_first_five_rows() {
        let t = csv("name,x,y\na,1,2\nb,2,\nc,3,4\nd,4,5\ne,5,6\nf,6,7\n");
        let ChartData::Bar(series) = chart_data(&t, ChartKind::Bar).unwrap() else {
            panic!("expected bar data");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "x");
        assert_eq!(series[0].values.len(), CHART_ROWS);
        assert_eq!(series[1].values[1], None);
    }

    #[test]
    fn numeric_detection_uses_the_whole_column() {
        // "v" looks numeric in the first five rows only.
        let t = csv("v,w\n1,1\n2,2\n3,3\n4,4\n5,5\noops,6\n");
        let ChartData::Line(series) = chart_data(&t, ChartKind::Line).unwrap() else {
            panic!("expected line data");
        };
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "w");
    }

    #[test]
    fn scatter_needs_two_numeric_columns() {
        let t = csv("name,x\na,1\n");
        assert_eq!(
            chart_data(&t, ChartKind::Scatter),
            Err(ChartWarning::InsufficientColumns { required: 2, found: 1 })
        );
        assert!(chart_data(&t, ChartKind::Bar).is_ok());
    }

    #[test]
    fn scatter_pairs_first_two_columns_and_skips_gaps() {
        let t = csv("x,y,z\n1,10,0\n2,,0\n3,30,0\n");
        let data = chart_data(&t, ChartKind::Scatter).unwrap();
        assert_eq!(
            data,
            ChartData::Scatter {
                x: "x".into(),
                y: "y".into(),
                points: vec![[1.0, 10.0], [3.0, 30.0]],
            }
        );
    }

    #[test]
    fn no_numeric_columns_is_a_warning() {
        let t = csv("a\nx\n");
        for kind in ChartKind::ALL {
            assert_eq!(chart_data(&t, kind), Err(ChartWarning::EmptyInput));
        }
    }
}
