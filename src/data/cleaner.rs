use std::collections::HashSet;
use std::fmt;

use super::model::{Cell, Column, Table};

// ---------------------------------------------------------------------------
// Cleaning configuration
// ---------------------------------------------------------------------------

/// Which cleaning operations to run. All off by default (opt-in).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CleaningConfig {
    pub remove_duplicates: bool,
    pub fill_numeric_nulls: bool,
    pub drop_null_rows: bool,
}

/// A single cleaning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleaningOp {
    RemoveDuplicates,
    FillNumericNulls,
    DropNullRows,
}

impl CleaningOp {
    pub const ALL: [CleaningOp; 3] = [
        CleaningOp::RemoveDuplicates,
        CleaningOp::FillNumericNulls,
        CleaningOp::DropNullRows,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CleaningOp::RemoveDuplicates => "Remove duplicates",
            CleaningOp::FillNumericNulls => "Fill missing numeric values",
            CleaningOp::DropNullRows => "Remove rows with nulls",
        }
    }

    pub fn apply(self, table: &Table) -> (Table, CleanEffect) {
        match self {
            CleaningOp::RemoveDuplicates => remove_duplicates(table),
            CleaningOp::FillNumericNulls => fill_numeric_nulls(table),
            CleaningOp::DropNullRows => drop_null_rows(table),
        }
    }
}

impl CleaningConfig {
    pub fn is_enabled(&self, op: CleaningOp) -> bool {
        match op {
            CleaningOp::RemoveDuplicates => self.remove_duplicates,
            CleaningOp::FillNumericNulls => self.fill_numeric_nulls,
            CleaningOp::DropNullRows => self.drop_null_rows,
        }
    }

    pub fn toggle(&mut self, op: CleaningOp) -> &mut bool {
        match op {
            CleaningOp::RemoveDuplicates => &mut self.remove_duplicates,
            CleaningOp::FillNumericNulls => &mut self.fill_numeric_nulls,
            CleaningOp::DropNullRows => &mut self.drop_null_rows,
        }
    }

    /// Enabled operations in canonical order: duplicates, fill, drop.
    pub fn ops(&self) -> Vec<CleaningOp> {
        CleaningOp::ALL
            .into_iter()
            .filter(|op| self.is_enabled(*op))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.remove_duplicates || self.fill_numeric_nulls || self.drop_null_rows
    }
}

// ---------------------------------------------------------------------------
// Effects reported back to the user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanEffect {
    DuplicatesRemoved(usize),
    NumericNullsFilled { rows: usize, columns: Vec<String> },
    /// Nothing to fill: the table has no numeric column.
    NoNumericColumns,
    NullRowsRemoved(usize),
}

impl CleanEffect {
    /// Rows removed or touched by the operation.
    pub fn affected_rows(&self) -> usize {
        match self {
            CleanEffect::DuplicatesRemoved(n) | CleanEffect::NullRowsRemoved(n) => *n,
            CleanEffect::NumericNullsFilled { rows, .. } => *rows,
            CleanEffect::NoNumericColumns => 0,
        }
    }

    /// Informational notices rather than changes.
    pub fn is_warning(&self) -> bool {
        matches!(self, CleanEffect::NoNumericColumns)
    }
}

impl fmt::Display for CleanEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanEffect::DuplicatesRemoved(n) => write!(f, "Removed {n} duplicate rows."),
            CleanEffect::NumericNullsFilled { rows: 0, .. } => {
                write!(f, "No missing numeric values to fill.")
            }
            CleanEffect::NumericNullsFilled { rows, columns } => write!(
                f,
                "Filled missing numeric values with the column mean ({rows} rows, columns: {}).",
                columns.join(", ")
            ),
            CleanEffect::NoNumericColumns => {
                write!(f, "No numeric columns available to fill missing values.")
            }
            CleanEffect::NullRowsRemoved(n) => write!(f, "Removed {n} rows with null values."),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run every enabled operation of `config` in canonical order.
pub fn clean(table: &Table, config: &CleaningConfig) -> (Table, Vec<CleanEffect>) {
    apply(table, &config.ops())
}

/// Run `ops` in the given order, each on the previous result.
pub fn apply(table: &Table, ops: &[CleaningOp]) -> (Table, Vec<CleanEffect>) {
    let mut current = table.clone();
    let mut effects = Vec::with_capacity(ops.len());
    for op in ops {
        let (next, effect) = op.apply(&current);
        log::debug!("{}: {} rows affected", op.label(), effect.affected_rows());
        current = next;
        effects.push(effect);
    }
    (current, effects)
}

/// Drop rows that exactly repeat an earlier row. First occurrence wins.
pub fn remove_duplicates(table: &Table) -> (Table, CleanEffect) {
    let mut seen: HashSet<Vec<&Cell>> = HashSet::with_capacity(table.num_rows());
    let keep: Vec<bool> = table.rows().map(|row| seen.insert(row)).collect();
    let removed = keep.iter().filter(|k| !**k).count();
    (table.retain_rows(&keep), CleanEffect::DuplicatesRemoved(removed))
}

/// Replace missing cells of every numeric column with that column's mean.
///
/// Means are taken over the original values, before any replacement. A
/// column with no values at all is not numeric and is left untouched, and so
/// is one whose mean is not finite (e.g. it holds both `inf` and `-inf`).
pub fn fill_numeric_nulls(table: &Table) -> (Table, CleanEffect) {
    if table.numeric_columns().next().is_none() {
        return (table.clone(), CleanEffect::NoNumericColumns);
    }

    let mut touched = vec![false; table.num_rows()];
    let mut filled_columns = Vec::new();

    let columns: Vec<Column> = table
        .columns()
        .iter()
        .map(|col| {
            let mean = match col.mean() {
                Some(m) if m.is_finite() && col.is_numeric() && col.missing_count() > 0 => m,
                _ => return col.clone(),
            };
            filled_columns.push(col.name.clone());
            let cells = col
                .cells
                .iter()
                .enumerate()
                .map(|(i, cell)| match cell {
                    Cell::Missing => {
                        touched[i] = true;
                        Cell::Float(mean)
                    }
                    Cell::Int(v) => Cell::Float(*v as f64),
                    other => other.clone(),
                })
                .collect();
            Column::new(col.name.clone(), cells)
        })
        .collect();

    let rows = touched.iter().filter(|t| **t).count();
    let filled = Table::new(columns).unwrap_or_else(|_| table.clone());
    (
        filled,
        CleanEffect::NumericNullsFilled {
            rows,
            columns: filled_columns,
        },
    )
}

/// Drop every row holding at least one missing cell.
pub fn drop_null_rows(table: &Table) -> (Table, CleanEffect) {
    let keep: Vec<bool> = (0..table.num_rows())
        .map(|i| !table.row_has_missing(i))
        .collect();
    let removed = keep.iter().filter(|k| !**k).count();
    (table.retain_rows(&keep), CleanEffect::NullRowsRemoved(removed))
}
