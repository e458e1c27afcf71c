use std::collections::HashSet;
use std::fmt;

use super::error::SweepError;

// ---------------------------------------------------------------------------
// Cell – a single value in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe loader infers.
///
/// `Float` never holds NaN: NaN-like input is loaded as [`Cell::Missing`],
/// which keeps equality and hashing well-defined for duplicate detection.
#[derive(Debug, Clone)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Missing,
}

// -- Manual Eq/Hash so rows can be put in a HashSet --

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        use Cell::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Missing, Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Int(i) => i.hash(state),
            // 0.0 and -0.0 compare equal, so they must hash equal too.
            Cell::Float(f) => {
                let f = if *f == 0.0 { 0.0 } else { *f };
                f.to_bits().hash(state)
            }
            Cell::Bool(b) => b.hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Missing => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{}", format_float(*v)),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => write!(f, "<null>"),
        }
    }
}

impl Cell {
    /// Numeric view of the cell, `None` for non-numbers and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Float(v) => Some(*v),
            Cell::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }
}

/// Render a float so that integral values keep a trailing `.0`; the text then
/// re-loads as a float column rather than an integer one.
pub fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    /// A column is numeric when it holds only numbers and missing cells, and
    /// at least one number. An entirely missing column is not numeric.
    pub fn is_numeric(&self) -> bool {
        let mut any_number = false;
        for cell in &self.cells {
            match cell {
                Cell::Int(_) | Cell::Float(_) => any_number = true,
                Cell::Missing => {}
                _ => return false,
            }
        }
        any_number
    }

    /// Arithmetic mean of the non-missing numeric cells.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .cells
            .iter()
            .filter_map(Cell::as_f64)
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered, named columns with rows aligned by position.
///
/// Invariants (checked by [`Table::new`]): every column has the same length
/// and column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, SweepError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(SweepError::DuplicateColumn(col.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(bad) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(SweepError::RaggedColumn {
                    column: bad.name.clone(),
                    len: bad.cells.len(),
                    expected,
                });
            }
        }
        Ok(Table { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Borrow row `i` across all columns.
    pub fn row(&self, i: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.cells[i]).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.num_rows()).map(move |i| self.row(i))
    }

    /// Whether row `i` holds at least one missing cell.
    pub fn row_has_missing(&self, i: usize) -> bool {
        self.columns.iter().any(|c| c.cells[i].is_missing())
    }

    /// Keep the rows whose flag in `keep` is set, preserving order.
    pub fn retain_rows(&self, keep: &[bool]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                cells: c
                    .cells
                    .iter()
                    .zip(keep)
                    .filter(|(_, &k)| k)
                    .map(|(cell, _)| cell.clone())
                    .collect(),
            })
            .collect();
        Table { columns }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                cells: c.cells.iter().take(n).cloned().collect(),
            })
            .collect();
        Table { columns }
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("a", vec![Cell::Text("x".into()), Cell::Text("y".into())]),
            Column::new("b", vec![Cell::Float(1.5), Cell::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let err = Table::new(vec![
            Column::new("a", vec![Cell::Int(1)]),
            Column::new("a", vec![Cell::Int(2)]),
        ])
        .unwrap_err();
        assert!(matches!(err, SweepError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn rejects_unequal_column_lengths() {
        let err = Table::new(vec![
            Column::new("a", vec![Cell::Int(1), Cell::Int(2)]),
            Column::new("b", vec![Cell::Int(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, SweepError::RaggedColumn { len: 1, expected: 2, .. }));
    }

    #[test]
    fn numeric_detection_ignores_missing_but_needs_a_number() {
        let t = sample();
        assert!(!t.column("a").unwrap().is_numeric());
        assert!(t.column("b").unwrap().is_numeric());
        let empty = Column::new("c", vec![Cell::Missing, Cell::Missing]);
        assert!(!empty.is_numeric());
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn retain_and_head_keep_order() {
        let t = sample();
        let kept = t.retain_rows(&[false, true]);
        assert_eq!(kept.num_rows(), 1);
        assert_eq!(kept.row(0), vec![&Cell::Text("y".into()), &Cell::Missing]);
        assert_eq!(t.head(1).num_rows(), 1);
        assert_eq!(t.head(10).num_rows(), 2);
    }

    #[test]
    fn signed_zero_hashes_like_zero() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Cell::Float(0.0));
        assert!(set.contains(&Cell::Float(-0.0)));
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(2.25), "2.25");
        assert_eq!(Cell::Missing.to_string(), "<null>");
    }
}
