use super::error::SweepError;
use super::model::{Column, Table};

/// Project `table` onto `names`, in the caller's order.
///
/// An empty `names` keeps every column in its original order. A name given
/// twice keeps its first position.
pub fn select(table: &Table, names: &[String]) -> Result<Table, SweepError> {
    if names.is_empty() {
        return Ok(table.clone());
    }

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for name in names {
        if columns.iter().any(|c| &c.name == name) {
            continue;
        }
        let col = table
            .column(name)
            .ok_or_else(|| SweepError::UnknownColumn(name.clone()))?;
        columns.push(col.clone());
    }
    Table::new(columns)
}

/// The user's ordered column choice for one file.
///
/// Empty means the default: all columns, original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ColumnSelection {
    chosen: Vec<String>,
}

impl ColumnSelection {
    pub fn names(&self) -> &[String] {
        &self.chosen
    }

    pub fn is_default(&self) -> bool {
        self.chosen.is_empty()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.is_default() || self.chosen.iter().any(|c| c == name)
    }

    /// Flip `name` in or out of the selection. `all` is the table's column
    /// order, used to materialize the default before removing from it.
    pub fn toggle(&mut self, name: &str, all: &[String]) {
        if self.is_default() {
            self.chosen = all.iter().filter(|c| *c != name).cloned().collect();
        } else if let Some(pos) = self.chosen.iter().position(|c| c == name) {
            self.chosen.remove(pos);
        } else {
            self.chosen.push(name.to_string());
        }
        // Everything chosen again, or nothing left: back to the default.
        if self.chosen.is_empty() || self.chosen.as_slice() == all {
            self.chosen.clear();
        }
    }

    pub fn reset(&mut self) {
        self.chosen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load, FileKind};

    fn abc() -> Table {
        load(FileKind::Csv, b"a,b,c\n1,2,3\n4,5,6\n").unwrap()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn follows_caller_order() {
        let out = select(&abc(), &names(&["b", "a"])).unwrap();
        assert_eq!(out.column_names(), vec!["b", "a"]);
        assert_eq!(out.num_rows(), 2);
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let t = abc();
        assert_eq!(select(&t, &[]).unwrap(), t);
    }

    #[test]
    fn repeated_names_keep_first_position() {
        let out = select(&abc(), &names(&["c", "a", "c"])).unwrap();
        assert_eq!(out.column_names(), vec!["c", "a"]);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let err = select(&abc(), &names(&["zzz"])).unwrap_err();
        assert_eq!(err, SweepError::UnknownColumn("zzz".into()));
    }

    #[test]
    fn toggling_tracks_click_order() {
        let all = names(&["a", "b", "c"]);
        let mut sel = ColumnSelection::default();
        assert!(sel.is_selected("b"));

        sel.toggle("a", &all);
        assert_eq!(sel.names(), names(&["b", "c"]).as_slice());
        sel.toggle("a", &all);
        assert_eq!(sel.names(), names(&["b", "c", "a"]).as_slice());
        assert!(!sel.is_default());

        sel.toggle("b", &all);
        sel.toggle("c", &all);
        sel.toggle("a", &all);
        assert!(sel.is_default());
    }

    #[test]
    fn restoring_original_order_returns_to_default() {
        let all = names(&["a", "b"]);
        let mut sel = ColumnSelection::default();
        sel.toggle("b", &all);
        sel.toggle("b", &all);
        assert!(sel.is_default());
    }
}
