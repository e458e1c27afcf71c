use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::{Cell, Table};

// ---------------------------------------------------------------------------
// Table preview
// ---------------------------------------------------------------------------

/// Render the first rows of `table` as a striped grid.
pub fn preview_table(ui: &mut Ui, id: impl std::hash::Hash, table: &Table) {
    if table.num_columns() == 0 {
        ui.label("Table has no columns.");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal()
            .auto_shrink([false, true])
            .show(ui, |ui: &mut Ui| {
                let mut builder = TableBuilder::new(ui)
                    .striped(true)
                    .vscroll(false)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                    .column(TableColumn::exact(36.0));
                for _ in table.columns() {
                    builder = builder.column(TableColumn::auto().at_least(60.0).clip(true));
                }

                builder
                    .header(20.0, |mut header| {
                        header.col(|ui| {
                            ui.weak("#");
                        });
                        for column in table.columns() {
                            header.col(|ui| {
                                ui.strong(column.name.as_str());
                            });
                        }
                    })
                    .body(|mut body| {
                        for (i, row) in table.rows().enumerate() {
                            body.row(18.0, |mut cells| {
                                cells.col(|ui| {
                                    ui.weak(i.to_string());
                                });
                                for cell in row {
                                    cells.col(|ui| {
                                        ui.label(cell_text(cell));
                                    });
                                }
                            });
                        }
                    });
            });
    });
}

fn cell_text(cell: &Cell) -> RichText {
    match cell {
        Cell::Missing => RichText::new("None").italics().color(Color32::GRAY),
        Cell::Int(_) | Cell::Float(_) => RichText::new(cell.to_string()).monospace(),
        other => RichText::new(other.to_string()),
    }
}
