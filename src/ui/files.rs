use eframe::egui::{Color32, RichText, ScrollArea, Ui};

use crate::data::chart::ChartKind;
use crate::data::cleaner::CleaningOp;
use crate::data::convert::TargetFormat;
use crate::data::pipeline::{FileOutcome, FileReport, PREVIEW_ROWS};
use crate::state::{AppState, FileEntry};
use crate::ui::panels::{kb, save_download};
use crate::ui::{plot, preview};

/// Something a file section asks for that needs the whole state.
enum FileAction {
    Remove(usize),
    Convert(usize),
    Download(usize),
}

// ---------------------------------------------------------------------------
// Central panel – one section per uploaded file
// ---------------------------------------------------------------------------

pub fn batch_view(ui: &mut Ui, state: &mut AppState) {
    if state.files.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Upload CSV or Excel files to get started  (File → Upload files…, or drop them here)");
        });
        return;
    }

    let mut actions = Vec::new();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (index, (entry, report)) in state
                .files
                .iter_mut()
                .zip(&state.report.files)
                .enumerate()
            {
                ui.push_id(("file", index), |ui: &mut Ui| {
                    actions.extend(file_section(ui, index, entry, report));
                });
                ui.separator();
            }
        });

    for action in actions {
        match action {
            FileAction::Remove(index) => state.remove_file(index),
            FileAction::Convert(index) => state.request_conversion(index),
            FileAction::Download(index) => download(state, index),
        }
    }
}

fn download(state: &mut AppState, index: usize) {
    let Some(result) = state.report.files.get(index).and_then(FileReport::conversion) else {
        return;
    };
    log::info!("Downloading {} ({})", result.filename, result.format.label());
    match save_download(&result.filename, &result.bytes) {
        Ok(_) => state.status_message = None,
        Err(e) => {
            log::error!("Download failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn file_section(
    ui: &mut Ui,
    index: usize,
    entry: &mut FileEntry,
    report: &FileReport,
) -> Option<FileAction> {
    let mut action = None;

    ui.horizontal(|ui: &mut Ui| {
        ui.heading(format!("Processing: {}", report.name));
        if ui.small_button("Remove").clicked() {
            action = Some(FileAction::Remove(index));
        }
    });
    ui.label(format!("File Size: {:.2} KB", kb(report.size)));

    let outcome = match &report.outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            ui.label(
                RichText::new(format!("Error reading file {}: {e}", report.name))
                    .color(Color32::RED),
            );
            return action;
        }
    };

    ui.label(format!(
        "{} rows × {} columns",
        outcome.rows,
        outcome.all_columns.len()
    ));
    ui.strong(format!("Preview (first {PREVIEW_ROWS} rows):"));
    preview::preview_table(ui, "preview", &outcome.preview);

    ui.add_space(6.0);
    cleaning_section(ui, entry, outcome, &report.name);

    ui.add_space(6.0);
    column_section(ui, entry, outcome);

    ui.add_space(6.0);
    chart_section(ui, index, entry, outcome);

    ui.add_space(6.0);
    let download = conversion_section(ui, index, entry, outcome, &report.name);
    action.or(download)
}

fn cleaning_section(ui: &mut Ui, entry: &mut FileEntry, outcome: &FileOutcome, name: &str) {
    ui.strong("Data Cleaning Options");
    ui.checkbox(&mut entry.clean_enabled, format!("Clean data for {name}"));
    if !entry.clean_enabled {
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        for op in CleaningOp::ALL {
            ui.checkbox(entry.settings.cleaning.toggle(op), op.label());
        }
    });
    if !entry.settings.cleaning.any() {
        ui.weak("Pick one or more operations above.");
    }
    for effect in &outcome.effects {
        if effect.is_warning() {
            ui.label(RichText::new(effect.to_string()).color(Color32::YELLOW));
        } else {
            ui.label(effect.to_string());
        }
    }
}

fn column_section(ui: &mut Ui, entry: &mut FileEntry, outcome: &FileOutcome) {
    ui.strong("Select Columns to Convert");
    let selection = &mut entry.settings.columns;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for name in &outcome.all_columns {
            let mut checked = selection.is_selected(name);
            if ui.checkbox(&mut checked, name.as_str()).changed() {
                selection.toggle(name, &outcome.all_columns);
            }
        }
    });
    if !selection.is_default() {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(format!("Order: {}", selection.names().join(", ")));
            if ui.small_button("All columns").clicked() {
                selection.reset();
            }
        });
    }
    for notice in &outcome.notices {
        ui.label(RichText::new(notice.as_str()).color(Color32::YELLOW));
    }
}

fn chart_section(ui: &mut Ui, index: usize, entry: &mut FileEntry, outcome: &FileOutcome) {
    ui.strong("Data Visualization");
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut entry.show_chart, "Show visualization");
        if entry.show_chart {
            for kind in ChartKind::ALL {
                ui.radio_value(&mut entry.chart, kind, kind.label());
            }
        }
    });
    if !entry.show_chart {
        return;
    }
    match &outcome.chart {
        Some(Ok(data)) => plot::chart(ui, ("chart", index), data),
        Some(Err(warning)) => {
            ui.label(RichText::new(warning.to_string()).color(Color32::YELLOW));
        }
        // Settings changed this frame; the next pass fills it in.
        None => {
            ui.spinner();
        }
    }
}

fn conversion_section(
    ui: &mut Ui,
    index: usize,
    entry: &mut FileEntry,
    outcome: &FileOutcome,
    name: &str,
) -> Option<FileAction> {
    let mut action = None;
    ui.strong("Conversion Options");
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Convert to:");
        for format in TargetFormat::ALL {
            ui.radio_value(&mut entry.settings.target, format, format.label());
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button(format!("Convert {name}")).clicked() {
            action = Some(FileAction::Convert(index));
        }
        match &outcome.conversion {
            Some(Ok(result)) => {
                let button = ui
                    .button(format!("⬇ Download {}", result.filename))
                    .on_hover_text(result.mime);
                if button.clicked() {
                    action = Some(FileAction::Download(index));
                }
            }
            Some(Err(e)) => {
                ui.label(RichText::new(e.to_string()).color(Color32::RED));
            }
            None => {}
        }
    });
    action
}
