use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::archive::archive_filename;
use crate::data::chart::ChartKind;
use crate::data::cleaner::CleaningOp;
use crate::data::convert::TargetFormat;
use crate::data::loader::FileKind;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – session defaults and batch list
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Sweeper");
    ui.label("Transform your files between CSV and Excel formats.");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Defaults for new uploads");
            let defaults = &mut state.defaults;

            ui.checkbox(&mut defaults.clean_enabled, "Clean data");
            ui.add_enabled_ui(defaults.clean_enabled, |ui: &mut Ui| {
                for op in CleaningOp::ALL {
                    ui.checkbox(defaults.cleaning.toggle(op), op.label());
                }
            });

            ui.checkbox(&mut defaults.show_chart, "Show visualization");
            egui::ComboBox::from_id_salt("default_chart")
                .selected_text(defaults.chart.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut defaults.chart, kind, kind.label());
                    }
                });

            ui.horizontal(|ui: &mut Ui| {
                ui.label("Convert to:");
                for format in TargetFormat::ALL {
                    ui.radio_value(&mut defaults.target, format, format.label());
                }
            });

            if ui
                .add_enabled(!state.files.is_empty(), egui::Button::new("Apply to all files"))
                .clicked()
            {
                state.apply_defaults_to_all();
            }
            ui.separator();

            ui.strong(format!("Batch ({} files)", state.files.len()));
            if state.files.is_empty() {
                ui.label("No files uploaded.");
            }
            for (entry, report) in state.files.iter().zip(&state.report.files) {
                let text = format!("{}  ({:.2} KB)", entry.upload.name(), kb(report.size));
                match &report.outcome {
                    Ok(_) => ui.label(text),
                    Err(_) => ui.label(RichText::new(text).color(Color32::RED)),
                };
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload files…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Clear batch").clicked() {
                state.clear_batch();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(summary) = &state.summary {
            ui.label(summary.as_str());
            ui.separator();
        }

        let converted = state.converted_count();
        if converted > 0 {
            let label = format!("⬇ Download all converted files as ZIP ({converted})");
            if ui.button(label).clicked() {
                download_archive(state);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg.as_str()).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Upload your files (CSV or Excel)")
        .add_filter("Supported files", &FileKind::EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .pick_files();

    for path in files.unwrap_or_default() {
        if let Err(e) = upload_path(state, &path) {
            log::error!("Failed to upload file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn upload_path(state: &mut AppState, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    state.add_upload(name, bytes)?;
    Ok(())
}

/// Accept files dropped onto the window. Other file types are rejected at
/// this boundary.
pub fn handle_file_drop(ctx: &egui::Context, state: &mut AppState) {
    let dropped = ctx.input(|i| i.raw.dropped_files.clone());
    for file in dropped {
        let result = match (&file.bytes, &file.path) {
            (Some(bytes), _) => state
                .add_upload(&file.name, bytes.to_vec())
                .map_err(anyhow::Error::from),
            (None, Some(path)) => upload_path(state, path),
            (None, None) => continue,
        };
        if let Err(e) = result {
            log::warn!("Rejected dropped file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

/// Ask where to save `bytes`, pre-filling `filename`. Returns the path
/// written, or `None` when the user cancelled.
pub fn save_download(filename: &str, bytes: &[u8]) -> Result<Option<String>> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save converted file")
        .add_filter(ext.to_uppercase(), &[ext])
        .set_file_name(filename)
        .save_file()
    else {
        return Ok(None);
    };
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(Some(path.display().to_string()))
}

fn download_archive(state: &mut AppState) {
    let result = state
        .report
        .archive()
        .context("building ZIP archive")
        .and_then(|zip| match zip {
            Some(bytes) => save_download(&archive_filename(chrono::Local::now()), &bytes),
            None => Ok(None),
        });
    match result {
        Ok(Some(path)) => {
            log::info!("Wrote {} converted files to {path}", state.converted_count());
            state.status_message = None;
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Bulk download failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Bytes to kilobytes, for display.
pub fn kb(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}
