use crate::data::cache::cache_key;
use crate::data::chart::ChartKind;
use crate::data::cleaner::CleaningConfig;
use crate::data::convert::TargetFormat;
use crate::data::error::SweepError;
use crate::data::loader::UploadedFile;
use crate::data::pipeline::{BatchReport, FileSettings, Pipeline, Stage};

// ---------------------------------------------------------------------------
// Session defaults
// ---------------------------------------------------------------------------

/// Choices applied to every newly uploaded file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDefaults {
    pub clean_enabled: bool,
    pub cleaning: CleaningConfig,
    pub show_chart: bool,
    pub chart: ChartKind,
    pub target: TargetFormat,
}

// ---------------------------------------------------------------------------
// One uploaded file and its UI toggles
// ---------------------------------------------------------------------------

pub struct FileEntry {
    pub upload: UploadedFile,
    /// Master switch over `settings.cleaning`.
    pub clean_enabled: bool,
    pub show_chart: bool,
    pub chart: ChartKind,
    pub settings: FileSettings,
}

impl FileEntry {
    fn new(upload: UploadedFile, defaults: &SessionDefaults) -> Self {
        Self {
            upload,
            clean_enabled: defaults.clean_enabled,
            show_chart: defaults.show_chart,
            chart: defaults.chart,
            settings: FileSettings {
                cleaning: defaults.cleaning,
                target: defaults.target,
                ..FileSettings::default()
            },
        }
    }

    /// The settings the pipeline actually runs with.
    pub fn effective_settings(&self) -> FileSettings {
        let mut settings = self.settings.clone();
        if !self.clean_enabled {
            settings.cleaning = CleaningConfig::default();
        }
        settings.chart = self.show_chart.then_some(self.chart);
        settings
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Files of the current batch, in upload order.
    pub files: Vec<FileEntry>,

    pub defaults: SessionDefaults,

    /// Memoizing pipeline shared by every pass.
    pub pipeline: Pipeline,

    /// Result of the latest pass, one report per file.
    pub report: BatchReport,

    /// Hash of the inputs of the latest pass.
    fingerprint: Option<u64>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// One-line outcome of the latest pass.
    pub summary: Option<String>,
}

impl AppState {
    /// Accept an upload into the batch.
    pub fn add_upload(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), SweepError> {
        let upload = UploadedFile::new(name, bytes)?;
        log::info!("Uploaded {} ({} bytes)", upload.name(), upload.size());
        self.files.push(FileEntry::new(upload, &self.defaults));
        Ok(())
    }

    /// Drop one file. Later files shift down, and so do their output names.
    pub fn remove_file(&mut self, index: usize) {
        if index < self.files.len() {
            let entry = self.files.remove(index);
            log::info!("Removed {}", entry.upload.name());
            self.pipeline.clear();
        }
    }

    pub fn clear_batch(&mut self) {
        self.files.clear();
        self.pipeline.clear();
        self.report = BatchReport::default();
        self.fingerprint = None;
        self.summary = None;
        self.status_message = None;
    }

    /// Re-run the pipeline when files or settings changed since the last pass.
    pub fn refresh(&mut self) {
        let settings: Vec<FileSettings> =
            self.files.iter().map(FileEntry::effective_settings).collect();
        let fingerprint = cache_key(
            self.files
                .iter()
                .zip(&settings)
                .map(|(f, s)| (f.upload.digest(), s))
                .collect::<Vec<_>>(),
        );
        if self.fingerprint == Some(fingerprint) {
            return;
        }
        self.fingerprint = Some(fingerprint);

        self.report = self.pipeline.process_batch(
            self.files.iter().map(|f| &f.upload).zip(&settings),
            |p| match p.stage {
                Stage::Failed(e) => log::error!("Error reading file {}: {e}", p.name),
                Stage::Done => log::debug!("processed {} files", p.total),
                stage => log::debug!("[{}/{}] {}: {stage:?}", p.index + 1, p.total, p.name),
            },
        );

        self.summary = match (self.files.len(), self.report.failed()) {
            (0, _) => None,
            (n, 0) => Some(format!("All {n} files processed successfully!")),
            (n, f) => Some(format!("Processed {} of {n} files; {f} could not be read.", n - f)),
        };
    }

    /// Mark a file for conversion; the next pass produces its output.
    pub fn request_conversion(&mut self, index: usize) {
        if let Some(entry) = self.files.get_mut(index) {
            entry.settings.convert = true;
        }
    }

    pub fn converted_count(&self) -> usize {
        self.report.conversions().count()
    }

    /// Apply the current defaults to every file already in the batch.
    pub fn apply_defaults_to_all(&mut self) {
        for entry in &mut self.files {
            entry.clean_enabled = self.defaults.clean_enabled;
            entry.settings.cleaning = self.defaults.cleaning;
            entry.show_chart = self.defaults.show_chart;
            entry.chart = self.defaults.chart;
            entry.settings.target = self.defaults.target;
        }
    }
}
