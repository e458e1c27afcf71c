use std::sync::Arc;

use super::archive::archive;
use super::cache::{cache_key, MemoCache};
use super::chart::{chart_data, ChartData, ChartKind, ChartWarning};
use super::cleaner::{clean, CleanEffect, CleaningConfig};
use super::convert::{convert, ConversionResult, TargetFormat};
use super::error::{ParseError, SweepError};
use super::loader::{load, UploadedFile};
use super::model::Table;
use super::select::{select, ColumnSelection};

/// Rows shown in the per-file preview.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Everything the user chose for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FileSettings {
    pub cleaning: CleaningConfig,
    pub columns: ColumnSelection,
    /// `None` hides the chart.
    pub chart: Option<ChartKind>,
    pub target: TargetFormat,
    /// Whether the user asked for this file to be converted.
    pub convert: bool,
}

/// What the pipeline produced for a file that loaded.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub rows: usize,
    /// Column names after loading, in original order.
    pub all_columns: Vec<String>,
    /// First rows of the table as loaded.
    pub preview: Table,
    pub effects: Vec<CleanEffect>,
    /// Cleaned and projected table, the one that gets converted.
    pub table: Arc<Table>,
    pub chart: Option<Result<ChartData, ChartWarning>>,
    pub conversion: Option<Result<ConversionResult, SweepError>>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub index: usize,
    pub name: String,
    pub size: usize,
    pub outcome: Result<FileOutcome, ParseError>,
}

impl FileReport {
    pub fn conversion(&self) -> Option<&ConversionResult> {
        match &self.outcome {
            Ok(FileOutcome {
                conversion: Some(Ok(result)),
                ..
            }) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn conversions(&self) -> impl Iterator<Item = &ConversionResult> {
        self.files.iter().filter_map(FileReport::conversion)
    }

    /// `(filename, bytes)` for every successful conversion, in upload order.
    pub fn archive_entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.conversions()
            .map(|c| (c.filename.as_str(), c.bytes.as_ref()))
    }

    /// Bulk ZIP of all conversions, `None` when there is nothing to offer.
    pub fn archive(&self) -> Result<Option<Vec<u8>>, SweepError> {
        if self.conversions().next().is_none() {
            return Ok(None);
        }
        archive(self.archive_entries()).map(Some)
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_err()).count()
    }
}

/// A step of batch processing, for progress display.
#[derive(Debug, Clone, Copy)]
pub enum Stage<'a> {
    Loading,
    Loaded { rows: usize, columns: usize },
    Failed(&'a ParseError),
    Converted(&'a str),
    Done,
}

#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
    pub stage: Stage<'a>,
}

impl<'a> Progress<'a> {
    fn new(index: usize, total: usize, name: &'a str, stage: Stage<'a>) -> Self {
        Progress {
            index,
            total,
            name,
            stage,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Cleaned {
    table: Arc<Table>,
    effects: Vec<CleanEffect>,
}

/// Runs load → clean → select → chart → convert per file, memoizing every
/// pure stage by content digest and parameters.
#[derive(Debug, Default)]
pub struct Pipeline {
    loads: MemoCache<Result<Arc<Table>, ParseError>>,
    cleans: MemoCache<Arc<Cleaned>>,
    projections: MemoCache<Result<Arc<Table>, SweepError>>,
    conversions: MemoCache<Result<Arc<[u8]>, SweepError>>,
}

impl Pipeline {
    /// Forget every memoized result.
    pub fn clear(&mut self) {
        self.loads.clear();
        self.cleans.clear();
        self.projections.clear();
        self.conversions.clear();
    }

    /// Drop results no file of the latest batch asked for.
    fn sweep(&mut self) -> usize {
        self.loads.sweep() + self.cleans.sweep() + self.projections.sweep() + self.conversions.sweep()
    }

    /// Number of memoized results across all stages.
    pub fn cached(&self) -> usize {
        self.loads.len() + self.cleans.len() + self.projections.len() + self.conversions.len()
    }

    /// Process files in order. A file that fails to load is reported and
    /// skipped; it never stops the batch. Afterwards only the results this
    /// batch used stay cached.
    pub fn process_batch<'a, I>(
        &mut self,
        files: I,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> BatchReport
    where
        I: IntoIterator<Item = (&'a UploadedFile, &'a FileSettings)>,
        I::IntoIter: ExactSizeIterator,
    {
        let files = files.into_iter();
        let total = files.len();
        let mut report = BatchReport::default();

        for (index, (upload, settings)) in files.enumerate() {
            let name = upload.name();
            on_progress(Progress::new(index, total, name, Stage::Loading));
            let file = self.process_file(index, upload, settings);
            match &file.outcome {
                Ok(outcome) => {
                    let stage = Stage::Loaded {
                        rows: outcome.rows,
                        columns: outcome.all_columns.len(),
                    };
                    on_progress(Progress::new(index, total, name, stage));
                    if let Some(result) = file.conversion() {
                        let stage = Stage::Converted(&result.filename);
                        on_progress(Progress::new(index, total, name, stage));
                    }
                }
                Err(e) => on_progress(Progress::new(index, total, name, Stage::Failed(e))),
            }
            report.files.push(file);
        }
        let dropped = self.sweep();
        let (hits, misses) = self.loads.stats();
        log::debug!(
            "load cache: {hits} hits, {misses} misses; {} results held, {dropped} dropped",
            self.cached()
        );
        on_progress(Progress::new(total, total, "", Stage::Done));
        report
    }

    /// Run every stage for one file. `index` is the file's position in the
    /// batch and ends up in the output filename.
    pub fn process_file(
        &mut self,
        index: usize,
        upload: &UploadedFile,
        settings: &FileSettings,
    ) -> FileReport {
        FileReport {
            index,
            name: upload.name().to_string(),
            size: upload.size(),
            outcome: self.run(index, upload, settings),
        }
    }

    fn run(
        &mut self,
        index: usize,
        upload: &UploadedFile,
        settings: &FileSettings,
    ) -> Result<FileOutcome, ParseError> {
        let digest = upload.digest();
        let kind = upload.kind();

        let loaded = self.loads.get_or_insert_with(cache_key(("load", digest, kind)), || {
            log::debug!("loading {}", upload.name());
            load(kind, upload.bytes()).map(Arc::new)
        })?;

        let clean_key = cache_key(("clean", digest, kind, settings.cleaning));
        let cleaned = self.cleans.get_or_insert_with(clean_key, || {
            let (table, effects) = clean(&loaded, &settings.cleaning);
            Arc::new(Cleaned {
                table: Arc::new(table),
                effects,
            })
        });

        let mut notices = Vec::new();
        let project_key = cache_key((clean_key, &settings.columns));
        let table = match self.projections.get_or_insert_with(project_key, || {
            select(&cleaned.table, settings.columns.names()).map(Arc::new)
        }) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{}: {e}, keeping all columns", upload.name());
                notices.push(format!("{e}; keeping all columns."));
                Arc::clone(&cleaned.table)
            }
        };

        let chart = settings.chart.map(|kind| chart_data(&table, kind));

        let conversion = settings.convert.then(|| {
            let key = cache_key((project_key, settings.target));
            self.conversions
                .get_or_insert_with(key, || {
                    let bytes = convert(&table, settings.target)?;
                    log::info!(
                        "converted {} to {} ({} bytes)",
                        upload.name(),
                        settings.target.label(),
                        bytes.len()
                    );
                    Ok(Arc::from(bytes))
                })
                .map(|bytes| {
                    ConversionResult::new(upload.basename(), index, settings.target, bytes)
                })
        });

        Ok(FileOutcome {
            rows: loaded.num_rows(),
            all_columns: loaded.column_names(),
            preview: loaded.head(PREVIEW_ROWS),
            effects: cleaned.effects.clone(),
            table,
            chart,
            conversion,
            notices,
        })
    }
}
