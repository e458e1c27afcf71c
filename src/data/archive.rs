use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::SweepError;

/// Name offered for a bulk download made at `now`.
pub fn archive_filename(now: chrono::DateTime<chrono::Local>) -> String {
    format!("converted_files_{}.zip", now.format("%Y%m%d_%H%M%S"))
}

/// Pack `(filename, bytes)` pairs into one deflate-compressed ZIP.
///
/// Entry names are used exactly as given and must be unique. No entries
/// still produces a valid (empty) archive.
pub fn archive<'a, I>(entries: I) -> Result<Vec<u8>, SweepError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen = HashSet::new();
    for (name, bytes) in entries {
        if !seen.insert(name) {
            return Err(SweepError::DuplicateEntry(name.to_string()));
        }
        zip.start_file(name, options)?;
        zip.write_all(bytes)
            .map_err(|e| SweepError::Archive(format!("writing '{name}': {e}")))?;
    }

    let cursor = zip.finish()?;
    log::debug!("archived {} entries", seen.len());
    Ok(cursor.into_inner())
}
