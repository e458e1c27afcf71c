use std::sync::Arc;

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};

use super::error::SweepError;
use super::model::{format_float, Cell, Table};

// ---------------------------------------------------------------------------
// Target formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetFormat {
    #[default]
    Csv,
    Xlsx,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 2] = [TargetFormat::Csv, TargetFormat::Xlsx];

    pub fn label(self) -> &'static str {
        match self {
            TargetFormat::Csv => "CSV",
            TargetFormat::Xlsx => "Excel",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Csv => "csv",
            TargetFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            TargetFormat::Csv => "text/csv",
            TargetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// One converted file, ready for download or archiving.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub format: TargetFormat,
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Arc<[u8]>,
}

impl ConversionResult {
    pub fn new(basename: &str, index: usize, format: TargetFormat, bytes: Arc<[u8]>) -> Self {
        ConversionResult {
            format,
            filename: output_filename(basename, index, format),
            mime: format.mime(),
            bytes,
        }
    }
}

/// `{basename}_{index}.{ext}`. The per-file index keeps names unique within a
/// batch even when two uploads share a name.
pub fn output_filename(basename: &str, index: usize, format: TargetFormat) -> String {
    format!("{basename}_{index}.{}", format.extension())
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize `table` without any row-index column.
pub fn convert(table: &Table, format: TargetFormat) -> Result<Vec<u8>, SweepError> {
    match format {
        TargetFormat::Csv => to_csv(table),
        TargetFormat::Xlsx => to_xlsx(table),
    }
}

fn csv_field(cell: &Cell) -> String {
    match cell {
        Cell::Missing => String::new(),
        Cell::Float(v) => format_float(*v),
        other => other.to_string(),
    }
}

fn to_csv(table: &Table) -> Result<Vec<u8>, SweepError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
    for row in table.rows() {
        writer.write_record(row.into_iter().map(csv_field))?;
    }
    writer
        .into_inner()
        .map_err(|e| SweepError::CsvWrite(e.to_string()))
}

fn to_xlsx(table: &Table) -> Result<Vec<u8>, SweepError> {
    let mut workbook = Workbook::new();
    // Pin the creation time so equal tables give equal bytes.
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));
    let sheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (c, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(c)
            .map_err(|_| SweepError::XlsxWrite(format!("too many columns ({c})")))?;
        sheet.write_string_with_format(0, col, &column.name, &header_format)?;

        for (r, cell) in column.cells.iter().enumerate() {
            let row = u32::try_from(r + 1)
                .map_err(|_| SweepError::XlsxWrite(format!("too many rows ({r})")))?;
            match cell {
                Cell::Int(v) => {
                    sheet.write_number(row, col, *v as f64)?;
                }
                Cell::Float(v) => {
                    sheet.write_number(row, col, *v)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row, col, *b)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                Cell::Missing => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load, FileKind};
    use crate::data::model::Column;

    fn csv(text: &str) -> Table {
        load(FileKind::Csv, text.as_bytes()).unwrap()
    }

    fn mixed() -> Table {
        csv("name,count,score,ok\nalpha,1,1,true\n\"b, c\",2,,false\ngamma,3,2.5,true\n")
    }

    #[test]
    fn csv_output_has_no_index_and_keeps_float_points() {
        let bytes = convert(&mixed(), TargetFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "name,count,score,ok\nalpha,1,1.0,True\n\"b, c\",2,,False\ngamma,3,2.5,True\n"
        );
    }

    #[test]
    fn csv_round_trip_reloads_the_same_table() {
        let t = mixed();
        let bytes = convert(&t, TargetFormat::Csv).unwrap();
        assert_eq!(load(FileKind::Csv, &bytes).unwrap(), t);
    }

    #[test]
    fn csv_output_is_deterministic() {
        let t = mixed();
        assert_eq!(
            convert(&t, TargetFormat::Csv).unwrap(),
            convert(&t, TargetFormat::Csv).unwrap()
        );
    }

    #[test]
    fn xlsx_output_is_deterministic() {
        let t = mixed();
        let first = convert(&t, TargetFormat::Xlsx).unwrap();
        // Outlast the one-second resolution of workbook timestamps.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(first, convert(&t, TargetFormat::Xlsx).unwrap());
    }

    #[test]
    fn xlsx_round_trip_through_the_loader() {
        let t = mixed();
        let bytes = convert(&t, TargetFormat::Xlsx).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        let back = load(FileKind::Xlsx, &bytes).unwrap();
        assert_eq!(back.column_names(), t.column_names());
        assert_eq!(back, t);
    }

    #[test]
    fn empty_table_still_converts() {
        let t = Table::new(vec![Column::new("only", Vec::new())]).unwrap();
        let text = String::from_utf8(convert(&t, TargetFormat::Csv).unwrap()).unwrap();
        assert_eq!(text, "only\n");
        assert!(convert(&t, TargetFormat::Xlsx).is_ok());
    }

    #[test]
    fn filenames_and_mime_types() {
        assert_eq!(output_filename("sales", 2, TargetFormat::Csv), "sales_2.csv");
        assert_eq!(output_filename("sales", 0, TargetFormat::Xlsx), "sales_0.xlsx");
        let result = ConversionResult::new("q1", 1, TargetFormat::Xlsx, Arc::from(vec![1u8]));
        assert_eq!(result.filename, "q1_1.xlsx");
        assert_eq!(result.mime, TargetFormat::Xlsx.mime());
        assert_eq!(TargetFormat::Csv.mime(), "text/csv");
    }
}
