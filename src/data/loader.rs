use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook_from_rs, Data, DataType, ExcelDateTime, Reader, Xlsx};
use chrono::{NaiveDateTime, NaiveTime};

use super::error::{ParseError, SweepError};
use super::model::{Cell, Column, Table};

// ---------------------------------------------------------------------------
// Uploaded files
// ---------------------------------------------------------------------------

/// The two formats a file may be uploaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Accepted upload extensions, lower-case and without the dot.
    pub const EXTENSIONS: [&'static str; 2] = ["csv", "xlsx"];

    pub fn from_name(name: &str) -> Result<Self, SweepError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            _ => Err(SweepError::UnsupportedUpload(name.to_string())),
        }
    }
}

/// A file received from the user. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    kind: FileKind,
    bytes: Arc<[u8]>,
    digest: u64,
}

impl UploadedFile {
    /// Accept an upload. Anything but `.csv` / `.xlsx` is rejected here, so
    /// the loader never sees an unknown extension.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, SweepError> {
        let name = name.into();
        let kind = FileKind::from_name(&name)?;
        let bytes = bytes.into();
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(UploadedFile {
            name,
            kind,
            digest: hasher.finish(),
            bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Hash of the raw content, used to key memoized stage results.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Upload name without its last extension.
    pub fn basename(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse raw bytes into a [`Table`], dispatching on the file kind.
pub fn load(kind: FileKind, bytes: &[u8]) -> Result<Table, ParseError> {
    match kind {
        FileKind::Csv => load_csv(bytes),
        FileKind::Xlsx => load_xlsx(bytes),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// The first record is the header. Shorter records are padded with missing
/// fields; a record longer than the header is an error.
fn load_csv(bytes: &[u8]) -> Result<Table, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(ParseError::Empty);
    }

    let width = headers.len();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ParseError::Csv(format!("row {}: {e}", row_no + 1)))?;
        if record.len() > width {
            return Err(ParseError::Csv(format!(
                "row {}: expected {width} fields, found {}",
                row_no + 1,
                record.len()
            )));
        }
        for (i, col) in raw.iter_mut().enumerate() {
            col.push(record.get(i).unwrap_or("").to_string());
        }
    }

    let columns = normalize_headers(headers)
        .into_iter()
        .zip(raw)
        .map(|(name, fields)| Column::new(name, infer_text_column(fields)))
        .collect();

    Table::new(columns).map_err(|e| ParseError::Shape(e.to_string()))
}

const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Surrounding whitespace is ignored when matching.
fn is_missing_token(s: &str) -> bool {
    MISSING_TOKENS.contains(&s.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Infer one type for a whole column of text fields. Numbers and booleans
/// may carry surrounding whitespace; text keeps it.
fn infer_text_column(fields: Vec<String>) -> Vec<Cell> {
    let present: Vec<&str> = fields
        .iter()
        .map(|s| s.trim())
        .filter(|s| !is_missing_token(s))
        .collect();
    let has_missing = present.len() < fields.len();

    let all_int = present.iter().all(|s| s.parse::<i64>().is_ok());
    let all_float = present.iter().all(|s| parse_float(s).is_some());
    let all_bool = present.iter().all(|s| parse_bool(s).is_some());

    if present.is_empty() {
        fields.into_iter().map(|_| Cell::Missing).collect()
    } else if all_int && !has_missing {
        map_present(fields, |v| v.trim().parse().map(Cell::Int).unwrap_or(Cell::Missing))
    } else if all_float {
        map_present(fields, |v| parse_float(v.trim()).map(Cell::Float).unwrap_or(Cell::Missing))
    } else if all_bool {
        map_present(fields, |v| parse_bool(v.trim()).map(Cell::Bool).unwrap_or(Cell::Missing))
    } else {
        map_present(fields, |v| Cell::Text(v.to_string()))
    }
}

fn map_present(fields: Vec<String>, f: impl Fn(&str) -> Cell) -> Vec<Cell> {
    fields
        .into_iter()
        .map(|s| if is_missing_token(&s) { Cell::Missing } else { f(&s) })
        .collect()
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

/// Read the first worksheet; its first row is the header.
fn load_xlsx(bytes: &[u8]) -> Result<Table, ParseError> {
    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes))
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names.first().ok_or(ParseError::NoSheets)?;
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ParseError::Spreadsheet(format!("sheet '{first}': {e}")))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(ParseError::Empty)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
            other => other.to_string(),
        })
        .collect();

    let mut raw: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, value) in raw.iter_mut().zip(row.iter()) {
            col.push(xlsx_cell(value));
        }
    }

    let columns = normalize_headers(headers)
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| Column::new(name, unify_typed_column(cells)))
        .collect();

    Table::new(columns).map_err(|e| ParseError::Shape(e.to_string()))
}

fn xlsx_cell(value: &Data) -> Cell {
    match value {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) if f.is_nan() => Cell::Missing,
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if is_missing_token(s) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::DateTime(dt) => excel_datetime(dt),
        Data::DateTimeIso(s) => match value.as_datetime() {
            Some(dt) => Cell::Text(format_datetime(dt)),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Dates become `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` when they carry a
/// time of day. Durations become `H:MM:SS`.
fn excel_datetime(dt: &ExcelDateTime) -> Cell {
    if dt.is_duration() {
        return match dt.as_duration() {
            Some(d) => {
                let secs = d.num_seconds();
                Cell::Text(format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60))
            }
            None => Cell::Missing,
        };
    }
    match dt.as_datetime() {
        Some(d) => Cell::Text(format_datetime(d)),
        None => Cell::Missing,
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Spreadsheet cells arrive already typed; settle each column on one type.
fn unify_typed_column(cells: Vec<Cell>) -> Vec<Cell> {
    let has_missing = cells.iter().any(Cell::is_missing);
    let present = || cells.iter().filter(|c| !c.is_missing());

    if present().all(Cell::is_number) {
        let integral = present().all(|c| match c {
            Cell::Int(_) => true,
            Cell::Float(f) => f.fract() == 0.0 && f.abs() < 9.0e15,
            _ => false,
        });
        if integral && !has_missing {
            return cells
                .into_iter()
                .map(|c| match c {
                    Cell::Float(f) => Cell::Int(f as i64),
                    other => other,
                })
                .collect();
        }
        return cells
            .into_iter()
            .map(|c| match c {
                Cell::Int(i) => Cell::Float(i as f64),
                other => other,
            })
            .collect();
    }
    if present().all(|c| matches!(c, Cell::Bool(_))) {
        return cells;
    }
    // Mixed column: keep everything as text.
    cells
        .into_iter()
        .map(|c| match c {
            Cell::Missing => Cell::Missing,
            Cell::Text(s) => Cell::Text(s),
            other => Cell::Text(other.to_string()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Header normalization
// ---------------------------------------------------------------------------

/// Blank headers become `Unnamed: {i}`; repeats get `.1`, `.2`, … suffixes.
fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::with_capacity(headers.len());

    for (i, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            header
        };
        let mut name = base.clone();
        while out.contains(&name) {
            let n = counts.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{base}.{n}");
        }
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> Table {
        load(FileKind::Csv, text.as_bytes()).unwrap()
    }

    #[test]
    fn upload_filter_rejects_unknown_extensions() {
        assert!(UploadedFile::new("report.CSV", b"a\n1\n".to_vec()).is_ok());
        assert!(UploadedFile::new("book.xlsx", Vec::new()).is_ok());
        let err = UploadedFile::new("notes.txt", b"hi".to_vec()).unwrap_err();
        assert!(matches!(err, SweepError::UnsupportedUpload(_)));
        assert!(UploadedFile::new("no_extension", Vec::new()).is_err());
    }

    #[test]
    fn basename_strips_last_extension_only() {
        let f = UploadedFile::new("sales.2024.csv", b"a\n".to_vec()).unwrap();
        assert_eq!(f.basename(), "sales.2024");
        assert_eq!(f.size(), 2);
    }

    #[test]
    fn same_content_same_digest() {
        let a = UploadedFile::new("a.csv", b"x\n1\n".to_vec()).unwrap();
        let b = UploadedFile::new("b.csv", b"x\n1\n".to_vec()).unwrap();
        let c = UploadedFile::new("c.csv", b"x\n2\n".to_vec()).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn infers_column_types() {
        let t = csv("name,count,ratio,flag,gaps\nx,1,0.5,true,1\ny,2,2,False,\n");
        assert_eq!(t.column("name").unwrap().cells[0], Cell::Text("x".into()));
        assert_eq!(t.column("count").unwrap().cells, vec![Cell::Int(1), Cell::Int(2)]);
        assert_eq!(t.column("ratio").unwrap().cells, vec![Cell::Float(0.5), Cell::Float(2.0)]);
        assert_eq!(t.column("flag").unwrap().cells, vec![Cell::Bool(true), Cell::Bool(false)]);
        // integers with a gap become floats
        assert_eq!(t.column("gaps").unwrap().cells, vec![Cell::Float(1.0), Cell::Missing]);
    }

    #[test]
    fn missing_tokens_and_mixed_columns() {
        let t = csv("v,w\nNA,1\nhello,NaN\n3,x\n");
        assert_eq!(
            t.column("v").unwrap().cells,
            vec![Cell::Missing, Cell::Text("hello".into()), Cell::Text("3".into())]
        );
        assert_eq!(t.column("w").unwrap().cells[1], Cell::Missing);
    }

    #[test]
    fn strips_bom_and_normalizes_headers() {
        let t = csv("\u{feff}a,a,,a\n1,2,3,4\n");
        assert_eq!(t.column_names(), vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn header_only_csv_has_no_rows() {
        let t = csv("a,b\n");
        assert_eq!(t.num_columns(), 2);
        assert_eq!(t.num_rows(), 0);
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let t = csv("a,b\n1,2\n3\n");
        assert_eq!(t.column("a").unwrap().cells, vec![Cell::Int(1), Cell::Int(3)]);
        assert_eq!(t.column("b").unwrap().cells, vec![Cell::Float(2.0), Cell::Missing]);
    }

    #[test]
    fn padded_numbers_are_still_numbers() {
        let t = csv("a, b, c\n1, 2, x \n3, , true\n");
        assert_eq!(t.column_names(), vec!["a", " b", " c"]);
        let b = t.column(" b").unwrap();
        assert_eq!(b.cells, vec![Cell::Float(2.0), Cell::Missing]);
        assert!(b.is_numeric());
        // text keeps its whitespace
        assert_eq!(t.column(" c").unwrap().cells[0], Cell::Text(" x ".into()));
    }

    #[test]
    fn spreadsheet_style_missing_markers() {
        let t = csv("v\n1.5\n-NaN\n#NA\n1.#QNAN\n");
        assert_eq!(
            t.column("v").unwrap().cells,
            vec![Cell::Float(1.5), Cell::Missing, Cell::Missing, Cell::Missing]
        );
    }

    #[test]
    fn ragged_or_empty_csv_is_a_parse_error() {
        assert!(matches!(
            load(FileKind::Csv, b"a,b\n1,2,3\n"),
            Err(ParseError::Csv(_))
        ));
        assert_eq!(load(FileKind::Csv, b""), Err(ParseError::Empty));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        assert!(load(FileKind::Csv, b"a\n\xff\xfe\n").is_err());
    }

    #[test]
    fn garbage_xlsx_is_a_parse_error() {
        assert!(matches!(
            load(FileKind::Xlsx, b"definitely not a zip"),
            Err(ParseError::Spreadsheet(_))
        ));
    }

    #[test]
    fn spreadsheet_dates_load_as_readable_text() {
        use rust_xlsxwriter::{Format, Workbook};

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let day = Format::new().set_num_format("yyyy-mm-dd");
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        sheet.write_string(0, 0, "when").unwrap();
        sheet.write_string(0, 1, "n").unwrap();
        sheet.write_string(0, 2, "at").unwrap();
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 3, 9).unwrap();
        let time = rust_xlsxwriter::ExcelDateTime::parse_from_str("2024-03-09 14:05:07").unwrap();
        sheet.write_datetime_with_format(1, 0, &date, &day).unwrap();
        sheet.write_number(1, 1, 5).unwrap();
        sheet.write_datetime_with_format(1, 2, &time, &stamp).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let t = load(FileKind::Xlsx, &bytes).unwrap();
        assert_eq!(t.column("when").unwrap().cells, vec![Cell::Text("2024-03-09".into())]);
        assert_eq!(t.column("n").unwrap().cells, vec![Cell::Int(5)]);
        assert_eq!(
            t.column("at").unwrap().cells,
            vec![Cell::Text("2024-03-09 14:05:07".into())]
        );
    }

    #[test]
    fn typed_spreadsheet_columns_are_unified() {
        let ints = unify_typed_column(vec![Cell::Float(1.0), Cell::Int(2)]);
        assert_eq!(ints, vec![Cell::Int(1), Cell::Int(2)]);
        let floats = unify_typed_column(vec![Cell::Int(1), Cell::Missing]);
        assert_eq!(floats, vec![Cell::Float(1.0), Cell::Missing]);
        let mixed = unify_typed_column(vec![Cell::Int(1), Cell::Text("a".into())]);
        assert_eq!(mixed, vec![Cell::Text("1".into()), Cell::Text("a".into())]);
    }
}
