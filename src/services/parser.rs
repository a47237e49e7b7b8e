// ==================== TABULAR PARSER ====================
// Converte planilhas (.xlsx / .xls) e CSV em linhas chave -> valor,
// usando a primeira linha como cabeçalho.

use crate::utils::error::AppError;
use calamine::{open_workbook_from_rs, Data, Reader, Xls, Xlsx};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// One data row keyed by its column header.
pub type Row = HashMap<String, CellValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Office Open XML workbook (.xlsx)
    Workbook,
    /// BIFF workbook (.xls)
    LegacyWorkbook,
    /// Comma separated text (.csv)
    Delimited,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();

        match ext.as_str() {
            "xlsx" => Some(FileKind::Workbook),
            "xls" => Some(FileKind::LegacyWorkbook),
            "csv" => Some(FileKind::Delimited),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Workbook => f.write_str("xlsx"),
            FileKind::LegacyWorkbook => f.write_str("xls"),
            FileKind::Delimited => f.write_str("csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Text rendering of the cell; integral numbers print without decimals.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
        }
    }
}

/// Parses a whole file into rows, in file order.
pub fn parse_rows(kind: FileKind, bytes: &[u8]) -> Result<Vec<Row>, AppError> {
    match kind {
        FileKind::Workbook => {
            let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|e| AppError::ParseError(format!("Failed to open xlsx: {}", e)))?;
            read_first_sheet(workbook)
        }
        FileKind::LegacyWorkbook => {
            let workbook: Xls<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|e| AppError::ParseError(format!("Failed to open xls: {}", e)))?;
            read_first_sheet(workbook)
        }
        FileKind::Delimited => read_delimited(bytes),
    }
}

fn read_first_sheet<RS, R>(mut workbook: R) -> Result<Vec<Row>, AppError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: fmt::Display,
{
    let sheet_name = match workbook.sheet_names().first() {
        Some(name) => name.clone(),
        None => return Ok(Vec::new()),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::ParseError(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => unique_headers(header_row.iter().map(|c| match cell_value(c) {
            Some(value) => value.as_text(),
            None => String::new(),
        })),
        None => return Ok(Vec::new()),
    };

    let parsed = rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter(|(header, _)| !header.is_empty())
                .filter_map(|(header, cell)| cell_value(cell).map(|v| (header.clone(), v)))
                .collect::<Row>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(parsed)
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Serial date, same as Excel stores it
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(format!("#{:?}", e))),
    }
}

fn read_delimited(bytes: &[u8]) -> Result<Vec<Row>, AppError> {
    let content = decode_text(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, field)| !header.is_empty() && !field.is_empty())
            .map(|(header, field)| (header.clone(), CellValue::Text(field.to_string())))
            .collect();

        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// UTF-8 first; anything else is read as Windows-1252 (Excel's CSV default).
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Repeated header names get `_1`, `_2`, ... in column order, skipping any
/// suffix that another column already uses.
fn unique_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let raw: Vec<String> = raw.into_iter().collect();
    let mut taken: HashSet<String> = raw.iter().filter(|h| !h.is_empty()).cloned().collect();
    let mut emitted: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .map(|header| {
            if header.is_empty() || emitted.insert(header.clone()) {
                return header;
            }
            let suffix = next_suffix.entry(header.clone()).or_insert(1);
            loop {
                let candidate = format!("{}_{}", header, suffix);
                *suffix += 1;
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(FileKind::from_filename("users.xlsx"), Some(FileKind::Workbook));
        assert_eq!(FileKind::from_filename("USERS.XLS"), Some(FileKind::LegacyWorkbook));
        assert_eq!(FileKind::from_filename("export.2024.csv"), Some(FileKind::Delimited));
        assert_eq!(FileKind::from_filename("notes.txt"), None);
        assert_eq!(FileKind::from_filename("csv"), None);
    }

    #[test]
    fn test_csv_rows_keyed_by_header() {
        let data = b"Name,Email,MobileNumber,City\nA,a@x.com,111,X\nB,b@x.com,222,Y\n";
        let rows = parse_rows(FileKind::Delimited, data).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&text("A")));
        assert_eq!(rows[0].get("MobileNumber"), Some(&text("111")));
        assert_eq!(rows[1].get("City"), Some(&text("Y")));
    }

    #[test]
    fn test_csv_skips_blank_fields_and_rows() {
        let data = b"\xEF\xBB\xBFName,Email\n ,\nC, c@x.com \nD,\n";
        let rows = parse_rows(FileKind::Delimited, data).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&text("C")));
        assert_eq!(rows[0].get("Email"), Some(&text("c@x.com")));
        assert!(rows[1].get("Email").is_none());
    }

    #[test]
    fn test_csv_windows_1252_fallback() {
        // "São Paulo" encoded as Windows-1252
        let data = b"City\nS\xE3o Paulo\n";
        let rows = parse_rows(FileKind::Delimited, data).unwrap();
        assert_eq!(rows[0].get("City"), Some(&text("São Paulo")));
    }

    #[test]
    fn test_csv_empty_file_has_no_rows() {
        assert!(parse_rows(FileKind::Delimited, b"").unwrap().is_empty());
        assert!(parse_rows(FileKind::Delimited, b"Name,Email\n").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let headers = unique_headers(
            ["Email", "Email", "", "Email"].iter().map(|s| s.to_string()),
        );
        assert_eq!(headers, vec!["Email", "Email_1", "", "Email_2"]);
    }

    #[test]
    fn test_generated_suffix_skips_existing_header() {
        let headers = unique_headers(["Email", "Email", "Email_1"].iter().map(|s| s.to_string()));
        assert_eq!(headers, vec!["Email", "Email_2", "Email_1"]);

        let data = b"Email,Email_1,Email\na@x.com,b@x.com,c@x.com\n";
        let rows = parse_rows(FileKind::Delimited, data).unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0].get("Email"), Some(&text("a@x.com")));
        assert_eq!(rows[0].get("Email_1"), Some(&text("b@x.com")));
        assert_eq!(rows[0].get("Email_2"), Some(&text("c@x.com")));
    }

    #[test]
    fn test_xlsx_first_sheet_only() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "MobileNumber").unwrap();
        sheet.write_string(1, 0, "A").unwrap();
        sheet.write_number(1, 1, 111.0).unwrap();
        sheet.write_string(3, 0, "B").unwrap();

        let other = workbook.add_worksheet();
        other.write_string(0, 0, "Name").unwrap();
        other.write_string(1, 0, "ignored").unwrap();

        let bytes = workbook.save_to_buffer().unwrap();
        let rows = parse_rows(FileKind::Workbook, &bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&text("A")));
        assert_eq!(rows[0].get("MobileNumber"), Some(&CellValue::Number(111.0)));
        assert_eq!(rows[1].get("Name"), Some(&text("B")));
        assert!(rows[1].get("MobileNumber").is_none());
    }

    #[test]
    fn test_xlsx_header_only() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "Name").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        assert!(parse_rows(FileKind::Workbook, &bytes).unwrap().is_empty());
    }

    #[test]
    fn test_xls_first_sheet_only() {
        // BIFF8 workbook: sheet "Users" (4 headers, 2 rows, B has no mobile
        // number) followed by a sheet "Other"
        let bytes = include_bytes!("testdata/users.xls");
        let rows = parse_rows(FileKind::LegacyWorkbook, bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Name"), Some(&text("A")));
        assert_eq!(rows[0].get("Email"), Some(&text("a@x.com")));
        assert_eq!(rows[0].get("MobileNumber"), Some(&CellValue::Number(111.0)));
        assert_eq!(rows[0].get("City"), Some(&text("X")));
        assert_eq!(rows[1].get("Email"), Some(&text("b@x.com")));
        assert!(rows[1].get("MobileNumber").is_none());
        assert!(rows.iter().all(|r| r.get("Name") != Some(&text("ignored"))));
    }

    #[test]
    fn test_malformed_workbook_is_parse_error() {
        let result = parse_rows(FileKind::Workbook, b"definitely not a zip archive");
        assert!(matches!(result, Err(AppError::ParseError(_))));

        let result = parse_rows(FileKind::LegacyWorkbook, b"not a compound file");
        assert!(matches!(result, Err(AppError::ParseError(_))));
    }

    #[test]
    fn test_cell_value_as_text() {
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(4.5).as_text(), "4.5");
        assert_eq!(CellValue::Bool(true).as_text(), "TRUE");
        assert_eq!(text("x").as_text(), "x");
    }
}
