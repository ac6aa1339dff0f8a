//! Sheet readers for CSV files and Excel/ODS workbooks

use crate::error::{Error, Result};
use crate::table::{CellValue, Sheet};
use calamine::{open_workbook_auto, Reader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Extensions handled by calamine
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read every sheet from a CSV file or workbook, dispatching on extension
pub fn read_sheets<P: AsRef<Path>>(path: P) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let sheets = if extension == "csv" {
        vec![parse_csv(path)?]
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path)?
    } else {
        return Err(Error::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    };

    if sheets.is_empty() {
        return Err(Error::NoSheets(path.to_path_buf()));
    }
    Ok(sheets)
}

/// Read all sheets of a workbook in tab order. The first row of each sheet
/// is its header.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(|e| Error::Workbook {
            path: path.to_path_buf(),
            message: format!("sheet '{}': {}", name, e),
        })?;

        let mut grid = range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect::<Vec<_>>());
        let header = grid.next().unwrap_or_default();
        let data: Vec<Vec<CellValue>> = grid.collect();

        debug!(sheet = %name, rows = data.len(), "read worksheet");
        sheets.push(Sheet::from_grid(name, header, data));
    }

    Ok(sheets)
}

/// Parse a CSV file into a single sheet named after the file stem
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Sheet> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut content = String::new();
    BufReader::new(&mut file)
        .read_to_string(&mut content)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");

    parse_csv_str(&content, name).map_err(|e| match e {
        Error::Csv { source, .. } => Error::Csv {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, sheet_name: &str) -> Result<Sheet> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: sheet_name.into(),
        source: e,
    })?;

    // Headers are never type-detected; a header of "2024" is still a name
    let header: Vec<CellValue> = headers.iter().map(CellValue::text).collect();

    let mut data = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: sheet_name.into(),
            source: e,
        })?;
        data.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(Sheet::from_grid(sheet_name, header, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "Serial,Total qty\nS1,\nS1,3\n";
        let sheet = parse_csv_str(csv, "Spares").unwrap();

        assert_eq!(sheet.name, "Spares");
        assert_eq!(sheet.column_count(), 2);
        assert_eq!(sheet.columns[0].name(), Some("Serial"));
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.rows[1].cells[1], CellValue::Integer(3));
    }

    #[test]
    fn test_parse_with_empty_cells() {
        let csv = "A,B,C\n1,,100\n2,bar\n";
        let sheet = parse_csv_str(csv, "test").unwrap();

        assert_eq!(sheet.rows[0].cells[1], CellValue::Empty);
        // short row is padded
        assert_eq!(sheet.rows[1].cells[2], CellValue::Empty);
    }

    #[test]
    fn test_numeric_header_stays_text() {
        let csv = "2024,Name\n1,foo\n";
        let sheet = parse_csv_str(csv, "test").unwrap();

        assert_eq!(sheet.columns[0].name(), Some("2024"));
    }

    #[test]
    fn test_read_sheets_csv_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Placer Spares.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Serial,Description").unwrap();
        writeln!(file, "S1,").unwrap();

        let sheets = read_sheets(&path).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Placer Spares");
    }

    #[test]
    fn test_read_sheets_rejects_unknown_extension() {
        let err = read_sheets("input.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_csv_is_file_read_error() {
        let err = read_sheets("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
