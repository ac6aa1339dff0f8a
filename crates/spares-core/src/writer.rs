//! Sinks for finished sections: xlsx workbook, per-section CSV, JSON

use crate::error::{Error, Result};
use crate::report::SheetSection;
use crate::table::CellValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Padding added to the widest cell of a column
const COLUMN_PADDING: usize = 2;

/// Write all sections to an xlsx workbook, one worksheet each
pub fn write_xlsx<P: AsRef<Path>>(sections: &[SheetSection], path: P) -> Result<()> {
    let mut workbook = build_workbook(sections)?;
    workbook.save(path.as_ref())?;
    Ok(())
}

/// Render all sections to an in-memory xlsx file
pub fn xlsx_to_buffer(sections: &[SheetSection]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(sections)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(sections: &[SheetSection]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for section in sections {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&section.name)?;

        let columns = section.columns();
        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();

        for (col, name) in columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *name, &bold)?;
        }

        for (row_idx, row) in section.rows().iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_num, col as u16, cell)?;
                if let Some(width) = widths.get_mut(col) {
                    *width = (*width).max(cell.to_string_value().chars().count());
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, (width + COLUMN_PADDING) as f64)?;
        }
    }

    Ok(workbook)
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

/// Write each section to `<dir>/<section name>.csv`
pub fn write_csv_dir<P: AsRef<Path>>(sections: &[SheetSection], dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(sections.len());
    for section in sections {
        let path = dir.join(format!("{}.csv", section.name));
        let csv_error = |source: csv::Error| Error::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        writer.write_record(section.columns()).map_err(csv_error)?;
        for row in section.rows() {
            writer
                .write_record(row.iter().map(CellValue::to_string_value))
                .map_err(csv_error)?;
        }
        writer.flush()?;

        written.push(path);
    }

    Ok(written)
}

/// Write the sections as a JSON array
pub fn write_json<P: AsRef<Path>>(sections: &[SheetSection], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), sections)?;
    Ok(())
}
