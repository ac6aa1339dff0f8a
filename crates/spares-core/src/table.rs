//! Core sheet types for representing raw spreadsheet data

use calamine::Data;
use serde::{Deserialize, Serialize};

/// A single named sheet read from a workbook or CSV file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name (workbook tab or CSV file stem)
    pub name: String,
    /// Column definitions, taken from the first row
    pub columns: Vec<Column>,
    /// Row data in original order
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Create a new empty sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet from a header row and raw data rows, padding or
    /// truncating every row to the header width
    pub fn from_grid(
        name: impl Into<String>,
        header: Vec<CellValue>,
        data: Vec<Vec<CellValue>>,
    ) -> Self {
        let columns: Vec<Column> = header
            .into_iter()
            .enumerate()
            .map(|(i, cell)| Column::new(cell, i))
            .collect();
        let width = columns.len();

        let rows = data
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, CellValue::Empty);
                Row::new(cells)
            })
            .collect();

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by exact header text
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.header.as_text() == Some(name))
    }
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Header cell as it appeared in the sheet
    pub header: CellValue,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(header: CellValue, index: usize) -> Self {
        Self { header, index }
    }

    /// Header text, if the header cell is text
    pub fn name(&self) -> Option<&str> {
        self.header.as_text()
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type.
    ///
    /// Digit strings with a leading zero ("0042") stay text so part
    /// numbers keep their padding.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if has_leading_zero(trimmed) {
            return CellValue::String(trimmed.to_string());
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        // Try parsing as float
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }

        // Otherwise, keep as string
        CellValue::String(trimmed.to_string())
    }

    /// Wrap a text cell without type detection, as workbook cells already
    /// carry their own type
    pub fn text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(trimmed.to_string())
        }
    }

    /// Render a summed quantity, dropping the fraction when it is whole
    pub fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            CellValue::Integer(n as i64)
        } else {
            CellValue::Float(n)
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Borrow the text of a string cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric reading of the cell; text is parsed, anything else is None
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) if f.is_finite() => Some(*f),
            CellValue::Float(_) => None,
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            CellValue::Empty => None,
        }
    }

    /// Canonical text used to compare serials and item numbers.
    ///
    /// Whole floats lose their fraction so `123.0` and `123` agree.
    pub fn key(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some((*f as i64).to_string())
            }
            other => Some(other.to_string_value()),
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Integer(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::String(s) => CellValue::text(s),
            Data::Bool(b) => CellValue::String(b.to_string()),
            // Cell errors (#N/A, #REF!) read as missing
            Data::Error(_) => CellValue::Empty,
            other => CellValue::text(&other.to_string()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, ""),
        }
    }
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    digits.len() > 1 && digits.starts_with('0') && digits.as_bytes()[1].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_parse_integer() {
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("-123"), CellValue::Integer(-123));
        assert_eq!(CellValue::parse("0"), CellValue::Integer(0));
    }

    #[test]
    fn test_cell_value_parse_float() {
        assert_eq!(CellValue::parse("3.25"), CellValue::Float(3.25));
        assert_eq!(CellValue::parse("0.5"), CellValue::Float(0.5));
    }

    #[test]
    fn test_cell_value_parse_keeps_padded_part_numbers() {
        assert_eq!(
            CellValue::parse("0042"),
            CellValue::String("0042".to_string())
        );
        assert_eq!(
            CellValue::parse(" A-100 "),
            CellValue::String("A-100".to_string())
        );
    }

    #[test]
    fn test_cell_value_parse_empty() {
        assert_eq!(CellValue::parse(""), CellValue::Empty);
        assert_eq!(CellValue::parse("   "), CellValue::Empty);
    }

    #[test]
    fn test_key_normalizes_whole_floats() {
        assert_eq!(CellValue::Float(123.0).key(), Some("123".to_string()));
        assert_eq!(CellValue::Integer(123).key(), Some("123".to_string()));
        assert_eq!(CellValue::Float(1.5).key(), Some("1.5".to_string()));
        assert_eq!(CellValue::Empty.key(), None);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::Integer(3).as_number(), Some(3.0));
        assert_eq!(CellValue::String(" 2.5 ".to_string()).as_number(), Some(2.5));
        assert_eq!(CellValue::String("n/a".to_string()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_from_number() {
        assert_eq!(CellValue::from_number(5.0), CellValue::Integer(5));
        assert_eq!(CellValue::from_number(2.5), CellValue::Float(2.5));
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Integer(7));
        assert_eq!(
            CellValue::from(&Data::String("  Belt ".to_string())),
            CellValue::String("Belt".to_string())
        );
        assert_eq!(CellValue::from(&Data::String("   ".to_string())), CellValue::Empty);
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_from_grid_pads_and_truncates() {
        let sheet = Sheet::from_grid(
            "s",
            vec![CellValue::parse("A"), CellValue::parse("B")],
            vec![
                vec![CellValue::Integer(1)],
                vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)],
            ],
        );

        assert_eq!(sheet.rows[0].cells, vec![CellValue::Integer(1), CellValue::Empty]);
        assert_eq!(sheet.rows[1].cells.len(), 2);
        assert!(sheet.find_column("B").is_some());
    }
}
