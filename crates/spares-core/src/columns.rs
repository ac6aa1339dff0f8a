//! Fuzzy reconciliation of sheet headers against the required fields

use crate::error::{Error, Result};
use crate::table::{CellValue, Row, Sheet};
use difflib::sequencematcher::SequenceMatcher;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Similarity floor applied when none is configured
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.6;

/// The semantic fields every input sheet must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Serial,
    TotalQty,
    SpareQty,
    ItemNo,
    Description,
    UnitPrice,
}

impl RequiredField {
    /// Canonical order; mappings are resolved in this order
    pub const ALL: [RequiredField; 6] = [
        RequiredField::Serial,
        RequiredField::TotalQty,
        RequiredField::SpareQty,
        RequiredField::ItemNo,
        RequiredField::Description,
        RequiredField::UnitPrice,
    ];

    /// Lowercase semantic name
    pub fn name(self) -> &'static str {
        match self {
            RequiredField::Serial => "serial",
            RequiredField::TotalQty => "total_qty",
            RequiredField::SpareQty => "spare_qty",
            RequiredField::ItemNo => "item_no",
            RequiredField::Description => "description",
            RequiredField::UnitPrice => "unit_price",
        }
    }

    /// Header text this field is matched against
    pub fn label(self) -> &'static str {
        match self {
            RequiredField::Serial => "serial",
            RequiredField::TotalQty => "total qty",
            RequiredField::SpareQty => "spare qty",
            RequiredField::ItemNo => "item no.",
            RequiredField::Description => "description",
            RequiredField::UnitPrice => "unit price ($)",
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// String-similarity measure used for header matching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Ratcliff/Obershelp: 2 * matched characters / total characters
    #[default]
    SequenceRatio,
    /// 1 - edit distance / longer length
    Levenshtein,
    /// Bigram overlap, whitespace-insensitive
    SorensenDice,
    JaroWinkler,
}

impl SimilarityMetric {
    /// Score two strings in `[0, 1]`
    pub fn score(self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::SequenceRatio => sequence_ratio(a, b),
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
        }
    }
}

fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    f64::from(SequenceMatcher::new(&a[..], &b[..]).ratio())
}

/// A resolved source column for one required field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedColumn {
    /// Index into the sheet's rows
    pub index: usize,
    /// Header text as written in the sheet
    pub header: String,
    /// Similarity score of the match
    pub score: f64,
}

/// RequiredField -> source column, total over all fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: [MappedColumn; 6],
}

impl ColumnMapping {
    /// The source column resolved for a field
    pub fn column(&self, field: RequiredField) -> &MappedColumn {
        &self.columns[field.position()]
    }

    /// Read a field's cell from a row; missing cells read as empty
    pub fn cell<'a>(&self, row: &'a Row, field: RequiredField) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        row.get(self.column(field).index).unwrap_or(&EMPTY)
    }

    /// Fields paired with their columns, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (RequiredField, &MappedColumn)> {
        RequiredField::ALL.iter().copied().zip(self.columns.iter())
    }
}

/// Resolve a sheet's headers against the required fields
pub fn resolve_sheet(
    sheet: &Sheet,
    metric: SimilarityMetric,
    floor: f64,
) -> Result<ColumnMapping> {
    let headers: Vec<(usize, &str)> = sheet
        .columns
        .iter()
        .filter_map(|c| c.name().map(|name| (c.index, name)))
        .collect();
    resolve_columns(&headers, metric, floor)
}

/// Resolve `(index, header)` pairs against the required fields.
///
/// Headers are lowercased and trimmed; each field takes the best-scoring
/// header, the first one winning ties. A field whose best score is below
/// `floor` fails the whole sheet.
pub fn resolve_columns(
    headers: &[(usize, &str)],
    metric: SimilarityMetric,
    floor: f64,
) -> Result<ColumnMapping> {
    let candidates: Vec<(usize, &str, String)> = headers
        .iter()
        .map(|&(index, header)| (index, header, header.trim().to_lowercase()))
        .collect();
    let resolve = |field| resolve_field(field, &candidates, metric, floor);

    Ok(ColumnMapping {
        columns: [
            resolve(RequiredField::Serial)?,
            resolve(RequiredField::TotalQty)?,
            resolve(RequiredField::SpareQty)?,
            resolve(RequiredField::ItemNo)?,
            resolve(RequiredField::Description)?,
            resolve(RequiredField::UnitPrice)?,
        ],
    })
}

fn resolve_field(
    field: RequiredField,
    candidates: &[(usize, &str, String)],
    metric: SimilarityMetric,
    floor: f64,
) -> Result<MappedColumn> {
    let mut best: Option<(f64, usize, &str)> = None;
    for (index, header, normalized) in candidates {
        let score = metric.score(field.label(), normalized);
        if best.map_or(true, |(top, _, _)| score > top) {
            best = Some((score, *index, *header));
        }
    }

    match best {
        Some((score, index, header)) if score >= floor => {
            debug!(field = field.name(), header, score, "matched column");
            Ok(MappedColumn {
                index,
                header: header.to_string(),
                score,
            })
        }
        _ => Err(Error::SchemaMismatch {
            field: field.label().to_string(),
        }),
    }
}
