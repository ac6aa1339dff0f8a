//! Sorted two-level report: one header row per model, one row per part

use crate::aggregate::{AggregatedPart, ModelParts};
use crate::table::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Output columns, in order
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "Equipment Type",
    "Model",
    "Total qty",
    "Spare qty",
    "Item no.",
    "Description",
    "Unit Price ($)",
];

/// Column of a failed section's diagnostic row
pub const ERROR_COLUMN: &str = "Error";

/// Spreadsheet limit on sheet-name length
pub const MAX_SECTION_NAME_LEN: usize = 31;

/// Characters a worksheet name may not contain
const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

const NAME_QUOTE: char = '\'';

/// One model and its parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub equipment_type: String,
    pub model: String,
    pub parts: Vec<AggregatedPart>,
}

/// Groups ordered by type then model, parts ordered by description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub groups: Vec<ReportGroup>,
}

impl Report {
    pub fn part_count(&self) -> usize {
        self.groups.iter().map(|g| g.parts.len()).sum()
    }

    /// Flatten to the tabular output shape
    pub fn to_rows(&self) -> Vec<Vec<CellValue>> {
        let mut rows = Vec::with_capacity(self.groups.len() + self.part_count());
        for group in &self.groups {
            let mut header = vec![CellValue::Empty; OUTPUT_COLUMNS.len()];
            header[0] = CellValue::String(group.equipment_type.clone());
            header[1] = CellValue::String(group.model.clone());
            rows.push(header);

            for part in &group.parts {
                rows.push(vec![
                    CellValue::Empty,
                    CellValue::Empty,
                    CellValue::from_number(part.total_qty),
                    CellValue::from_number(part.spare_qty),
                    part.item_no.clone(),
                    part.description.clone(),
                    part.unit_price.clone(),
                ]);
            }
        }
        rows
    }
}

/// Sort aggregated models into the final report
pub fn build_report(models: Vec<ModelParts>) -> Report {
    let mut groups: Vec<ReportGroup> = models
        .into_iter()
        .filter(|m| !m.parts.is_empty())
        .map(|m| {
            let mut parts = m.parts;
            // stable: equal descriptions keep first-seen order
            parts.sort_by_cached_key(|p| p.description.to_string_value());
            ReportGroup {
                equipment_type: m.equipment_type,
                model: m.model,
                parts,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.equipment_type
            .cmp(&b.equipment_type)
            .then_with(|| a.model.cmp(&b.model))
    });

    Report { groups }
}

/// What a section holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SectionContent {
    Report(Report),
    Failed { message: String },
}

/// One output section, produced from one input sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSection {
    /// Output name, already truncated and unique
    pub name: String,
    /// Name of the input sheet
    pub source_sheet: String,
    pub content: SectionContent,
}

impl SheetSection {
    /// Header row for this section
    pub fn columns(&self) -> Vec<&'static str> {
        match &self.content {
            SectionContent::Report(_) => OUTPUT_COLUMNS.to_vec(),
            SectionContent::Failed { .. } => vec![ERROR_COLUMN],
        }
    }

    /// Data rows for this section
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        match &self.content {
            SectionContent::Report(report) => report.to_rows(),
            SectionContent::Failed { message } => vec![vec![CellValue::String(message.clone())]],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.content, SectionContent::Failed { .. })
    }
}

/// Diagnostic text for a sheet that could not be processed
pub fn failure_message(sheet_name: &str, error: &dyn std::fmt::Display) -> String {
    format!("Could not process sheet '{}': {}", sheet_name, error)
}

/// Hands out section names that fit the sheet-name rules: at most
/// [`MAX_SECTION_NAME_LEN`] characters, no forbidden characters, unique
/// (case-insensitive) within one workbook.
#[derive(Debug, Default)]
pub struct SectionNamer {
    used: HashSet<String>,
}

impl SectionNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, sheet_name: &str) -> String {
        let cleaned: String = sheet_name
            .chars()
            .map(|c| if FORBIDDEN_NAME_CHARS.contains(&c) { '_' } else { c })
            .collect();
        // a worksheet name may not start or end with an apostrophe
        let cleaned = cleaned.trim_matches(NAME_QUOTE);
        let cleaned = if cleaned.trim().is_empty() {
            "Sheet"
        } else {
            cleaned
        };

        let mut candidate = truncate_name(cleaned, MAX_SECTION_NAME_LEN);
        let mut counter = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!("~{}", counter);
            let room = MAX_SECTION_NAME_LEN - suffix.chars().count();
            candidate = format!("{}{}", truncate_name(cleaned, room), suffix);
            counter += 1;
        }

        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

fn truncate_name(s: &str, max: usize) -> String {
    let truncated: String = s.chars().take(max).collect();
    truncated.trim_end_matches(NAME_QUOTE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(item: &str, desc: &str, total: f64) -> AggregatedPart {
        AggregatedPart {
            key: item.to_string(),
            item_no: CellValue::String(item.to_string()),
            description: CellValue::String(desc.to_string()),
            unit_price: CellValue::Float(9.5),
            total_qty: total,
            spare_qty: 0.0,
        }
    }

    fn model(equipment_type: &str, name: &str, parts: Vec<AggregatedPart>) -> ModelParts {
        let tagged = parts.into_iter().map(|p| crate::block::TaggedPart {
            equipment_type: equipment_type.to_string(),
            model: name.to_string(),
            part: crate::block::PartEntry {
                item_no: p.item_no,
                description: p.description,
                unit_price: p.unit_price,
                total_qty: p.total_qty,
                spare_qty: p.spare_qty,
            },
        });
        crate::aggregate::aggregate(tagged, Default::default())
            .pop()
            .unwrap()
    }

    #[test]
    fn test_groups_sort_by_type_then_model() {
        let report = build_report(vec![
            model("TypeB", "Model1", vec![part("I1", "Belt", 1.0)]),
            model("TypeA", "Model2", vec![part("I2", "Belt", 1.0)]),
            model("TypeA", "Model1", vec![part("I3", "Belt", 1.0)]),
        ]);

        let order: Vec<(&str, &str)> = report
            .groups
            .iter()
            .map(|g| (g.equipment_type.as_str(), g.model.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("TypeA", "Model1"), ("TypeA", "Model2"), ("TypeB", "Model1")]
        );
    }

    #[test]
    fn test_parts_sort_by_description() {
        let report = build_report(vec![model(
            "Baler",
            "M100",
            vec![part("Z9", "Roller", 1.0), part("A1", "Belt", 1.0), part("B2", "Chain", 1.0)],
        )]);

        let items: Vec<String> = report.groups[0]
            .parts
            .iter()
            .map(|p| p.item_no.to_string_value())
            .collect();
        assert_eq!(items, vec!["A1", "B2", "Z9"]);
    }

    #[test]
    fn test_to_rows_shape() {
        let report = build_report(vec![model("Baler", "M100", vec![part("I1", "Belt", 5.0)])]);
        let rows = report.to_rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], CellValue::String("Baler".to_string()));
        assert_eq!(rows[0][1], CellValue::String("M100".to_string()));
        assert!(rows[0][2..].iter().all(CellValue::is_empty));

        assert!(rows[1][0].is_empty() && rows[1][1].is_empty());
        assert_eq!(rows[1][2], CellValue::Integer(5));
        assert_eq!(rows[1][3], CellValue::Integer(0));
        assert_eq!(rows[1][4], CellValue::String("I1".to_string()));
        assert_eq!(rows[1][5], CellValue::String("Belt".to_string()));
        assert_eq!(rows[1][6], CellValue::Float(9.5));
    }

    #[test]
    fn test_failed_section_rows() {
        let section = SheetSection {
            name: "Bad".to_string(),
            source_sheet: "Bad".to_string(),
            content: SectionContent::Failed {
                message: failure_message("Bad", &"missing column"),
            },
        };

        assert_eq!(section.columns(), vec![ERROR_COLUMN]);
        assert_eq!(
            section.rows(),
            vec![vec![CellValue::String(
                "Could not process sheet 'Bad': missing column".to_string()
            )]]
        );
        assert!(section.is_failed());
    }

    #[test]
    fn test_section_names_truncate_and_dedupe() {
        let mut namer = SectionNamer::new();
        let long = "FCC Placer MSW - Spares List - Phase Two";

        let first = namer.name_for(long);
        assert_eq!(first.chars().count(), MAX_SECTION_NAME_LEN);
        assert_eq!(first, "FCC Placer MSW - Spares List - ");

        let second = namer.name_for(long);
        assert_eq!(second, "FCC Placer MSW - Spares List ~2");
        assert_eq!(namer.name_for("a/b"), "a_b");
        assert_eq!(namer.name_for("A_B"), "A_B~2");
    }

    #[test]
    fn test_section_names_drop_edge_apostrophes() {
        let mut namer = SectionNamer::new();
        assert_eq!(namer.name_for("'Q'"), "Q");
        assert_eq!(namer.name_for("''"), "Sheet");
        assert_eq!(namer.name_for("Bob's list"), "Bob's list");

        // an apostrophe landing on the length limit is dropped too
        let edge = format!("{}'tail", "x".repeat(MAX_SECTION_NAME_LEN - 1));
        assert_eq!(namer.name_for(&edge), "x".repeat(MAX_SECTION_NAME_LEN - 1));
    }
}
