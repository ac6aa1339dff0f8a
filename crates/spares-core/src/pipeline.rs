//! End-to-end reorganization: sheets in, sections out

use crate::aggregate::aggregate;
use crate::block::{parse_blocks, ParseStats};
use crate::columns::resolve_sheet;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::parser::read_sheets;
use crate::reference::{load_reference, ReferenceIndex};
use crate::report::{
    build_report, failure_message, Report, SectionContent, SectionNamer, SheetSection,
};
use crate::table::Sheet;
use crate::writer::{write_csv_dir, write_json, write_xlsx, xlsx_to_buffer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Run one sheet through column resolution, block parsing, aggregation and
/// sorting
pub fn process_sheet(
    sheet: &Sheet,
    index: &ReferenceIndex,
    config: &PipelineConfig,
) -> Result<(Report, ParseStats)> {
    let mapping = resolve_sheet(sheet, config.similarity_metric, config.similarity_floor)?;
    let (tagged, stats) = parse_blocks(&sheet.rows, &mapping, index);
    let report = build_report(aggregate(tagged, config.aggregation_key));

    if stats.coerced_quantities > 0 {
        debug!(
            sheet = %sheet.name,
            count = stats.coerced_quantities,
            "non-numeric quantities read as default"
        );
    }
    Ok((report, stats))
}

/// Process every sheet independently. A sheet that fails becomes a section
/// holding a single diagnostic row; the other sheets are unaffected.
pub fn process_sheets(
    sheets: &[Sheet],
    index: &ReferenceIndex,
    config: &PipelineConfig,
) -> Vec<SheetSection> {
    let mut namer = SectionNamer::new();

    sheets
        .iter()
        .map(|sheet| {
            let content = match process_sheet(sheet, index, config) {
                Ok((report, stats)) => {
                    info!(
                        sheet = %sheet.name,
                        groups = report.groups.len(),
                        parts = report.part_count(),
                        excluded = stats.excluded,
                        "processed sheet"
                    );
                    SectionContent::Report(report)
                }
                Err(e) => {
                    warn!(sheet = %sheet.name, error = %e, "could not process sheet");
                    SectionContent::Failed {
                        message: failure_message(&sheet.name, &e),
                    }
                }
            };

            SheetSection {
                name: namer.name_for(&sheet.name),
                source_sheet: sheet.name.clone(),
                content,
            }
        })
        .collect()
}

/// Output rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One workbook, one worksheet per section
    #[default]
    Xlsx,
    /// A directory with one CSV file per section
    Csv,
    Json,
}

impl OutputFormat {
    /// Guess from the output path's extension. A path without one, or
    /// ending in `.csv`, is a CSV target; anything else is xlsx.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            None => OutputFormat::Csv,
            Some(_) => OutputFormat::Xlsx,
        }
    }
}

/// Inputs and destination of one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub config: PipelineConfig,
}

/// Per-section outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub name: String,
    pub groups: usize,
    pub parts: usize,
    pub error: Option<String>,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub sections: Vec<SectionSummary>,
    /// Files written (one for xlsx/json, one per section for csv)
    pub outputs: Vec<PathBuf>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.sections.iter().filter(|s| s.error.is_some()).count()
    }
}

fn summarize(sections: &[SheetSection]) -> Vec<SectionSummary> {
    sections
        .iter()
        .map(|section| match &section.content {
            SectionContent::Report(report) => SectionSummary {
                name: section.name.clone(),
                groups: report.groups.len(),
                parts: report.part_count(),
                error: None,
            },
            SectionContent::Failed { message } => SectionSummary {
                name: section.name.clone(),
                groups: 0,
                parts: 0,
                error: Some(message.clone()),
            },
        })
        .collect()
}

/// Load reference and input, reorganize every sheet, return the sections.
///
/// The reference is loaded first: if it is unavailable no sheet is read.
pub fn reorganize<P: AsRef<Path>, R: AsRef<Path>>(
    input: P,
    reference: R,
    config: &PipelineConfig,
) -> Result<Vec<SheetSection>> {
    let index = load_reference(reference, config)?;
    let sheets = read_sheets(input.as_ref())?;
    info!(input = %input.as_ref().display(), sheets = sheets.len(), "read input");
    Ok(process_sheets(&sheets, &index, config))
}

/// Reorganize and render straight to an in-memory xlsx workbook
pub fn reorganize_to_buffer<P: AsRef<Path>, R: AsRef<Path>>(
    input: P,
    reference: R,
    config: &PipelineConfig,
) -> Result<Vec<u8>> {
    let sections = reorganize(input, reference, config)?;
    xlsx_to_buffer(&sections)
}

/// Full run: reorganize and write to the chosen sink
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let sections = reorganize(&options.input, &options.reference, &options.config)?;

    let outputs = match options.format {
        OutputFormat::Xlsx => {
            write_xlsx(&sections, &options.output)?;
            vec![options.output.clone()]
        }
        OutputFormat::Csv => write_csv_dir(&sections, &options.output)?,
        OutputFormat::Json => {
            write_json(&sections, &options.output)?;
            vec![options.output.clone()]
        }
    };

    let summary = RunSummary {
        sections: summarize(&sections),
        outputs,
    };
    info!(
        sections = summary.sections.len(),
        failed = summary.failed_count(),
        "run complete"
    );
    Ok(summary)
}
