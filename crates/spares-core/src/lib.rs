//! spares-core: Core library for reorganizing spare-parts spreadsheets
//!
//! This library provides functionality to:
//! - Read sheets from CSV files and Excel/ODS workbooks
//! - Fuzzy-match sheet headers to the required part fields
//! - Resolve equipment serials to model and type from a reference table
//! - Parse serial blocks and merge duplicate parts per model
//! - Build sorted per-model reports and write them as xlsx, CSV or JSON

pub mod aggregate;
pub mod block;
pub mod columns;
pub mod config;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod table;
pub mod writer;

pub use aggregate::{aggregate, AggregatedPart, AggregationKey, ModelParts};
pub use block::{
    coerce_quantity, parse_blocks, Block, BlockParser, BlockState, PartEntry, TaggedPart,
    DEFAULT_QUANTITY,
};
pub use columns::{
    resolve_columns, resolve_sheet, ColumnMapping, RequiredField, SimilarityMetric,
};
pub use config::{PipelineConfig, Sentinels};
pub use error::{Error, Result};
pub use parser::{parse_csv, parse_csv_str, read_sheets};
pub use pipeline::{
    process_sheet, process_sheets, reorganize, reorganize_to_buffer, run, OutputFormat,
    RunOptions, RunSummary,
};
pub use reference::{load_reference, ReferenceIndex, ReferenceRecord};
pub use report::{
    build_report, Report, ReportGroup, SectionContent, SheetSection, OUTPUT_COLUMNS,
};
pub use table::{CellValue, Column, Row, Sheet};
