//! Serial-block parsing
//!
//! A spares sheet is laid out in blocks: a header row introduces a unit by
//! its serial, and the following rows repeating that serial list the unit's
//! parts. The parser walks rows in order, keeping only the current block as
//! state, and tags every usable part with its block's model and type.

use crate::columns::{ColumnMapping, RequiredField};
use crate::reference::ReferenceIndex;
use crate::table::{CellValue, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quantity used when a cell holds no number
pub const DEFAULT_QUANTITY: f64 = 0.0;

/// Item number marking a part that has not been assigned yet
const PLACEHOLDER_ITEM_NO: &str = "TBD";

/// Read a quantity cell, falling back to [`DEFAULT_QUANTITY`] for empty or
/// non-numeric input
pub fn coerce_quantity(cell: &CellValue) -> f64 {
    cell.as_number().unwrap_or(DEFAULT_QUANTITY)
}

/// One candidate part read from a detail row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub item_no: CellValue,
    pub description: CellValue,
    pub unit_price: CellValue,
    pub total_qty: f64,
    pub spare_qty: f64,
}

/// Why a detail row produced no part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MissingItemNo,
    PlaceholderItemNo,
    MissingDescription,
}

impl PartEntry {
    /// Extract a part from a detail row, or the reason it is skipped
    pub fn from_row(row: &Row, mapping: &ColumnMapping) -> Result<Self, Exclusion> {
        let item_no = mapping.cell(row, RequiredField::ItemNo);
        let description = mapping.cell(row, RequiredField::Description);

        let item_key = item_no.key().ok_or(Exclusion::MissingItemNo)?;
        if item_key.trim().eq_ignore_ascii_case(PLACEHOLDER_ITEM_NO) {
            return Err(Exclusion::PlaceholderItemNo);
        }
        if description.is_empty() {
            return Err(Exclusion::MissingDescription);
        }

        Ok(Self {
            item_no: item_no.clone(),
            description: description.clone(),
            unit_price: mapping.cell(row, RequiredField::UnitPrice).clone(),
            total_qty: coerce_quantity(mapping.cell(row, RequiredField::TotalQty)),
            spare_qty: coerce_quantity(mapping.cell(row, RequiredField::SpareQty)),
        })
    }
}

/// A part tagged with the model and type of the block it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedPart {
    pub equipment_type: String,
    pub model: String,
    pub part: PartEntry,
}

/// The block a row belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Serial that opened the block. An empty serial (`None`) matches no
    /// following row.
    pub serial: Option<String>,
    pub model: String,
    pub equipment_type: String,
}

impl Block {
    fn continues(&self, serial: Option<&str>) -> bool {
        match (&self.serial, serial) {
            (Some(current), Some(serial)) => current == serial,
            _ => false,
        }
    }
}

/// Parser state between rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    /// No row seen yet
    AwaitingHeader,
    InBlock(Block),
}

/// Role a row played in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Detail,
}

impl BlockState {
    /// Advance on a row's serial. A serial that differs from the current
    /// block's opens a new block and the row is a header; otherwise the row
    /// is a detail of the current block. Every row leaves the parser inside
    /// some block, which is returned.
    pub fn transition(self, serial: Option<&str>, index: &ReferenceIndex) -> (Block, RowKind) {
        match self {
            BlockState::InBlock(block) if block.continues(serial) => (block, RowKind::Detail),
            _ => {
                let resolved = index.resolve(serial);
                let block = Block {
                    serial: serial.map(str::to_string),
                    model: resolved.model.to_string(),
                    equipment_type: resolved.equipment_type.to_string(),
                };
                (block, RowKind::Header)
            }
        }
    }
}

/// Counters gathered while parsing one sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub header_rows: usize,
    pub detail_rows: usize,
    pub parts: usize,
    pub excluded: usize,
    /// Quantity cells that fell back to the default
    pub coerced_quantities: usize,
}

/// Walks a sheet's rows through [`BlockState`]
pub struct BlockParser<'a> {
    mapping: &'a ColumnMapping,
    index: &'a ReferenceIndex,
    state: BlockState,
    stats: ParseStats,
}

impl<'a> BlockParser<'a> {
    pub fn new(mapping: &'a ColumnMapping, index: &'a ReferenceIndex) -> Self {
        Self {
            mapping,
            index,
            state: BlockState::AwaitingHeader,
            stats: ParseStats::default(),
        }
    }

    /// Feed the next row; returns the part it contributes, if any
    pub fn feed(&mut self, row: &Row) -> Option<TaggedPart> {
        let serial = self.mapping.cell(row, RequiredField::Serial).key();
        let state = std::mem::replace(&mut self.state, BlockState::AwaitingHeader);
        let (block, kind) = state.transition(serial.as_deref(), self.index);

        let tagged = match kind {
            RowKind::Header => {
                self.stats.header_rows += 1;
                None
            }
            RowKind::Detail => {
                self.stats.detail_rows += 1;
                self.extract(row, &block)
            }
        };

        self.state = BlockState::InBlock(block);
        tagged
    }

    fn extract(&mut self, row: &Row, block: &Block) -> Option<TaggedPart> {
        let part = match PartEntry::from_row(row, self.mapping) {
            Ok(part) => part,
            Err(reason) => {
                self.stats.excluded += 1;
                debug!(
                    ?reason,
                    serial = block.serial.as_deref().unwrap_or(""),
                    "skipping detail row"
                );
                return None;
            }
        };

        for field in [RequiredField::TotalQty, RequiredField::SpareQty] {
            if self.mapping.cell(row, field).as_number().is_none() {
                self.stats.coerced_quantities += 1;
            }
        }
        self.stats.parts += 1;

        Some(TaggedPart {
            equipment_type: block.equipment_type.clone(),
            model: block.model.clone(),
            part,
        })
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }
}

/// Parse all rows of one sheet into tagged parts
pub fn parse_blocks(
    rows: &[Row],
    mapping: &ColumnMapping,
    index: &ReferenceIndex,
) -> (Vec<TaggedPart>, ParseStats) {
    let mut parser = BlockParser::new(mapping, index);
    let parts = rows.iter().filter_map(|row| parser.feed(row)).collect();
    (parts, parser.stats())
}
