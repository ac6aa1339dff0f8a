//! Serial -> (model, equipment type) index built from the equipment table

use crate::config::{PipelineConfig, Sentinels};
use crate::error::{Error, Result};
use crate::parser::read_sheets;
use crate::table::{CellValue, Sheet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Exact column names expected in the reference table
pub mod columns {
    pub const SERIAL: &str = "SerialNumber";
    pub const MODEL: &str = "Model";
    pub const EQUIPMENT_TYPE: &str = "EquipmentType";
}

static EMPTY: CellValue = CellValue::Empty;

/// One row of the reference table after sentinel substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub serial: String,
    pub model: String,
    pub equipment_type: String,
}

impl ReferenceRecord {
    /// Build a record from raw cells. Returns None when the serial is absent;
    /// absent model or type become sentinels.
    pub fn from_cells(
        serial: &CellValue,
        model: &CellValue,
        equipment_type: &CellValue,
        sentinels: &Sentinels,
    ) -> Option<Self> {
        let serial = serial.key()?;
        Some(Self {
            serial,
            model: model
                .key()
                .unwrap_or_else(|| sentinels.model_missing.clone()),
            equipment_type: equipment_type
                .key()
                .unwrap_or_else(|| sentinels.type_missing.clone()),
        })
    }
}

/// Resolved model and type for a serial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub model: &'a str,
    pub equipment_type: &'a str,
}

/// Read-only lookups built once per run
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    serial_to_model: HashMap<String, String>,
    serial_to_type: HashMap<String, String>,
    model_to_type: HashMap<String, String>,
    sentinels: Sentinels,
}

impl ReferenceIndex {
    /// Index records in order. A repeated serial overwrites its earlier
    /// entry; a model keeps the type of the first serial seen for it.
    pub fn build(
        records: impl IntoIterator<Item = ReferenceRecord>,
        sentinels: Sentinels,
    ) -> Self {
        let mut index = Self {
            sentinels,
            ..Self::default()
        };

        for record in records {
            index
                .model_to_type
                .entry(record.model.clone())
                .or_insert_with(|| record.equipment_type.clone());
            index
                .serial_to_type
                .insert(record.serial.clone(), record.equipment_type);
            index.serial_to_model.insert(record.serial, record.model);
        }

        index
    }

    /// Build from a sheet with `SerialNumber`, `Model`, `EquipmentType`
    /// columns. Rows without a serial are dropped.
    pub fn from_sheet(sheet: &Sheet, sentinels: Sentinels) -> Result<Self> {
        let find = |name: &str| {
            sheet
                .find_column(name)
                .map(|c| c.index)
                .ok_or_else(|| Error::ReferenceColumnMissing {
                    sheet: sheet.name.clone(),
                    column: name.to_string(),
                })
        };
        let serial_col = find(columns::SERIAL)?;
        let model_col = find(columns::MODEL)?;
        let type_col = find(columns::EQUIPMENT_TYPE)?;

        let records: Vec<ReferenceRecord> = sheet
            .rows
            .iter()
            .filter_map(|row| {
                let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);
                ReferenceRecord::from_cells(
                    cell(serial_col),
                    cell(model_col),
                    cell(type_col),
                    &sentinels,
                )
            })
            .collect();

        Ok(Self::build(records, sentinels))
    }

    /// Model and type for a serial. An unknown serial gets the missing-model
    /// sentinel; the type is always the model's first-seen type, so every
    /// part of a model lands in the same group whatever the row order.
    pub fn resolve(&self, serial: Option<&str>) -> Resolved<'_> {
        let model = serial
            .and_then(|s| self.serial_to_model.get(s))
            .map(String::as_str)
            .unwrap_or(self.sentinels.model_missing.as_str());

        Resolved {
            model,
            equipment_type: self
                .model_to_type
                .get(model)
                .map(String::as_str)
                .unwrap_or(self.sentinels.type_missing.as_str()),
        }
    }

    /// Model for a serial, if known
    pub fn model_for_serial(&self, serial: &str) -> Option<&str> {
        self.serial_to_model.get(serial).map(String::as_str)
    }

    /// Equipment type recorded on a serial's own row, if known
    pub fn type_for_serial(&self, serial: &str) -> Option<&str> {
        self.serial_to_type.get(serial).map(String::as_str)
    }

    /// Equipment type of a model (first-seen wins)
    pub fn type_for_model(&self, model: &str) -> Option<&str> {
        self.model_to_type.get(model).map(String::as_str)
    }

    /// Number of indexed serials
    pub fn serial_count(&self) -> usize {
        self.serial_to_model.len()
    }

    /// Number of distinct models
    pub fn model_count(&self) -> usize {
        self.model_to_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serial_to_model.is_empty()
    }
}

/// Load the reference table from a CSV export or workbook.
///
/// For workbooks the configured reference sheet is used when present,
/// otherwise the first sheet. Any failure is `ReferenceUnavailable`.
pub fn load_reference<P: AsRef<Path>>(
    path: P,
    config: &PipelineConfig,
) -> Result<ReferenceIndex> {
    let path = path.as_ref();
    let unavailable = |message: String| Error::ReferenceUnavailable {
        path: path.to_path_buf(),
        message,
    };

    let sheets = read_sheets(path).map_err(|e| unavailable(e.to_string()))?;
    let sheet = sheets
        .iter()
        .find(|s| s.name == config.reference_sheet)
        .or_else(|| sheets.first())
        .ok_or_else(|| unavailable("no sheets".to_string()))?;

    let index = ReferenceIndex::from_sheet(sheet, config.sentinels.clone())
        .map_err(|e| unavailable(e.to_string()))?;
    info!(
        path = %path.display(),
        sheet = %sheet.name,
        serials = index.serial_count(),
        models = index.model_count(),
        "loaded reference data"
    );
    Ok(index)
}
