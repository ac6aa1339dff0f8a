//! Merging of duplicate part listings within a model

use crate::block::{PartEntry, TaggedPart};
use crate::table::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity used to decide that two listings are the same part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKey {
    #[default]
    ByItemNumber,
    ByDescription,
}

impl AggregationKey {
    /// Key text of a part under this strategy
    pub fn key_of(self, part: &PartEntry) -> String {
        let cell = match self {
            AggregationKey::ByItemNumber => &part.item_no,
            AggregationKey::ByDescription => &part.description,
        };
        cell.key().unwrap_or_default()
    }
}

/// A part after merging: quantities summed, everything else from the most
/// recent listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPart {
    pub key: String,
    pub item_no: CellValue,
    pub description: CellValue,
    pub unit_price: CellValue,
    pub total_qty: f64,
    pub spare_qty: f64,
}

impl AggregatedPart {
    fn new(key: String, part: PartEntry) -> Self {
        Self {
            key,
            item_no: part.item_no,
            description: part.description,
            unit_price: part.unit_price,
            total_qty: part.total_qty,
            spare_qty: part.spare_qty,
        }
    }

    fn absorb(&mut self, part: PartEntry) {
        self.total_qty += part.total_qty;
        self.spare_qty += part.spare_qty;
        self.item_no = part.item_no;
        self.description = part.description;
        self.unit_price = part.unit_price;
    }
}

/// All merged parts of one model, in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParts {
    pub equipment_type: String,
    pub model: String,
    pub parts: Vec<AggregatedPart>,
    positions: HashMap<String, usize>,
}

impl ModelParts {
    fn new(equipment_type: String, model: String) -> Self {
        Self {
            equipment_type,
            model,
            parts: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Look up a merged part by key
    pub fn get(&self, key: &str) -> Option<&AggregatedPart> {
        self.positions.get(key).map(|&i| &self.parts[i])
    }
}

/// Aggregate tagged parts per model.
///
/// Models and parts keep first-seen order; a model's type is taken from
/// its first tagged part.
pub fn aggregate(
    tagged: impl IntoIterator<Item = TaggedPart>,
    key: AggregationKey,
) -> Vec<ModelParts> {
    let mut models: Vec<ModelParts> = Vec::new();
    let mut by_model: HashMap<String, usize> = HashMap::new();

    for TaggedPart {
        equipment_type,
        model,
        part,
    } in tagged
    {
        let slot = match by_model.get(&model) {
            Some(&i) => i,
            None => {
                by_model.insert(model.clone(), models.len());
                models.push(ModelParts::new(equipment_type, model));
                models.len() - 1
            }
        };
        let group = &mut models[slot];

        let part_key = key.key_of(&part);
        match group.positions.get(&part_key) {
            Some(&i) => group.parts[i].absorb(part),
            None => {
                group.positions.insert(part_key.clone(), group.parts.len());
                group.parts.push(AggregatedPart::new(part_key, part));
            }
        }
    }

    models
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(
        model: &str,
        item: &str,
        desc: &str,
        total: f64,
        spare: f64,
        price: f64,
    ) -> TaggedPart {
        TaggedPart {
            equipment_type: "Baler".to_string(),
            model: model.to_string(),
            part: PartEntry {
                item_no: CellValue::String(item.to_string()),
                description: CellValue::String(desc.to_string()),
                unit_price: CellValue::Float(price),
                total_qty: total,
                spare_qty: spare,
            },
        }
    }

    #[test]
    fn test_quantities_sum_and_description_is_last_seen() {
        let models = aggregate(
            vec![
                tagged("M100", "I1", "Belt", 3.0, 1.0, 10.0),
                tagged("M100", "I1", "Belt v2", 5.0, 0.0, 11.0),
                tagged("M100", "I1", "Belt v3", 2.0, 2.0, 12.5),
            ],
            AggregationKey::ByItemNumber,
        );

        assert_eq!(models.len(), 1);
        let part = models[0].get("I1").unwrap();
        assert_eq!(part.total_qty, 10.0);
        assert_eq!(part.spare_qty, 3.0);
        assert_eq!(part.description, CellValue::String("Belt v3".to_string()));
        assert_eq!(part.unit_price, CellValue::Float(12.5));
    }

    #[test]
    fn test_same_key_in_different_models_is_kept_apart() {
        let models = aggregate(
            vec![
                tagged("M100", "I1", "Belt", 1.0, 0.0, 1.0),
                tagged("M200", "I1", "Belt", 4.0, 0.0, 1.0),
            ],
            AggregationKey::ByItemNumber,
        );

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].get("I1").unwrap().total_qty, 1.0);
        assert_eq!(models[1].get("I1").unwrap().total_qty, 4.0);
    }

    #[test]
    fn test_by_description_keeps_latest_item_number() {
        let models = aggregate(
            vec![
                tagged("M100", "I1", "Belt", 1.0, 0.0, 1.0),
                tagged("M100", "I7", "Belt", 2.0, 1.0, 1.0),
                tagged("M100", "I1", "Roller", 1.0, 0.0, 1.0),
            ],
            AggregationKey::ByDescription,
        );

        let parts = &models[0].parts;
        assert_eq!(parts.len(), 2);
        let belt = models[0].get("Belt").unwrap();
        assert_eq!(belt.total_qty, 3.0);
        assert_eq!(belt.item_no, CellValue::String("I7".to_string()));
    }

    #[test]
    fn test_numeric_and_text_item_numbers_share_a_key() {
        let mut first = tagged("M100", "", "Belt", 1.0, 0.0, 1.0);
        first.part.item_no = CellValue::Integer(4411);
        let mut second = tagged("M100", "", "Belt", 2.0, 0.0, 1.0);
        second.part.item_no = CellValue::Float(4411.0);

        let models = aggregate(vec![first, second], AggregationKey::ByItemNumber);
        assert_eq!(models[0].parts.len(), 1);
        assert_eq!(models[0].get("4411").unwrap().total_qty, 3.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(Vec::<TaggedPart>::new(), AggregationKey::default()).is_empty());
    }
}
