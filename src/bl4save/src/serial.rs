//! Item serial decoding and re-encoding for Borderlands 4
//!
//! Format: `@Ug<type><payload>`, bit-packed 6 bits per character (see
//! [`bitpack`]). The type character is the first 6-bit group of the payload,
//! so it lives inside the decoded bytes rather than in front of them.
//!
//! Decoding picks a [`layout::RecordLayout`] by type character and reads
//! fixed-offset stats from it. Offsets are empirical, so every decode carries
//! a [`Confidence`] tier and a [`RawFields`] dump for hunting new ones.

pub mod bitpack;
mod bitstream;
pub mod fields;
pub mod layout;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

pub use bitpack::SERIAL_MARKER;
pub use fields::RawFields;
pub use layout::{layout_for, StatField};

/// Records shorter than this can't hold any field
pub const MIN_RECORD_LEN: usize = 2;

/// Type character used when a string has no serial marker
const UNKNOWN_TYPE: char = '?';

/// Errors that can occur during serial decoding and encoding
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Serial does not start with the {} marker", SERIAL_MARKER)]
    MissingMarker,

    #[error("Serial too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Value {value} for {field} does not fit in {bits} bits")]
    ValueOutOfRange {
        field: StatField,
        value: u32,
        bits: u32,
    },

    #[error("Edit would change item type from '{expected}' to '{actual}'")]
    TypeChanged { expected: char, actual: char },

    #[error("Edited {length}-byte record has no encoding of the same length")]
    LengthNotPreserved { length: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Weapon,
    Equipment,
    EquipmentAlt,
    WeaponSpecial,
    Utility,
    Consumable,
    Special,
    #[default]
    Unknown,
    Error,
}

impl ItemCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Weapon => "weapon",
            ItemCategory::Equipment => "equipment",
            ItemCategory::EquipmentAlt => "equipment_alt",
            ItemCategory::WeaponSpecial => "weapon_special",
            ItemCategory::Utility => "utility",
            ItemCategory::Consumable => "consumable",
            ItemCategory::Special => "special",
            ItemCategory::Unknown => "unknown",
            ItemCategory::Error => "error",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far the offset guesses for a record can be trusted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// Not a recognizable record; never offered for editing
    #[default]
    None,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::None => "none",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named stats of a record. Absent fields are left untouched on encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_stat: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_stat: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_class: Option<u32>,
}

impl ItemStats {
    pub fn get(&self, field: StatField) -> Option<u32> {
        match field {
            StatField::PrimaryStat => self.primary_stat,
            StatField::SecondaryStat => self.secondary_stat,
            StatField::Level => self.level,
            StatField::Rarity => self.rarity,
            StatField::Manufacturer => self.manufacturer,
            StatField::ItemClass => self.item_class,
        }
    }

    pub fn set(&mut self, field: StatField, value: Option<u32>) {
        let slot = match field {
            StatField::PrimaryStat => &mut self.primary_stat,
            StatField::SecondaryStat => &mut self.secondary_stat,
            StatField::Level => &mut self.level,
            StatField::Rarity => &mut self.rarity,
            StatField::Manufacturer => &mut self.manufacturer,
            StatField::ItemClass => &mut self.item_class,
        };
        *slot = value;
    }

    /// Present stats in [`StatField::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (StatField, u32)> + '_ {
        StatField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Overlay every stat present in `other` onto a copy of self
    pub fn merged(&self, other: &ItemStats) -> ItemStats {
        let mut merged = *self;
        for (field, value) in other.iter() {
            merged.set(field, Some(value));
        }
        merged
    }
}

/// Decoded view of an item serial
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedItem {
    /// Serial string exactly as found
    pub serial: String,

    /// Type character after the marker (`?` when there is none)
    pub item_type: char,

    pub category: ItemCategory,

    /// Decoded payload length in bytes
    pub length: usize,

    pub stats: ItemStats,

    pub raw_fields: RawFields,

    pub confidence: Confidence,
}

impl DecodedItem {
    /// Decode a serial, never failing.
    ///
    /// Strings without the marker come back as `unknown`, records too short
    /// to hold any field as `error`. Both have [`Confidence::None`].
    pub fn decode(serial: &str) -> Self {
        match Self::try_decode(serial) {
            Ok(item) => item,
            Err(SerialError::MissingMarker) => DecodedItem {
                serial: serial.to_string(),
                item_type: UNKNOWN_TYPE,
                ..Default::default()
            },
            Err(e) => DecodedItem {
                serial: serial.to_string(),
                item_type: bitpack::discriminant(serial).unwrap_or(UNKNOWN_TYPE),
                category: ItemCategory::Error,
                length: bitpack::decode(serial).len(),
                raw_fields: RawFields::from_error(e.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn try_decode(serial: &str) -> Result<Self, SerialError> {
        let item_type = bitpack::discriminant(serial).ok_or(SerialError::MissingMarker)?;
        let bytes = decode_record(serial)?;

        let layout = layout_for(item_type);
        let raw_fields = RawFields::extract(&bytes);
        let stats = layout.read_stats(&bytes, &raw_fields);

        Ok(DecodedItem {
            serial: serial.to_string(),
            item_type,
            category: layout.category,
            length: bytes.len(),
            stats,
            raw_fields,
            confidence: (layout.confidence)(&bytes),
        })
    }

    /// Re-encode with the current stats, falling back to the original serial
    /// if they can't be written.
    pub fn encode(&self) -> String {
        match self.try_encode() {
            Ok(serial) => serial,
            Err(e) => {
                warn!(serial = %self.serial, error = %e, "Failed to re-encode item, keeping original");
                self.serial.clone()
            }
        }
    }

    /// Re-encode with the current stats.
    ///
    /// The serial is decoded again so bytes outside the known fields survive
    /// untouched. Unchanged records return the original string; changed ones
    /// always decode back to the same number of bytes.
    pub fn try_encode(&self) -> Result<String, SerialError> {
        let item_type = bitpack::discriminant(&self.serial).ok_or(SerialError::MissingMarker)?;
        let original = decode_record(&self.serial)?;

        let mut bytes = original.clone();
        layout_for(item_type).write_stats(&mut bytes, &self.stats)?;

        if bytes == original {
            return Ok(self.serial.clone());
        }

        let (expected, actual) = (type_group(&original), type_group(&bytes));
        if expected != actual {
            return Err(SerialError::TypeChanged {
                expected: group_char(expected),
                actual: group_char(actual),
            });
        }

        bitpack::encode_serial_exact(&bytes).ok_or(SerialError::LengthNotPreserved {
            length: bytes.len(),
        })
    }

    /// Copy of this item with `stats` overlaid on the decoded ones
    pub fn with_stats(&self, stats: &ItemStats) -> Self {
        DecodedItem {
            stats: self.stats.merged(stats),
            ..self.clone()
        }
    }

    /// Whether this record is worth offering for editing
    pub fn is_recognized(&self) -> bool {
        self.confidence != Confidence::None
    }

    /// Decoded payload bytes as hex
    pub fn hex_dump(&self) -> String {
        hex::encode(bitpack::decode(&self.serial))
    }
}

fn decode_record(serial: &str) -> Result<Vec<u8>, SerialError> {
    let bytes = bitpack::decode(serial);
    if bytes.len() < MIN_RECORD_LEN {
        return Err(SerialError::TooShort {
            expected: MIN_RECORD_LEN,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

fn type_group(bytes: &[u8]) -> u8 {
    bytes.first().map_or(0, |b| b >> 2)
}

fn group_char(group: u8) -> char {
    bitpack::CHARSET
        .get(usize::from(group))
        .map_or(UNKNOWN_TYPE, |&c| c as char)
}
