//! Per-type field offset tables.
//!
//! Each item type maps to a [`RecordLayout`]: the byte offsets its stats were
//! found at, how wide each one is, and whether it may be written back. Some
//! single-byte fields sit inside a 16-bit field of the same record; those are
//! marked [`WritePolicy::Aliased`] and are decoded but never written, since
//! writing them would clobber half of the wider value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fields::{read_u16_le, read_u8, RawFields};
use super::{Confidence, ItemCategory, ItemStats, SerialError};

/// Named stat slots exposed for editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    PrimaryStat,
    SecondaryStat,
    Level,
    Rarity,
    Manufacturer,
    ItemClass,
}

impl StatField {
    pub const ALL: [StatField; 6] = [
        StatField::PrimaryStat,
        StatField::SecondaryStat,
        StatField::Level,
        StatField::Rarity,
        StatField::Manufacturer,
        StatField::ItemClass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatField::PrimaryStat => "primary_stat",
            StatField::SecondaryStat => "secondary_stat",
            StatField::Level => "level",
            StatField::Rarity => "rarity",
            StatField::Manufacturer => "manufacturer",
            StatField::ItemClass => "item_class",
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte,
    WordLe,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::WordLe => 2,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    fn max_value(self) -> u32 {
        match self {
            Width::Byte => u32::from(u8::MAX),
            Width::WordLe => u32::from(u16::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    Write,
    /// Shares its storage with the named wider field
    Aliased(StatField),
    /// Decoded for display only
    ReadOnly,
}

/// Extra condition a field must meet before it is read or written
pub type Guard = fn(&[u8]) -> bool;

#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub field: StatField,
    pub offset: usize,
    pub width: Width,
    pub write: WritePolicy,
    pub guard: Option<Guard>,
}

impl FieldSpec {
    const fn new(field: StatField, offset: usize, width: Width, write: WritePolicy) -> Self {
        Self {
            field,
            offset,
            width,
            write,
            guard: None,
        }
    }

    const fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Byte range this field occupies
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width.bytes()
    }

    fn applies(&self, data: &[u8]) -> bool {
        self.span().end <= data.len() && self.guard.map_or(true, |guard| guard(data))
    }

    fn read(&self, data: &[u8]) -> Option<u32> {
        if !self.applies(data) {
            return None;
        }
        match self.width {
            Width::Byte => read_u8(data, self.offset).map(u32::from),
            Width::WordLe => read_u16_le(data, self.offset).map(u32::from),
        }
    }

    fn write(&self, data: &mut [u8], value: u32) -> Result<(), SerialError> {
        if !self.applies(data) {
            return Ok(());
        }
        if value > self.width.max_value() {
            return Err(SerialError::ValueOutOfRange {
                field: self.field,
                value,
                bits: self.width.bits(),
            });
        }
        match self.width {
            Width::Byte => data[self.offset] = value as u8,
            Width::WordLe => {
                data[self.span()].copy_from_slice(&(value as u16).to_le_bytes());
            }
        }
        Ok(())
    }
}

pub struct RecordLayout {
    pub category: ItemCategory,
    pub fields: &'static [FieldSpec],
    /// Fill primary/secondary from `potential_stats` instead of fixed offsets
    pub scan_stats: bool,
    pub confidence: fn(&[u8]) -> Confidence,
}

impl RecordLayout {
    pub fn read_stats(&self, data: &[u8], raw: &RawFields) -> ItemStats {
        let mut stats = ItemStats::default();

        if self.scan_stats {
            let mut guesses = raw.potential_stats.iter().map(|&(_, v)| u32::from(v));
            stats.primary_stat = guesses.next();
            stats.secondary_stat = guesses.next();
        }

        for spec in self.fields {
            if let Some(value) = spec.read(data) {
                stats.set(spec.field, Some(value));
            }
        }

        stats
    }

    /// Write every present, writable stat into `data`
    pub fn write_stats(&self, data: &mut [u8], stats: &ItemStats) -> Result<(), SerialError> {
        for spec in self.fields {
            if spec.write != WritePolicy::Write {
                continue;
            }
            if let Some(value) = stats.get(spec.field) {
                spec.write(data, value)?;
            }
        }
        Ok(())
    }
}

use StatField::*;
use Width::*;
use WritePolicy::*;

fn weapon_level_flag(data: &[u8]) -> bool {
    matches!(data.get(13), Some(2 | 34))
}

fn long_equipment(data: &[u8]) -> bool {
    data.len() > 38
}

fn weapon_confidence(data: &[u8]) -> Confidence {
    match data.len() {
        24 | 26 => Confidence::High,
        _ => Confidence::Medium,
    }
}

fn sentinel_confidence<const OFFSET: usize, const VALUE: u8>(data: &[u8]) -> Confidence {
    if data.get(OFFSET) == Some(&VALUE) {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

fn low_confidence(_: &[u8]) -> Confidence {
    Confidence::Low
}

static WEAPON_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new(PrimaryStat, 0, WordLe, Write),
    FieldSpec::new(SecondaryStat, 12, WordLe, Write),
    FieldSpec::new(Manufacturer, 4, Byte, Write),
    FieldSpec::new(ItemClass, 8, Byte, Write),
    FieldSpec::new(Rarity, 1, Byte, Aliased(PrimaryStat)),
    FieldSpec::new(Level, 13, Byte, Aliased(SecondaryStat)).guarded(weapon_level_flag),
];

static EQUIPMENT_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new(PrimaryStat, 2, WordLe, Write),
    FieldSpec::new(SecondaryStat, 8, WordLe, Write),
    FieldSpec::new(Level, 10, WordLe, Write).guarded(long_equipment),
    FieldSpec::new(Manufacturer, 1, Byte, Write),
    FieldSpec::new(ItemClass, 3, Byte, Aliased(PrimaryStat)),
    FieldSpec::new(Rarity, 9, Byte, Aliased(SecondaryStat)),
];

static EQUIPMENT_ALT_FIELDS: [FieldSpec; 6] = [
    FieldSpec::new(PrimaryStat, 4, WordLe, Write),
    FieldSpec::new(SecondaryStat, 8, WordLe, Write),
    FieldSpec::new(Level, 10, WordLe, Write),
    FieldSpec::new(Manufacturer, 5, Byte, Aliased(PrimaryStat)),
    FieldSpec::new(ItemClass, 6, Byte, Write),
    FieldSpec::new(Rarity, 14, Byte, Write),
];

static GENERIC_FIELDS: [FieldSpec; 2] = [
    FieldSpec::new(Manufacturer, 1, Byte, ReadOnly),
    FieldSpec::new(Rarity, 2, Byte, ReadOnly),
];

static WEAPON: RecordLayout = RecordLayout {
    category: ItemCategory::Weapon,
    fields: &WEAPON_FIELDS,
    scan_stats: false,
    confidence: weapon_confidence,
};

static EQUIPMENT: RecordLayout = RecordLayout {
    category: ItemCategory::Equipment,
    fields: &EQUIPMENT_FIELDS,
    scan_stats: false,
    confidence: sentinel_confidence::<1, 49>,
};

static EQUIPMENT_ALT: RecordLayout = RecordLayout {
    category: ItemCategory::EquipmentAlt,
    fields: &EQUIPMENT_ALT_FIELDS,
    scan_stats: false,
    confidence: sentinel_confidence::<5, 15>,
};

macro_rules! generic_layout {
    ($category:expr) => {
        RecordLayout {
            category: $category,
            fields: &GENERIC_FIELDS,
            scan_stats: true,
            confidence: low_confidence,
        }
    };
}

static WEAPON_SPECIAL: RecordLayout = generic_layout!(ItemCategory::WeaponSpecial);
static UTILITY: RecordLayout = generic_layout!(ItemCategory::Utility);
static CONSUMABLE: RecordLayout = generic_layout!(ItemCategory::Consumable);
static SPECIAL: RecordLayout = generic_layout!(ItemCategory::Special);
static UNKNOWN: RecordLayout = generic_layout!(ItemCategory::Unknown);

/// Layout for an item type character. Unlisted types get the generic
/// low-confidence decoder.
pub fn layout_for(item_type: char) -> &'static RecordLayout {
    match item_type {
        'r' => &WEAPON,
        'e' => &EQUIPMENT,
        'd' => &EQUIPMENT_ALT,
        'w' => &WEAPON_SPECIAL,
        'u' => &UTILITY,
        'f' => &CONSUMABLE,
        '!' => &SPECIAL,
        _ => &UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPES: [char; 8] = ['r', 'e', 'd', 'w', 'u', 'f', '!', '?'];

    #[test]
    fn test_byte_fields_inside_words_are_aliased() {
        for item_type in TYPES {
            let layout = layout_for(item_type);
            for word in layout.fields.iter().filter(|f| f.width == WordLe) {
                for byte in layout.fields.iter().filter(|f| f.width == Byte) {
                    if word.span().contains(&byte.offset) {
                        assert_eq!(
                            byte.write,
                            Aliased(word.field),
                            "{} in '{}' overlaps {}",
                            byte.field,
                            item_type,
                            word.field
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_writable_fields_never_overlap() {
        for item_type in TYPES {
            let writable: Vec<_> = layout_for(item_type)
                .fields
                .iter()
                .filter(|f| f.write == Write)
                .collect();
            for (i, a) in writable.iter().enumerate() {
                for b in &writable[i + 1..] {
                    assert!(
                        a.span().end <= b.offset || b.span().end <= a.offset,
                        "{} and {} overlap in '{}'",
                        a.field,
                        b.field,
                        item_type
                    );
                }
            }
        }
    }

    #[test]
    fn test_each_field_listed_once() {
        for item_type in TYPES {
            let layout = layout_for(item_type);
            for field in StatField::ALL {
                let count = layout.fields.iter().filter(|f| f.field == field).count();
                assert!(count <= 1, "{} listed {} times in '{}'", field, count, item_type);
            }
        }
    }

    #[test]
    fn test_read_skips_out_of_bounds() {
        let data = [0x10, 0x20, 0x30];
        let stats = WEAPON.read_stats(&data, &RawFields::extract(&data));
        assert_eq!(stats.primary_stat, Some(0x2010));
        assert_eq!(stats.rarity, Some(0x20));
        assert_eq!(stats.secondary_stat, None);
        assert_eq!(stats.manufacturer, None);
    }

    #[test]
    fn test_weapon_level_guard() {
        let mut data = [0u8; 24];
        assert_eq!(WEAPON.read_stats(&data, &RawFields::default()).level, None);
        data[13] = 34;
        assert_eq!(WEAPON.read_stats(&data, &RawFields::default()).level, Some(34));
    }

    #[test]
    fn test_write_rejects_oversized_values() {
        let mut data = [0u8; 24];
        let stats = ItemStats {
            manufacturer: Some(300),
            ..Default::default()
        };
        let err = WEAPON.write_stats(&mut data, &stats).unwrap_err();
        assert!(matches!(
            err,
            SerialError::ValueOutOfRange {
                field: Manufacturer,
                value: 300,
                bits: 8
            }
        ));
    }

    #[test]
    fn test_write_skips_aliased_and_read_only() {
        let mut data = [0u8; 24];
        let stats = ItemStats {
            rarity: Some(9),
            manufacturer: Some(9),
            ..Default::default()
        };
        WEAPON.write_stats(&mut data, &stats).unwrap();
        assert_eq!(data[1], 0);
        assert_eq!(data[4], 9);

        let mut data = [0u8; 18];
        UNKNOWN.write_stats(&mut data, &stats).unwrap();
        assert_eq!(data, [0u8; 18]);
    }

    #[test]
    fn test_confidence_rules() {
        assert_eq!((WEAPON.confidence)(&[0; 24]), Confidence::High);
        assert_eq!((WEAPON.confidence)(&[0; 26]), Confidence::High);
        assert_eq!((WEAPON.confidence)(&[0; 25]), Confidence::Medium);

        let mut data = [0u8; 30];
        assert_eq!((EQUIPMENT.confidence)(&data), Confidence::Medium);
        data[1] = 49;
        assert_eq!((EQUIPMENT.confidence)(&data), Confidence::High);
        assert_eq!((EQUIPMENT_ALT.confidence)(&data), Confidence::Medium);
        data[5] = 15;
        assert_eq!((EQUIPMENT_ALT.confidence)(&data), Confidence::High);

        assert_eq!((UTILITY.confidence)(&data), Confidence::Low);
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(layout_for('r').category, ItemCategory::Weapon);
        assert_eq!(layout_for('e').category, ItemCategory::Equipment);
        assert_eq!(layout_for('d').category, ItemCategory::EquipmentAlt);
        assert_eq!(layout_for('w').category, ItemCategory::WeaponSpecial);
        assert_eq!(layout_for('u').category, ItemCategory::Utility);
        assert_eq!(layout_for('f').category, ItemCategory::Consumable);
        assert_eq!(layout_for('!').category, ItemCategory::Special);
        assert_eq!(layout_for('Z').category, ItemCategory::Unknown);
    }
}
