//! Raw diagnostic view of the leading bytes of a decoded serial.
//!
//! Nothing here is authoritative. It is the dump used to hunt for field
//! offsets, and the fallback decoder picks its stat guesses from it.

use serde::{Deserialize, Serialize};

/// Only the first 20 bytes are dumped
pub const RAW_WINDOW: usize = 20;

/// 16-bit values in this range look like stats
const STAT_RANGE: std::ops::RangeInclusive<u16> = 100..=10000;

/// Byte values below this look like flags or small enums
const FLAG_LIMIT: u8 = 100;

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize, little_endian: bool) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(if little_endian {
        u32::from_le_bytes(bytes)
    } else {
        u32::from_be_bytes(bytes)
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_le: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_be: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field2_le: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field3_le: Option<u32>,

    /// `(offset, value)` little-endian u16 at every even offset in the window
    pub words: Vec<(usize, u16)>,
    /// `(offset, value)` for every byte in the window
    pub bytes: Vec<(usize, u8)>,

    pub potential_stats: Vec<(usize, u16)>,
    pub potential_flags: Vec<(usize, u8)>,

    /// Set instead of everything else when the serial could not be decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawFields {
    pub fn extract(data: &[u8]) -> Self {
        let mut fields = RawFields {
            header_le: read_u32(data, 0, true),
            header_be: read_u32(data, 0, false),
            field2_le: read_u32(data, 4, true),
            field3_le: read_u32(data, 8, true),
            ..Default::default()
        };

        let word_end = data.len().saturating_sub(1).min(RAW_WINDOW);
        for offset in (0..word_end).step_by(2) {
            if let Some(value) = read_u16_le(data, offset) {
                fields.words.push((offset, value));
                if STAT_RANGE.contains(&value) {
                    fields.potential_stats.push((offset, value));
                }
            }
        }

        for (offset, &value) in data.iter().enumerate().take(RAW_WINDOW) {
            fields.bytes.push((offset, value));
            if value < FLAG_LIMIT {
                fields.potential_flags.push((offset, value));
            }
        }

        fields
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        RawFields {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}
