//! Bit-pack codec for item serials.
//!
//! Bytes are laid end to end as a bitstream and re-cut into 6-bit groups,
//! each written as one character of [`CHARSET`]. Serials carry the literal
//! `@Ug` marker in front; the type character after it is simply the first
//! 6-bit group of the payload.

use super::bitstream::{BitReader, BitWriter};

/// Literal marker every item serial starts with
pub const SERIAL_MARKER: &str = "@Ug";

/// Character table, indexed by value. Only the first 64 entries can be
/// produced from 6-bit groups; the rest still decode (at 7-bit width).
pub const CHARSET: &[u8; 85] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=!$%&*()[]{}~`^_<>?#;";

const INVALID: u8 = 0xFF;

const LOOKUP: [u8; 128] = build_lookup();

const fn build_lookup() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < CHARSET.len() {
        table[CHARSET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Value of a serial character, or None if it isn't in the table
pub fn char_value(ch: char) -> Option<u8> {
    if !ch.is_ascii() {
        return None;
    }
    match LOOKUP[ch as usize] {
        INVALID => None,
        value => Some(value),
    }
}

/// Encode bytes to a serial string behind `prefix`.
///
/// The bitstream is zero-padded on the right to a whole number of 6-bit groups.
pub fn encode(data: &[u8], prefix: &str) -> String {
    let mut reader = BitReader::new(data);
    let mut result = String::with_capacity(prefix.len() + data.len().div_ceil(3) * 4);
    result.push_str(prefix);

    while let Some(group) = reader.read_bits_padded(6) {
        // 6-bit groups always index the first 64 entries
        if let Some(&ch) = CHARSET.get(group as usize) {
            result.push(ch as char);
        }
    }

    result
}

/// Encode bytes behind the bare `@Ug` marker
pub fn encode_serial(data: &[u8]) -> String {
    encode(data, SERIAL_MARKER)
}

/// Encode bytes behind the `@Ug` marker so they decode back to exactly
/// `data.len()` bytes.
///
/// Plain 6-bit packing of a length that isn't a multiple of 3 bytes ends in a
/// partial group, which decodes as an extra byte unless its bits are zero.
/// Game serials avoid that by mixing in 7-bit characters (table indices 64
/// and up), and so does this: groups are 6 bits wherever possible and 7 bits
/// where needed for the bit count to end inside the last byte. The first
/// group is always 6 bits, so the type character is kept. Lengths that are a
/// multiple of 3 give the same string as [`encode_serial`].
///
/// Returns `None` when no such packing exists.
pub fn encode_serial_exact(data: &[u8]) -> Option<String> {
    let total = data.len() * 8;

    // 7-bit group starting at `pos`, if its value is a table character
    let wide = |pos: usize| -> Option<u8> {
        if pos == 0 || pos + 7 > total {
            return None;
        }
        let value = BitReader::at(data, pos).read_bits(7)? as u8;
        (64..CHARSET.len()).contains(&usize::from(value)).then_some(value)
    };
    // Stopping at `pos` decodes to `data.len()` bytes without losing set bits
    let ends_at = |pos: usize| {
        pos <= total && pos + 8 > total && BitReader::at(data, pos).read_bits(total - pos) == Some(0)
    };

    let mut completes = vec![false; total + 1];
    for pos in (0..=total).rev() {
        completes[pos] = ends_at(pos)
            || (pos + 6 <= total && completes[pos + 6])
            || (wide(pos).is_some() && completes[pos + 7]);
    }
    if !completes[0] {
        return None;
    }

    let mut result = String::with_capacity(SERIAL_MARKER.len() + total / 6 + 1);
    result.push_str(SERIAL_MARKER);
    let mut pos = 0;
    loop {
        if pos + 6 <= total && completes[pos + 6] {
            let group = BitReader::at(data, pos).read_bits(6)?;
            result.push(CHARSET[group as usize] as char);
            pos += 6;
        } else if let Some(value) = wide(pos).filter(|_| completes[pos + 7]) {
            result.push(CHARSET[usize::from(value)] as char);
            pos += 7;
        } else {
            break;
        }
    }

    Some(result)
}

/// Decode a serial string to bytes.
///
/// Strips exactly the `@Ug` marker when present (the type character stays in
/// the payload), skips characters outside the table, and zero-pads the
/// resulting bitstream to whole bytes.
pub fn decode(serial: &str) -> Vec<u8> {
    let payload = serial.strip_prefix(SERIAL_MARKER).unwrap_or(serial);

    let mut writer = BitWriter::new();
    for value in payload.chars().filter_map(char_value) {
        // Values past 63 keep their full binary width instead of being truncated
        let width = (u8::BITS - value.leading_zeros()).max(6) as usize;
        writer.write_bits(u64::from(value), width);
    }

    writer.finish()
}

/// The type character following the marker, if the serial has one
pub fn discriminant(serial: &str) -> Option<char> {
    serial.strip_prefix(SERIAL_MARKER)?.chars().next()
}
