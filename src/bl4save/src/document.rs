//! Locating and rewriting item serials inside a decrypted save tree.
//!
//! Serials are found anywhere in the document by walking every mapping and
//! sequence. Each hit is reported by its path (see [`crate::path`]) so an edit
//! can be written back to exactly that leaf.
//!
//! For hand editing, the decoded view of every serial can be embedded in the
//! document itself under a top-level [`DECODED_ITEMS_KEY`] mapping and folded
//! back in before encryption.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::path::{child_index, child_key, resolve, set_path, PathError};
use crate::serial::{Confidence, DecodedItem, ItemCategory, ItemStats, SERIAL_MARKER};

/// Top-level key holding the editable decoded-items section
pub const DECODED_ITEMS_KEY: &str = "_DECODED_ITEMS";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to update {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("Decoded item at {0} has no original_serial")]
    MissingOriginalSerial(String),

    #[error("Invalid decoded item entry at {path}: {source}")]
    InvalidEntry {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} section must be a mapping of path to item", DECODED_ITEMS_KEY)]
    InvalidSection,

    #[error("Failed to build decoded items section: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One entry of the decoded-items section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedItemEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_serial: Option<String>,
    pub item_type: String,
    pub category: ItemCategory,
    pub confidence: Confidence,
    pub stats: ItemStats,
}

impl From<&DecodedItem> for DecodedItemEntry {
    fn from(item: &DecodedItem) -> Self {
        DecodedItemEntry {
            original_serial: Some(item.serial.clone()),
            item_type: item.item_type.to_string(),
            category: item.category,
            confidence: item.confidence,
            stats: item.stats,
        }
    }
}

/// Find every recognizable serial in the tree, keyed by path.
///
/// Only string scalars starting with the serial marker are decoded, and
/// records with [`Confidence::None`] are dropped. Mapping entries with
/// non-string keys are not followed, and an existing decoded-items section
/// is skipped.
pub fn find_serials(root: &Value) -> BTreeMap<String, DecodedItem> {
    let mut found = BTreeMap::new();
    walk(root, "", &mut found);
    found
}

fn walk(value: &Value, path: &str, found: &mut BTreeMap<String, DecodedItem>) {
    match value {
        Value::String(s) if !path.is_empty() && s.starts_with(SERIAL_MARKER) => {
            let item = DecodedItem::decode(s);
            if item.is_recognized() {
                debug!(path, item_type = %item.item_type, confidence = %item.confidence, "Found serial");
                found.insert(path.to_string(), item);
            }
        }
        Value::Sequence(seq) => {
            for (index, child) in seq.iter().enumerate() {
                walk(child, &child_index(path, index), found);
            }
        }
        Value::Mapping(map) => {
            for (key, child) in map {
                let Value::String(key) = key else { continue };
                if path.is_empty() && key == DECODED_ITEMS_KEY {
                    continue;
                }
                walk(child, &child_key(path, key), found);
            }
        }
        Value::Tagged(tagged) => walk(&tagged.value, path, found),
        _ => {}
    }
}

/// Re-encode each edited item and write it at its path.
///
/// Returns how many leaves now hold a different serial. Paths must come from
/// [`find_serials`] on a tree of the same shape.
pub fn apply_serial_edits(
    root: &mut Value,
    edits: &BTreeMap<String, DecodedItem>,
) -> Result<usize, DocumentError> {
    let mut changed = 0;

    for (path, item) in edits {
        let serial = item.encode();
        if serial != item.serial {
            changed += 1;
        }
        set_path(root, path, Value::String(serial)).map_err(|source| DocumentError::Path {
            path: path.clone(),
            source,
        })?;
    }

    Ok(changed)
}

/// Add a decoded-items section describing `items` to the document root.
///
/// Returns false, leaving the tree untouched, when the root isn't a mapping.
pub fn insert_decoded_items(
    root: &mut Value,
    items: &BTreeMap<String, DecodedItem>,
) -> Result<bool, DocumentError> {
    let Value::Mapping(map) = root else {
        return Ok(false);
    };

    let mut section = serde_yaml::Mapping::new();
    for (path, item) in items {
        let entry = serde_yaml::to_value(DecodedItemEntry::from(item))?;
        section.insert(Value::String(path.clone()), entry);
    }

    map.insert(
        Value::String(DECODED_ITEMS_KEY.to_string()),
        Value::Mapping(section),
    );
    Ok(true)
}

/// Fold a decoded-items section back into the document and remove it.
///
/// An entry is re-encoded only when one of its stats differs from what its
/// `original_serial` decodes to, so untouched entries leave their leaf as is.
/// Returns the number of leaves rewritten. On any error, including a path
/// that no longer resolves, the tree is left exactly as it was.
pub fn extract_decoded_items(root: &mut Value) -> Result<usize, DocumentError> {
    let Some(section) = root.as_mapping().and_then(|map| map.get(DECODED_ITEMS_KEY)) else {
        return Ok(0);
    };

    let entries = match section {
        Value::Mapping(entries) => entries.clone(),
        Value::Null => serde_yaml::Mapping::new(),
        _ => return Err(DocumentError::InvalidSection),
    };

    let mut rewrites = Vec::new();
    for (path, entry) in entries {
        let Value::String(path) = path else {
            return Err(DocumentError::InvalidSection);
        };
        let entry: DecodedItemEntry =
            serde_yaml::from_value(entry).map_err(|source| DocumentError::InvalidEntry {
                path: path.clone(),
                source,
            })?;
        let original = entry
            .original_serial
            .ok_or_else(|| DocumentError::MissingOriginalSerial(path.clone()))?;

        let baseline = DecodedItem::decode(&original);
        let edited = entry
            .stats
            .iter()
            .any(|(field, value)| baseline.stats.get(field) != Some(value));
        if !edited {
            continue;
        }

        let serial = DecodedItem {
            stats: entry.stats,
            ..baseline
        }
        .encode();
        if serial != original {
            rewrites.push((path, serial));
        }
    }

    let mut updated = root.clone();
    if let Value::Mapping(map) = &mut updated {
        map.remove(DECODED_ITEMS_KEY);
    }
    for (path, serial) in &rewrites {
        let path_error = |source| DocumentError::Path {
            path: path.clone(),
            source,
        };
        // Only existing leaves are rewritten, never inserted
        resolve(&updated, path).map_err(path_error)?;
        set_path(&mut updated, path, Value::String(serial.clone())).map_err(path_error)?;
    }
    *root = updated;

    debug!(rewritten = rewrites.len(), "Applied decoded items section");
    Ok(rewrites.len())
}
