//! # bl4save
//!
//! Borderlands 4 save transcoder - container encryption and item serial editing.
//!
//! This library provides functionality to:
//! - Decrypt and encrypt Borderlands 4 .sav files
//! - Parse decrypted YAML save data without losing unknown tags
//! - Decode item serials into stats with a confidence rating
//! - Edit those stats and write re-encoded serials back into the save
//!
//! ## Example
//!
//! ```no_run
//! use std::fs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let encrypted = fs::read("1.sav")?;
//! let steam_id = "76561197960521364";
//!
//! let yaml_data = bl4save::decrypt_sav(&encrypted, steam_id)?;
//! let mut save = bl4save::SaveFile::from_yaml(&yaml_data)?;
//!
//! let mut items = save.find_serials();
//! for (path, item) in items.iter_mut() {
//!     println!("{}: {} ({})", path, item.category, item.confidence);
//!     if item.category == bl4save::ItemCategory::Equipment {
//!         item.stats.secondary_stat = Some(5000);
//!     }
//! }
//! save.apply_serial_edits(&items)?;
//!
//! let encrypted = bl4save::encrypt_sav(&save.to_yaml()?, steam_id)?;
//! fs::write("1.sav", encrypted)?;
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod document;
pub mod path;
pub mod save;
pub mod serial;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used items
#[doc(inline)]
pub use crypto::{
    decrypt_sav, decrypt_sav_with, derive_key, encrypt_sav, ContainerOptions, CryptoError,
    FooterCheck,
};
#[doc(inline)]
pub use document::{
    apply_serial_edits, extract_decoded_items, find_serials, insert_decoded_items,
    DecodedItemEntry, DocumentError, DECODED_ITEMS_KEY,
};
#[doc(inline)]
pub use path::{PathError, PathSegment};
#[doc(inline)]
pub use save::{SaveError, SaveFile};
#[doc(inline)]
pub use serial::{
    Confidence, DecodedItem, ItemCategory, ItemStats, RawFields, SerialError, StatField,
};
