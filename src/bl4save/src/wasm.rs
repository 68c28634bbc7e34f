//! WebAssembly bindings for bl4save
//!
//! Structured results cross the boundary as JSON strings; YAML and `.sav`
//! contents cross as byte arrays.

use std::collections::BTreeMap;

use crate::crypto::{decrypt_sav_with, encrypt_sav as rust_encrypt, ContainerOptions};
use crate::serial::DecodedItem;
use crate::save::SaveFile as RustSaveFile;
use wasm_bindgen::prelude::*;

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{} failed: {}", context, e))
}

/// Decrypt a Borderlands 4 save file
///
/// # Arguments
/// * `encrypted_data` - The encrypted .sav file as bytes
/// * `steam_id` - Steam ID for decryption
/// * `strict` - Reject files whose checksum footer doesn't match
///
/// # Returns
/// Decrypted YAML data as bytes
#[wasm_bindgen(js_name = decryptSav)]
pub fn decrypt_sav(
    encrypted_data: &[u8],
    steam_id: &str,
    strict: Option<bool>,
) -> Result<Vec<u8>, JsValue> {
    let options = if strict.unwrap_or(false) {
        ContainerOptions::strict()
    } else {
        ContainerOptions::default()
    };
    decrypt_sav_with(encrypted_data, steam_id, &options).map_err(|e| js_error("Decryption", e))
}

/// Encrypt YAML data to a Borderlands 4 save file
#[wasm_bindgen(js_name = encryptSav)]
pub fn encrypt_sav(yaml_data: &[u8], steam_id: &str) -> Result<Vec<u8>, JsValue> {
    rust_encrypt(yaml_data, steam_id).map_err(|e| js_error("Encryption", e))
}

/// Find item serials in decrypted YAML
///
/// # Returns
/// JSON object of path -> decoded item
#[wasm_bindgen(js_name = findSerials)]
pub fn find_serials(yaml_data: &[u8]) -> Result<String, JsValue> {
    let save = RustSaveFile::from_yaml(yaml_data).map_err(|e| js_error("Parse", e))?;
    serde_json::to_string(&save.find_serials()).map_err(|e| js_error("Serialize", e))
}

/// Apply edited items to decrypted YAML
///
/// `edits_json` maps path -> item; each item needs at least `serial` and the
/// `stats` to change.
#[wasm_bindgen(js_name = applySerialEdits)]
pub fn apply_serial_edits(yaml_data: &[u8], edits_json: &str) -> Result<Vec<u8>, JsValue> {
    let edits: BTreeMap<String, DecodedItem> =
        serde_json::from_str(edits_json).map_err(|e| js_error("Parse edits", e))?;
    let mut save = RustSaveFile::from_yaml(yaml_data).map_err(|e| js_error("Parse", e))?;
    save.apply_serial_edits(&edits)
        .map_err(|e| js_error("Apply edits", e))?;
    save.to_yaml().map_err(|e| js_error("Serialize", e))
}

/// Decode a single serial to JSON
#[wasm_bindgen(js_name = decodeSerial)]
pub fn decode_serial(serial: &str) -> Result<String, JsValue> {
    serde_json::to_string(&DecodedItem::decode(serial)).map_err(|e| js_error("Serialize", e))
}

/// Re-encode a decoded item given as JSON
#[wasm_bindgen(js_name = encodeSerial)]
pub fn encode_serial(item_json: &str) -> Result<String, JsValue> {
    let item: DecodedItem =
        serde_json::from_str(item_json).map_err(|e| js_error("Parse item", e))?;
    Ok(item.encode())
}

/// JavaScript-friendly SaveFile wrapper
#[wasm_bindgen]
pub struct SaveFile {
    inner: RustSaveFile,
}

#[wasm_bindgen]
impl SaveFile {
    /// Parse a save file from decrypted YAML data
    #[wasm_bindgen(constructor)]
    pub fn new(yaml_data: &[u8]) -> Result<SaveFile, JsValue> {
        let inner = RustSaveFile::from_yaml(yaml_data).map_err(|e| js_error("Parse", e))?;
        Ok(SaveFile { inner })
    }

    #[wasm_bindgen(js_name = toYaml)]
    pub fn to_yaml(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.to_yaml().map_err(|e| js_error("Serialize", e))
    }

    /// Query a value at a YAML path, returned as YAML text
    #[wasm_bindgen(js_name = get)]
    pub fn get(&self, path: &str) -> Result<String, JsValue> {
        let value = self.inner.get(path).map_err(|e| js_error("Query", e))?;
        serde_yaml::to_string(value).map_err(|e| js_error("Serialize", e))
    }

    /// Set a value at a YAML path (from string, auto-parsed)
    #[wasm_bindgen(js_name = set)]
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), JsValue> {
        let parsed_value = RustSaveFile::parse_value(value);
        self.inner
            .set(path, parsed_value)
            .map_err(|e| js_error("Set", e))
    }

    #[wasm_bindgen(js_name = setRaw)]
    pub fn set_raw(&mut self, path: &str, yaml_str: &str) -> Result<(), JsValue> {
        self.inner
            .set_raw(path, yaml_str)
            .map_err(|e| js_error("Set raw", e))
    }

    /// Paths of every recognized serial
    #[wasm_bindgen(js_name = serialPaths)]
    pub fn serial_paths(&self) -> js_sys::Array {
        self.inner
            .find_serials()
            .keys()
            .map(|path| JsValue::from_str(path))
            .collect()
    }

    #[wasm_bindgen(js_name = withDecodedItems)]
    pub fn with_decoded_items(&mut self) -> Result<usize, JsValue> {
        self.inner
            .with_decoded_items()
            .map_err(|e| js_error("Insert decoded items", e))
    }

    #[wasm_bindgen(js_name = applyDecodedItems)]
    pub fn apply_decoded_items(&mut self) -> Result<usize, JsValue> {
        self.inner
            .apply_decoded_items()
            .map_err(|e| js_error("Apply decoded items", e))
    }
}
