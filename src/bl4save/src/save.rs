//! Save file parsing, querying, and modification.
//!
//! [`SaveFile`] wraps the YAML tree of a decrypted save. Unknown `!tags` are
//! kept as tagged nodes and written back verbatim.

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::crypto::{self, ContainerOptions, CryptoError};
use crate::document::{self, DocumentError};
use crate::path::{self, PathError};
use crate::serial::DecodedItem;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Represents a loaded save file with query/modify capabilities
#[derive(Clone, PartialEq)]
pub struct SaveFile {
    data: Value,
}

impl SaveFile {
    /// Parse a save file from decrypted YAML data
    pub fn from_yaml(yaml_data: &[u8]) -> Result<Self, SaveError> {
        let data = serde_yaml::from_slice(yaml_data)?;
        Ok(SaveFile { data })
    }

    /// Decrypt a `.sav` container and parse it
    pub fn decrypt(
        encrypted: &[u8],
        steam_id: &str,
        options: &ContainerOptions,
    ) -> Result<Self, SaveError> {
        let yaml = crypto::decrypt_sav_with(encrypted, steam_id, options)?;
        Self::from_yaml(&yaml)
    }

    /// Serialize the save file back to YAML
    pub fn to_yaml(&self) -> Result<Vec<u8>, SaveError> {
        let yaml_string = serde_yaml::to_string(&self.data)?;
        Ok(yaml_string.into_bytes())
    }

    /// Serialize and encrypt back into a `.sav` container
    pub fn encrypt(&self, steam_id: &str) -> Result<Vec<u8>, SaveError> {
        Ok(crypto::encrypt_sav(&self.to_yaml()?, steam_id)?)
    }

    /// Query a value at a YAML path (e.g. "state.currencies.cash" or "state.experience\[0\].level")
    pub fn get(&self, path: &str) -> Result<&Value, SaveError> {
        Ok(path::resolve(&self.data, path)?)
    }

    /// Set a value at a YAML path
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), SaveError> {
        Ok(path::set_path(&mut self.data, path, value)?)
    }

    /// Parse a string value into the appropriate YAML type (number, bool, or string)
    pub fn parse_value(value_str: &str) -> Value {
        parse_value(value_str)
    }

    /// Set a raw YAML value from a string (for nested structures)
    ///
    /// # Example
    /// ```no_run
    /// # use bl4save::SaveFile;
    /// # let mut save = SaveFile::from_yaml(b"state: {}").unwrap();
    /// save.set_raw("state.currencies", r#"
    ///   cash: 123
    ///   eridium: 4
    /// "#).unwrap();
    /// ```
    pub fn set_raw(&mut self, path: &str, yaml_str: &str) -> Result<(), SaveError> {
        let value: Value = serde_yaml::from_str(yaml_str)?;
        self.set(path, value)
    }

    /// All recognizable item serials, keyed by path
    pub fn find_serials(&self) -> BTreeMap<String, DecodedItem> {
        document::find_serials(&self.data)
    }

    /// Write edited items back at their paths; returns how many changed
    pub fn apply_serial_edits(
        &mut self,
        edits: &BTreeMap<String, DecodedItem>,
    ) -> Result<usize, SaveError> {
        Ok(document::apply_serial_edits(&mut self.data, edits)?)
    }

    /// Embed the decoded-items section for hand editing.
    /// Returns how many items it lists.
    pub fn with_decoded_items(&mut self) -> Result<usize, SaveError> {
        let found = self.find_serials();
        document::insert_decoded_items(&mut self.data, &found)?;
        Ok(found.len())
    }

    /// Fold an edited decoded-items section back in, if there is one
    pub fn apply_decoded_items(&mut self) -> Result<usize, SaveError> {
        Ok(document::extract_decoded_items(&mut self.data)?)
    }

    pub fn value(&self) -> &Value {
        &self.data
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    pub fn into_value(self) -> Value {
        self.data
    }
}

impl From<Value> for SaveFile {
    fn from(data: Value) -> Self {
        SaveFile { data }
    }
}

impl fmt::Debug for SaveFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self
            .data
            .as_mapping()
            .map(|map| map.keys().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        f.debug_struct("SaveFile")
            .field("sections", &keys)
            .field("serials", &self.find_serials().len())
            .finish()
    }
}

pub(crate) fn parse_value(value_str: &str) -> Value {
    // Try to parse as number first
    if let Ok(num) = value_str.parse::<i64>() {
        return Value::Number(num.into());
    }
    if let Ok(num) = value_str.parse::<u64>() {
        return Value::Number(num.into());
    }
    if let Ok(num) = value_str.parse::<f64>() {
        return Value::Number(serde_yaml::Number::from(num));
    }

    if value_str.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value_str.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(value_str.to_string())
}
