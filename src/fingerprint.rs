//! The configuration fingerprint.
//!
//! A config edit (toggling `transport`, say) can invalidate every generated
//! artifact without a single source byte changing, so the driver fingerprints
//! the raw configuration bytes and compares against the previous run. The
//! check is deliberately destructive: it rewrites the fingerprint file as a
//! side effect, so each run's answer is relative to the immediately
//! preceding run only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{HerdError, Result};
use crate::hashing::hash_bytes;

/// Well-known fingerprint file name, written beside the config document.
pub const FINGERPRINT_FILE: &str = ".config.digest";

/// Returns whether the configuration changed since the last run, updating
/// the stored fingerprint as it goes.
///
/// Any byte-level change to the config document (whitespace included) flips
/// the answer to `true`. A missing or corrupt fingerprint file also answers
/// `true`: unknown prior state forces a full rebuild, never a failure.
pub fn has_changed(config_path: &Path) -> Result<bool> {
    let bytes = fs::read(config_path).map_err(|source| HerdError::IoError {
        path: config_path.to_path_buf(),
        source,
    })?;

    let key = config_path
        .to_str()
        .ok_or_else(|| HerdError::InvalidUtf8Path(config_path.to_path_buf()))?
        .to_string();
    let new_hash = hash_bytes(&bytes);

    let store_path = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(FINGERPRINT_FILE);

    let old: BTreeMap<String, String> = match fs::read_to_string(&store_path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => BTreeMap::default(),
    };

    let changed = old.get(&key) != Some(&new_hash);

    let mut new_store = BTreeMap::new();
    new_store.insert(key, new_hash);
    let json =
        serde_json::to_string_pretty(&new_store).map_err(|source| HerdError::SerializationError {
            path: store_path.clone(),
            source,
        })?;
    fs::write(&store_path, json).map_err(|source| HerdError::IoError {
        path: store_path.clone(),
        source,
    })?;

    Ok(changed)
}
