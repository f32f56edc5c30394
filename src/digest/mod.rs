//! The content digest store.
//!
//! Tracks a BLAKE3 fingerprint per matching proto file, persisted as a JSON
//! map at `<proto_root>/.dir.digest`. The store answers the first of the two
//! staleness questions ("did this file's bytes change since the last
//! successful run?"); output-tree presence answers the second, over in
//! [`crate::plan`].
//!
//! Corrupt or absent digest state is never fatal: it simply makes every file
//! look changed, which costs one full regeneration and nothing else. The new
//! digest is written atomically and only after the whole run succeeds, so a
//! crash mid-run can never mark untouched files as up to date.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use rayon::prelude::*;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{HerdError, Result};
use crate::hashing::hash_file;


/// Well-known digest file name inside the proto root.
pub const DIGEST_FILE: &str = ".dir.digest";

/// Relative path → hex content hash, order-irrelevant (BTreeMap keeps the
/// persisted JSON stable and diff-friendly).
pub type FileDigest = BTreeMap<String, String>;

/// Compiled matcher for the configured source-file extensions.
///
/// The same pattern serves two purposes: deciding whether a walked file name
/// is a source file, and deriving the synthetic output sub-path (capture
/// group 1) from a relative source path.
#[derive(Debug, Clone)]
pub struct Matcher {
    re: Regex,
}

impl Matcher {
    /// Builds the matcher from configured extensions, e.g. `["proto"]`
    /// becomes `^(.+)\.(?:proto)$`.
    pub fn from_extensions(extensions: &[String]) -> Self {
        let alternatives: Vec<String> = extensions.iter().map(|e| regex::escape(e)).collect();
        let pattern = format!("^(.+)\\.(?:{})$", alternatives.join("|"));
        Self {
            // Escaped alternatives cannot produce an invalid pattern.
            re: Regex::new(&pattern).expect("extension matcher pattern"),
        }
    }

    /// Whether a bare file name is a matching source file.
    pub fn matches_name(&self, name: &str) -> bool {
        self.re.is_match(name)
    }

    /// The synthetic output sub-path for a relative source path: the path
    /// with its matched extension stripped (`svc/a.proto` → `svc/a`).
    pub fn synthetic_path<'a>(&self, relative: &'a str) -> Option<&'a str> {
        self.re
            .captures(relative)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Walks `root` and returns every matching file path, relative to `root`,
/// sorted for deterministic task ordering.
pub fn snapshot(root: &Path, matcher: &Matcher) -> Result<Vec<String>> {
    let mut matching = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| HerdError::IoError {
            path: err.path().unwrap_or(root).to_path_buf(),
            source: err.into(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !matcher.matches_name(&name) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path());
        matching.push(rel_to_string(relative)?);
    }

    matching.sort();
    Ok(matching)
}

/// Loads the prior digest snapshot.
///
/// Absence or corruption yields an empty digest: the store must never turn
/// bad cached state into a run failure.
pub fn load(root: &Path) -> FileDigest {
    let path = root.join(DIGEST_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => FileDigest::default(),
    }
}

/// Rehashes every matching file and diffs against the prior digest.
///
/// A file is changed when `force` is set, when it is absent from `old`, or
/// when its hash differs. The returned digest covers exactly
/// `matching_files`; files deleted from the tree since the last run drop
/// out rather than being carried forward.
pub fn diff(
    old: &FileDigest,
    root: &Path,
    matching_files: &[String],
    force: bool,
) -> Result<(HashSet<String>, FileDigest)> {
    let hashes: Vec<(String, String)> = matching_files
        .par_iter()
        .map(|relative| {
            let hash = hash_file(&root.join(relative))?;
            Ok((relative.clone(), hash))
        })
        .collect::<Result<_>>()?;

    let mut changed = HashSet::new();
    let mut new_digest = FileDigest::new();

    for (relative, hash) in hashes {
        if force || old.get(&relative) != Some(&hash) {
            changed.insert(relative.clone());
        }
        new_digest.insert(relative, hash);
    }

    Ok((changed, new_digest))
}

/// Persists the new digest atomically (tmp file + rename), superseding the
/// prior snapshot.
///
/// Call only after a successful run; the driver skips this on any fatal
/// failure so the next run diffs against the last known-good state.
pub fn persist(root: &Path, digest: &FileDigest) -> Result<()> {
    let path = root.join(DIGEST_FILE);
    let json =
        serde_json::to_string_pretty(digest).map_err(|source| HerdError::SerializationError {
            path: path.clone(),
            source,
        })?;

    let temp_path = path.with_extension("digest.tmp");

    let mut temp_file = File::create(&temp_path).map_err(|source| HerdError::IoError {
        path: temp_path.clone(),
        source,
    })?;

    temp_file
        .write_all(json.as_bytes())
        .map_err(|source| HerdError::IoError {
            path: temp_path.clone(),
            source,
        })?;

    temp_file.sync_all().map_err(|source| HerdError::IoError {
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, &path).map_err(|source| HerdError::IoError {
        path: path.clone(),
        source,
    })?;

    Ok(())
}

/// Renders a relative path as a `/`-separated UTF-8 string, the form digest
/// keys and synthetic paths are stored in on every platform.
pub fn rel_to_string(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| HerdError::InvalidUtf8Path(relative.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
