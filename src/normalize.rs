//! Output normalization post-pass.
//!
//! The C++ generator emits `.cc` implementation files; the project packaging
//! convention wants `.hpp`. When a run executed at least one C++ task, every
//! generated `.cc` under the cpp subtree is renamed. Pure post-pass; no
//! effect on staleness tracking.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{HerdError, Result};
use crate::logging::Logger;
use crate::plan::GenerationTask;

/// Renames generated C++ `.cc` files to `.hpp` when any executed task
/// targeted the cpp language.
pub fn normalize(gen_root: &Path, tasks: &[GenerationTask], log: &Logger) -> Result<()> {
    if !tasks.iter().any(|t| t.language.id == "cpp") {
        return Ok(());
    }

    log.info("Renaming generated C++ files from '*.cc' -> '*.hpp'");
    change_ext_recursive(&gen_root.join("cpp"), "cc", "hpp")
}

/// Renames every file under `root` whose extension is `ext` to `new_ext`,
/// leaving all other files untouched.
fn change_ext_recursive(root: &Path, ext: &str, new_ext: &str) -> Result<()> {
    // Collect first so renames never race the walk.
    let targets: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|e| e == ext)
        })
        .map(|entry| entry.into_path())
        .collect();

    for path in targets {
        let renamed = path.with_extension(new_ext);
        fs::rename(&path, &renamed).map_err(|source| HerdError::IoError {
            path: path.clone(),
            source,
        })?;
    }

    Ok(())
}
