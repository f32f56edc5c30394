//! Run orchestration.
//!
//! Wires the components together in their data-flow order: configuration →
//! fingerprint → digest diff → plan → execute → normalize → persist. The
//! digest is persisted last and only on success, which is the whole
//! incremental-correctness story: a failed run leaves the previous digest
//! (and therefore the next run's plan) exactly as it was.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::{GenConfig, Overrides, ResolvedConfig, TYPICAL_NAME};
use crate::digest::{self, Matcher};
use crate::error::{HerdError, Result};
use crate::executor::Executor;
use crate::fingerprint;
use crate::logging::Logger;
use crate::normalize::normalize;
use crate::plan::{compute_plan, PlanInputs};

/// Executes one full driver run from the given working directory.
///
/// `config_path` defaults to `protoc-herd.toml` inside `workdir`. Boolean
/// config options may be overridden per run via `overrides`.
pub fn run(
    workdir: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    cli_verbose: u8,
    quiet: bool,
) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => workdir.join(TYPICAL_NAME),
    };

    let mut config = GenConfig::load(&config_path)?;
    config.apply_overrides(overrides, &Logger::new(cli_verbose, quiet));

    // The config's own verbose flag raises the level to at least 1.
    let verbose = if config.verbose { cli_verbose.max(1) } else { cli_verbose };
    let log = Logger::new(verbose, quiet);

    let config = config.resolve(workdir, &config_path);
    config.validate()?;

    log.info(format!("Working directory: {}", workdir.display()));
    log.info(format!("Config: {}", config.config_path.display()));

    let config_changed = fingerprint::has_changed(&config.config_path)?;

    let matcher = Matcher::from_extensions(&config.extensions);
    let all_files = digest::snapshot(&config.proto_root, &matcher)?;
    let old_digest = digest::load(&config.proto_root);
    let (changed_files, new_digest) =
        digest::diff(&old_digest, &config.proto_root, &all_files, false)?;

    fs::create_dir_all(&config.gen_root).map_err(|source| HerdError::IoError {
        path: config.gen_root.clone(),
        source,
    })?;

    if config.wipe {
        wipe_unmanaged_folders(&config, &log)?;
    }

    log_file_summary(&config, &all_files, &changed_files, config_changed, &log);

    let inputs = PlanInputs {
        changed_files: &changed_files,
        all_files: &all_files,
        languages: &config.languages,
        forced: config.force,
        config_changed,
        gen_root: &config.gen_root,
        matcher: &matcher,
    };
    let tasks = compute_plan(&inputs, &log);

    if tasks.is_empty() {
        log.info("Up-to-date");
    } else {
        log.info(format!("Generating code ({} jobs to be done)...", tasks.len()));
        for task in &tasks {
            log.verbose(
                1,
                format!(
                    "    {} [{}]: {}",
                    task.proto_file,
                    task.language.id,
                    task.reason.describe()
                ),
            );
        }
    }

    Executor::new(&config, &log).run(&tasks)?;

    normalize(&config.gen_root, &tasks, &log)?;

    digest::persist(&config.proto_root, &new_digest)?;

    Ok(())
}

/// Removes entries under `gen_root` that are not named in `languages`.
///
/// Old language folders linger after a language is dropped from the config;
/// with `wipe` enabled they are removed before planning.
fn wipe_unmanaged_folders(config: &ResolvedConfig, log: &Logger) -> Result<()> {
    let managed: HashSet<&str> = config.languages.iter().map(|l| l.as_str()).collect();

    let entries = fs::read_dir(&config.gen_root).map_err(|source| HerdError::IoError {
        path: config.gen_root.clone(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| HerdError::IoError {
            path: config.gen_root.clone(),
            source,
        })?;
        let name = entry.file_name();
        if managed.contains(name.to_string_lossy().as_ref()) {
            continue;
        }

        let path = entry.path();
        log.verbose(1, format!("Wiping unmanaged output: {}", path.display()));
        let removal = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|source| HerdError::IoError { path, source })?;
    }

    Ok(())
}

fn log_file_summary(
    config: &ResolvedConfig,
    all_files: &[String],
    changed_files: &HashSet<String>,
    config_changed: bool,
    log: &Logger,
) {
    let mut summary = format!(
        "Total num files {}, num changed: {}",
        all_files.len(),
        changed_files.len()
    );
    if config.force {
        summary.push_str(", running in FORCE mode");
    }
    if config_changed {
        summary.push_str(", configuration changed");
    }
    log.verbose(1, summary);

    for file in all_files {
        log.verbose(
            1,
            format!("    {file}, changed: {}", changed_files.contains(file)),
        );
    }
}
