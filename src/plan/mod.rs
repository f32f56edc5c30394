//! The build plan computer.
//!
//! Turns "changed files" + "desired languages" into the minimal ordered set
//! of generation tasks. Two independent staleness signals feed the plan:
//! the content digest (did the source bytes change?) and output-tree
//! presence (does the expected output for this language still exist?).
//! Each is a standalone predicate and they are OR-combined per
//! (language, file) pair: the digest cannot see a user deleting generated
//! output, and presence cannot see an edited source, so neither subsumes
//! the other.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::digest::Matcher;
use crate::language::{self, Language, OutputLayout};
use crate::logging::Logger;


/// Why a (language, file) pair is being regenerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StalenessReason {
    /// The explicit force flag was set for this run.
    Forced,
    /// The configuration fingerprint changed since the last run.
    ConfigChanged,
    /// The source file's content hash differs from the prior digest.
    ContentChanged,
    /// The expected output for this language is missing from the tree.
    OutputMissing,
}

impl StalenessReason {
    pub fn describe(&self) -> &'static str {
        match self {
            StalenessReason::Forced => "force flag set",
            StalenessReason::ConfigChanged => "configuration changed",
            StalenessReason::ContentChanged => "source content changed",
            StalenessReason::OutputMissing => "generated output missing",
        }
    }
}

/// One unit of generation work: a language, a dedicated output directory,
/// and one source file. Never mutated after planning; consumed exactly once
/// by the executor, which recreates `out_dir` immediately before running
/// the generator against it.
#[derive(Clone, Debug)]
pub struct GenerationTask {
    pub language: &'static Language,
    /// Absolute output directory for this task.
    pub out_dir: PathBuf,
    /// Source file path relative to the proto root, `/`-separated.
    pub proto_file: String,
    pub reason: StalenessReason,
}

/// Everything the planner needs, borrowed from the driver.
pub struct PlanInputs<'a> {
    pub changed_files: &'a HashSet<String>,
    /// All matching files, in snapshot (sorted) order.
    pub all_files: &'a [String],
    /// Desired languages, in configuration order.
    pub languages: &'a [String],
    pub forced: bool,
    pub config_changed: bool,
    pub gen_root: &'a Path,
    pub matcher: &'a Matcher,
}

/// Computes the ordered task list: language-major, file-minor, following
/// the configured language order.
///
/// A configured language with no registered plugin is a warned skip, not a
/// failure. For a Flat-layout language, one stale file makes every file of
/// that language a task: its shared output directory is recreated once per
/// run, so regenerating only the stale subset would silently drop siblings.
pub fn compute_plan(inputs: &PlanInputs<'_>, log: &Logger) -> Vec<GenerationTask> {
    let mut tasks = Vec::new();

    for language_id in inputs.languages {
        let Some(language) = language::lookup(language_id) else {
            log.warn(format!(
                "Unsupported desired language: {language_id} (no appropriate plugin)"
            ));
            continue;
        };

        let mut stale: Vec<(String, StalenessReason)> = Vec::new();

        for file in inputs.all_files {
            if let Some(reason) = staleness(inputs, language, file) {
                stale.push((file.clone(), reason));
            }
        }

        match language.layout {
            OutputLayout::Nested => {
                for (file, reason) in stale {
                    let out_dir = match nested_out_dir(inputs, language, &file) {
                        Some(dir) => dir,
                        None => continue,
                    };
                    tasks.push(GenerationTask {
                        language,
                        out_dir,
                        proto_file: file,
                        reason,
                    });
                }
            }
            OutputLayout::Flat => {
                // The shared directory is wiped before the first task, so
                // all of this language's outputs are rebuilt together.
                if stale.is_empty() {
                    continue;
                }
                let stale_reasons: std::collections::HashMap<String, StalenessReason> =
                    stale.into_iter().collect();
                let out_dir = inputs.gen_root.join(language.id);
                for file in inputs.all_files {
                    let reason = stale_reasons
                        .get(file)
                        .copied()
                        .unwrap_or(StalenessReason::OutputMissing);
                    tasks.push(GenerationTask {
                        language,
                        out_dir: out_dir.clone(),
                        proto_file: file.clone(),
                        reason,
                    });
                }
            }
        }
    }

    tasks
}

/// The OR of every staleness signal for one (language, file) pair, with the
/// strongest global signal winning the reason tag.
fn staleness(
    inputs: &PlanInputs<'_>,
    language: &'static Language,
    file: &str,
) -> Option<StalenessReason> {
    if inputs.forced {
        return Some(StalenessReason::Forced);
    }
    if inputs.config_changed {
        return Some(StalenessReason::ConfigChanged);
    }
    if inputs.changed_files.contains(file) {
        return Some(StalenessReason::ContentChanged);
    }
    if output_missing(language, inputs.gen_root, file, inputs.matcher) {
        return Some(StalenessReason::OutputMissing);
    }
    None
}

/// The output-presence staleness predicate.
///
/// For a Nested language the synthetic directory either exists or it does
/// not. A Flat generator writes its own package-derived hierarchy, so the
/// only available proxy is searching the language subtree for the file name
/// the generator would emit (snake_case stem → UpperCamelCase + extension).
pub fn output_missing(
    language: &Language,
    gen_root: &Path,
    file: &str,
    matcher: &Matcher,
) -> bool {
    match language.layout {
        OutputLayout::Nested => match matcher.synthetic_path(file) {
            Some(synthetic) => !gen_root.join(language.id).join(synthetic).is_dir(),
            None => true,
        },
        OutputLayout::Flat => {
            let stem = match matcher.synthetic_path(file) {
                Some(synthetic) => synthetic.rsplit('/').next().unwrap_or(synthetic),
                None => return true,
            };
            let expected = format!("{}.{}", language::to_camel_case(stem), language.source_ext);
            !flat_output_exists(&gen_root.join(language.id), &expected)
        }
    }
}

fn flat_output_exists(language_root: &Path, expected_name: &str) -> bool {
    let expected = std::ffi::OsStr::new(expected_name);
    WalkDir::new(language_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_type().is_file() && entry.file_name() == expected)
}

fn nested_out_dir(
    inputs: &PlanInputs<'_>,
    language: &Language,
    file: &str,
) -> Option<PathBuf> {
    let synthetic = inputs.matcher.synthetic_path(file)?;
    Some(inputs.gen_root.join(language.id).join(synthetic))
}
