//! The configuration document and its resolution.
//!
//! Configuration is a TOML file (by convention `protoc-herd.toml` in the
//! working directory) describing what to generate and where the tooling
//! lives. Boolean options can be overridden per run from the CLI or
//! environment; the merged result is resolved exactly once into a
//! [`ResolvedConfig`] of absolute paths, which is then passed by reference
//! into every component. No component resolves paths against its own notion
//! of the current directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HerdError, Result};
use crate::logging::Logger;

/// Conventional name of the configuration document inside the workdir.
pub const TYPICAL_NAME: &str = "protoc-herd.toml";

/// The configuration document as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenConfig {
    /// Target language ids, in generation order.
    pub languages: Vec<String>,

    /// Root of the proto source tree, absolute or workdir-relative.
    pub proto_root: PathBuf,

    /// Root of the generated output tree, absolute or workdir-relative.
    pub gen_root: PathBuf,

    /// Directory containing protoc and its per-language plugins.
    pub programs_root: PathBuf,

    /// File extensions that make a source file "matching".
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Generate transport (gRPC service/streaming) stubs as well as
    /// plain message bindings.
    #[serde(default)]
    pub transport: bool,

    /// Remove output folders for languages no longer named in `languages`.
    #[serde(default)]
    pub wipe: bool,

    /// Regenerate everything regardless of digests.
    #[serde(default)]
    pub force: bool,

    /// Chatty per-file and per-invocation output.
    #[serde(default)]
    pub verbose: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["proto".to_string()]
}

/// Per-run overrides of the boolean configuration options, sourced from
/// CLI flags or environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub transport: Option<bool>,
    pub wipe: Option<bool>,
    pub force: Option<bool>,
    pub verbose: Option<bool>,
}

impl GenConfig {
    /// Loads the configuration document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HerdError::ConfigNotFound`] when the file is absent and
    /// [`HerdError::ConfigParse`] when it is not valid TOML. Unlike digest
    /// state, a broken config is fatal: there is nothing sensible to
    /// generate without it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HerdError::ConfigNotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path).map_err(|source| HerdError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| HerdError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies CLI/environment overrides, logging each value they change.
    pub fn apply_overrides(&mut self, overrides: &Overrides, log: &Logger) {
        let mut apply = |name: &str, slot: &mut bool, replacement: Option<bool>| {
            if let Some(value) = replacement
                && *slot != value
            {
                log.info(format!("Config replacement (provided via CLI): {name} = {value}"));
                *slot = value;
            }
        };

        apply("transport", &mut self.transport, overrides.transport);
        apply("wipe", &mut self.wipe, overrides.wipe);
        apply("force", &mut self.force, overrides.force);
        apply("verbose", &mut self.verbose, overrides.verbose);
    }

    /// Resolves the document against the working directory, producing the
    /// immutable value every component works from.
    pub fn resolve(self, workdir: &Path, config_path: &Path) -> ResolvedConfig {
        ResolvedConfig {
            proto_root: absolutize(workdir, &self.proto_root),
            gen_root: absolutize(workdir, &self.gen_root),
            programs_root: absolutize(workdir, &self.programs_root),
            config_path: absolutize(workdir, config_path),
            languages: self.languages,
            extensions: self.extensions,
            transport: self.transport,
            wipe: self.wipe,
            force: self.force,
            verbose: self.verbose,
        }
    }
}

/// The fully resolved, immutable configuration for one run.
///
/// All paths are absolute. Produced once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config_path: PathBuf,
    pub proto_root: PathBuf,
    pub gen_root: PathBuf,
    pub programs_root: PathBuf,
    pub languages: Vec<String>,
    pub extensions: Vec<String>,
    pub transport: bool,
    pub wipe: bool,
    pub force: bool,
    pub verbose: bool,
}

impl ResolvedConfig {
    /// Validates the roots this run depends on.
    ///
    /// Called before any state is read or any task executes, so
    /// configuration errors never leave partial state behind.
    pub fn validate(&self) -> Result<()> {
        if !self.proto_root.is_dir() {
            return Err(HerdError::ProtoRootInvalid(self.proto_root.clone()));
        }
        if !self.programs_root.is_dir() {
            return Err(HerdError::ProgramsRootInvalid(self.programs_root.clone()));
        }
        Ok(())
    }
}

fn absolutize(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}
