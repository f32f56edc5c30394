//! Command-line interface definitions for protoc-herd.
//!
//! The driver is a single command: point it at a working directory holding a
//! `protoc-herd.toml` and it does the rest. Boolean config options can be
//! overridden per invocation (`--force true`, `--transport false`, or via
//! the matching environment variables), mirroring the way CI pipelines set
//! these without editing the checked-in config.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::Overrides;

/// Incremental protobuf/gRPC code generation driver.
#[derive(Parser, Debug)]
#[command(
    name = "protoc-herd",
    bin_name = "protoc-herd",
    author,
    version,
    about = "Regenerates protobuf/gRPC bindings for the source files that actually changed",
    long_about = None
)]
pub struct Cli {
    /// Working directory containing the config and workdir-relative roots
    #[arg(long, default_value = ".", env = "PROTOC_HERD_WORKDIR")]
    workdir: PathBuf,

    /// Path to the configuration document (defaults to
    /// `<workdir>/protoc-herd.toml`)
    #[arg(long, env = "PROTOC_HERD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the config's `force` flag (regenerate everything)
    #[arg(long, env = "PROTOC_HERD_FORCE", num_args = 0..=1, default_missing_value = "true")]
    force: Option<bool>,

    /// Override the config's `transport` flag (gRPC stub generation)
    #[arg(long, env = "PROTOC_HERD_TRANSPORT", num_args = 0..=1, default_missing_value = "true")]
    transport: Option<bool>,

    /// Override the config's `wipe` flag (remove unmanaged output folders)
    #[arg(long, env = "PROTOC_HERD_WIPE", num_args = 0..=1, default_missing_value = "true")]
    wipe: Option<bool>,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, env = "PROTOC_HERD_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(short, long, conflicts_with = "verbose", env = "PROTOC_HERD_QUIET")]
    quiet: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The working directory, absolute and cleaned.
    pub fn get_workdir(&self) -> PathBuf {
        normalize_path(&self.workdir)
    }

    /// The explicit config path, if one was given.
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// The per-run boolean overrides for the config document.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            transport: self.transport,
            wipe: self.wipe,
            force: self.force,
            verbose: None,
        }
    }

    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Create a builder for programmatic construction.
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }
}

/// Builder for [`Cli`], used by tests and library callers.
#[derive(Debug, Default)]
pub struct CliBuilder {
    workdir: Option<PathBuf>,
    config: Option<PathBuf>,
    force: Option<bool>,
    transport: Option<bool>,
    wipe: Option<bool>,
    verbose: u8,
    quiet: bool,
}

impl CliBuilder {
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = Some(path.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    pub fn transport(mut self, transport: bool) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn wipe(mut self, wipe: bool) -> Self {
        self.wipe = Some(wipe);
        self
    }

    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn build(self) -> Cli {
        Cli {
            workdir: self.workdir.unwrap_or_else(|| PathBuf::from(".")),
            config: self.config,
            force: self.force,
            transport: self.transport,
            wipe: self.wipe,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// Relative paths are resolved against the current directory; `.` and `..`
/// components are collapsed where possible; symlinks are not resolved.
fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && !matches!(last, Component::ParentDir)
                {
                    components.pop();
                    continue;
                }
                components.push(component);
            }
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    let mut result = PathBuf::new();
    for component in components {
        result.push(component);
    }

    result
}
