//! The task executor.
//!
//! Runs planned generation tasks in order by invoking protoc synchronously,
//! one process per task. Output directories are recreated immediately before
//! first use, so every generator run starts against an existing, empty
//! directory (the Flat layout's shared directory is prepared once per run).
//!
//! Failure discipline: any task failure (missing source, spawn error,
//! non-zero generator exit) aborts the remaining tasks and deletes the
//! entire output root. Either the whole run's output is trustworthy or none
//! of it is; the digest is not persisted after a failure, so the next run
//! redoes everything this one attempted. Tasks are idempotent given a clean
//! directory, which makes "rerun the driver" the only retry mechanism
//! needed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ResolvedConfig;
use crate::error::{HerdError, Result};
use crate::language::{exec_name, TransportStyle};
use crate::logging::Logger;
use crate::plan::GenerationTask;

pub struct Executor<'a> {
    config: &'a ResolvedConfig,
    log: &'a Logger,
}

impl<'a> Executor<'a> {
    pub fn new(config: &'a ResolvedConfig, log: &'a Logger) -> Self {
        Self { config, log }
    }

    /// Runs every task in order, reporting rounded percentage progress.
    ///
    /// On the first failure the whole `gen_root` is removed and the error
    /// propagates; completed sibling tasks are discarded along with the
    /// failed one.
    pub fn run(&self, tasks: &[GenerationTask]) -> Result<()> {
        let total = tasks.len();
        let mut prepared: HashSet<PathBuf> = HashSet::new();

        for (index, task) in tasks.iter().enumerate() {
            if let Err(err) = self.run_task(task, &mut prepared) {
                if let Err(cleanup_err) = fs::remove_dir_all(&self.config.gen_root) {
                    self.log.warn(format!(
                        "failed to remove output root '{}' after fatal error: {cleanup_err}",
                        self.config.gen_root.display()
                    ));
                }
                return Err(err);
            }

            let percent = (((index + 1) as f64 / total as f64) * 100.0).round() as u32;
            self.log.info(format!(
                "[{percent:>3}%] {} for {}",
                task.proto_file, task.language.pretty
            ));
        }

        Ok(())
    }

    fn run_task(&self, task: &GenerationTask, prepared: &mut HashSet<PathBuf>) -> Result<()> {
        let abs_proto = self.config.proto_root.join(&task.proto_file);
        if !abs_proto.exists() {
            return Err(HerdError::MissingSource {
                file: PathBuf::from(&task.proto_file),
                root: self.config.proto_root.clone(),
            });
        }

        if !prepared.contains(&task.out_dir) {
            recreate_dir(&task.out_dir)?;
            prepared.insert(task.out_dir.clone());
        }

        let protoc = self.config.programs_root.join(exec_name("protoc"));
        let args = self.build_args(task, &abs_proto)?;

        self.log
            .verbose(1, format!(">> {} {}", protoc.display(), args.join(" ")));

        let status = Command::new(&protoc).args(&args).status().map_err(|source| {
            HerdError::GeneratorFailed {
                file: PathBuf::from(&task.proto_file),
                language: task.language.id.to_string(),
                message: format!("failed to run '{}'", protoc.display()),
                source: Some(source),
            }
        })?;

        if !status.success() {
            return Err(HerdError::GeneratorFailed {
                file: PathBuf::from(&task.proto_file),
                language: task.language.id.to_string(),
                message: format!("generator terminated with {status}"),
                source: None,
            });
        }

        Ok(())
    }

    /// Builds the protoc argument vector for one task.
    ///
    /// The include path points at the source file's own directory, not the
    /// proto root: the C++ generator resolves includes against the exact
    /// file location, so the root alone is not enough for nested sources.
    pub fn build_args(&self, task: &GenerationTask, abs_proto: &Path) -> Result<Vec<String>> {
        let include_dir = abs_proto
            .parent()
            .unwrap_or(&self.config.proto_root)
            .to_path_buf();

        let plugin_path = self
            .config
            .programs_root
            .join(exec_name(task.language.plugin));

        let out_dir = path_str(&task.out_dir)?;
        let mut args = vec![format!("-I={}", path_str(&include_dir)?)];

        match task.language.transport {
            TransportStyle::Folded => {
                args.push(format!("--plugin={}", path_str(&plugin_path)?));
                if self.config.transport {
                    args.push(format!("--{}_out=plugins=grpc:{out_dir}", task.language.id));
                } else {
                    args.push(format!("--{}_out={out_dir}", task.language.id));
                }
            }
            TransportStyle::SeparatePlugin => {
                args.push(format!("--{}_out={out_dir}", task.language.id));
                if self.config.transport {
                    args.push(format!("--plugin=protoc-gen-grpc={}", path_str(&plugin_path)?));
                    args.push(format!("--grpc_out={out_dir}"));
                }
            }
        }

        args.push(path_str(abs_proto)?);
        Ok(args)
    }
}

/// Delete-then-create an output directory, leaving it empty.
fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|source| HerdError::IoError {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::create_dir_all(dir).map_err(|source| HerdError::IoError {
        path: dir.to_path_buf(),
        source,
    })
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| HerdError::InvalidUtf8Path(path.to_path_buf()))
}
