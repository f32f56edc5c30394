//! Error types for protoc-herd.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! is [`HerdError`]: a `thiserror` enum with `miette` diagnostics so the CLI
//! can render a one-line cause with a code and a help hint.
//!
//! Two classes of condition deliberately never appear here: a configured
//! language with no registered plugin (warned and skipped per language), and
//! corrupt or absent digest/fingerprint state (treated as "everything
//! changed"). Both are absorbed at their component boundary.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur while driving code generation.
#[derive(Error, Debug, Diagnostic)]
pub enum HerdError {
    /// The configuration document does not exist at the expected path.
    #[error("Config file '{0}' does not exist")]
    #[diagnostic(
        code(protoc_herd::config::not_found),
        help("Create a protoc-herd.toml in the working directory or pass --config.")
    )]
    ConfigNotFound(PathBuf),

    /// The configuration document exists but is not valid TOML.
    #[error("Failed to parse config file '{path}'")]
    #[diagnostic(code(protoc_herd::config::parse_error))]
    ConfigParse {
        /// The config file that failed to parse
        path: PathBuf,
        /// The underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// The configured proto root is missing or not a directory.
    ///
    /// Checked before any state is read or written, so a typo in
    /// `proto_root` cannot clobber digests or generated output.
    #[error("proto_root '{0}' is not a valid directory")]
    #[diagnostic(
        code(protoc_herd::config::proto_root_invalid),
        help("Set proto_root to the directory containing your .proto files.")
    )]
    ProtoRootInvalid(PathBuf),

    /// The directory holding protoc and its plugins is missing.
    #[error("programs_root '{0}' is not a valid directory")]
    #[diagnostic(
        code(protoc_herd::config::programs_root_invalid),
        help("Set programs_root to the directory containing protoc and its per-language plugins.")
    )]
    ProgramsRootInvalid(PathBuf),

    /// A planned source file vanished between snapshot and execution.
    #[error("'{file}' does not exist in '{root}'")]
    #[diagnostic(code(protoc_herd::task::missing_source))]
    MissingSource {
        /// The relative proto file path
        file: PathBuf,
        /// The proto root it was expected under
        root: PathBuf,
    },

    /// The external generator could not be spawned or exited abnormally.
    ///
    /// Always fatal for the whole run: the executor deletes the entire
    /// output root so the tree is never a mix of fresh and stale artifacts,
    /// and the digest is left at its last known-good state.
    #[error("Code generation failed for '{file}' ({language}): {message}")]
    #[diagnostic(
        code(protoc_herd::task::generator_failed),
        help(
            "The output directory was removed to keep the generated tree consistent. Fix the \
             cause and rerun; every task is safe to redo from scratch."
        )
    )]
    GeneratorFailed {
        /// The relative proto file the task was generating for
        file: PathBuf,
        /// The target language id
        language: String,
        /// What went wrong with the invocation
        message: String,
        /// The spawn error, when the process could not start at all
        #[source]
        source: Option<std::io::Error>,
    },

    /// File system I/O failure during driver operations.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(protoc_herd::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Attempted to hash a non-regular file (symlink or directory).
    #[error("Invalid file type for '{path}': {message}")]
    #[diagnostic(code(protoc_herd::file::invalid_type))]
    InvalidFileType {
        /// The path of the invalid file
        path: PathBuf,
        /// Description of the file type issue
        message: String,
    },

    /// A tracked path is not valid UTF-8.
    ///
    /// Digest keys and synthetic output paths are derived from the path as
    /// a string, so non-UTF-8 proto paths cannot be tracked.
    #[error("Invalid UTF-8 in path: {0}")]
    #[diagnostic(
        code(protoc_herd::path::invalid_utf8),
        help("Rename the file so its path is valid UTF-8.")
    )]
    InvalidUtf8Path(PathBuf),

    /// Failed to serialize digest or fingerprint state to JSON.
    #[error("Failed to serialize state for '{path}'")]
    #[diagnostic(code(protoc_herd::state::serialization_error))]
    SerializationError {
        /// The state file being written
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, HerdError>;
