//! # protoc-herd
//!
//! An incremental code-generation driver for protobuf/gRPC: given a tree of
//! `.proto` files, it determines which files (or which target languages)
//! are stale relative to the previous run, regenerates only the stale
//! outputs by invoking protoc with per-language plugins, and persists
//! content-hash state so the next run is just as incremental.
//!
//! ## How staleness is decided
//!
//! Two independent signals are OR-combined per (language, file) pair:
//!
//! - **Content digest**: a BLAKE3 hash per matching source file, persisted
//!   as JSON beside the proto root. A byte-level change makes the file
//!   stale for every language.
//! - **Output presence**: the expected output directory (or, for Java's
//!   flat layout, the expected generated file name anywhere under the
//!   language subtree). Deleting generated output by hand makes the source
//!   stale for that language even though its digest is unchanged.
//!
//! Two global signals upgrade everything: an explicit force flag, and a
//! fingerprint change of the configuration document itself (toggling a
//! generation option invalidates all prior output without any source byte
//! changing).
//!
//! ## Failure discipline
//!
//! Any generator failure deletes the entire output root and aborts without
//! persisting the new digest: the generated tree is either entirely
//! trustworthy or entirely absent, and the next run replans from the last
//! known-good state. Corrupt cached state is never fatal; it merely makes
//! everything look changed.
//!
//! ## Architecture
//!
//! - [`cli`]: command-line definitions using clap
//! - [`config`]: the TOML configuration document and its resolution
//! - [`driver`]: run orchestration
//! - [`error`]: error types with thiserror + miette
//! - [`digest`]: content digest store (snapshot / load / diff / persist)
//! - [`fingerprint`]: configuration fingerprint
//! - [`language`]: per-language capability descriptors
//! - [`plan`]: staleness predicates and build-plan computation
//! - [`executor`]: protoc invocation and fatal-cleanup discipline
//! - [`normalize`]: C++ `.cc` → `.hpp` post-pass
//!
//! Execution is single-threaded and sequential by design (one blocking
//! protoc process at a time); only the rehashing of the source tree runs in
//! parallel. Task output directories are mutually exclusive, so parallel
//! task execution is a possible extension, not a correctness requirement.

pub mod cli;
pub mod config;
pub mod digest;
pub mod driver;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod language;
pub mod normalize;
pub mod plan;

mod hashing;
mod logging;

pub use logging::Logger;
