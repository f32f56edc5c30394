//! # protoc-herd CLI
//!
//! Run from (or point `--workdir` at) a directory containing a
//! `protoc-herd.toml` and a proto source tree:
//!
//! ```bash
//! protoc-herd --workdir path/to/project
//! ```
//!
//! Successful runs print per-task progress and an elapsed-time summary;
//! fatal errors (bad roots, generator failures) exit non-zero with a
//! one-line diagnostic naming the offending path or task.
//!
//! ## Environment variables
//!
//! - `PROTOC_HERD_WORKDIR`: working directory (default: `.`)
//! - `PROTOC_HERD_CONFIG`: config document path
//! - `PROTOC_HERD_FORCE` / `PROTOC_HERD_TRANSPORT` / `PROTOC_HERD_WIPE`:
//!   boolean overrides of the matching config options
//! - `PROTOC_HERD_VERBOSE` / `PROTOC_HERD_QUIET`: output control

use std::io::IsTerminal;
use std::time::Instant;

use protoc_herd::cli::Cli;

fn main() -> miette::Result<()> {
    miette::set_panic_hook();

    // Fancy reports on a terminal, plain ones for CI logs.
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let start_time = Instant::now();
    let cli = Cli::parse_args();

    protoc_herd::driver::run(
        &cli.get_workdir(),
        cli.config_path(),
        &cli.overrides(),
        cli.verbose(),
        cli.quiet(),
    )?;

    if !cli.quiet() {
        let elapsed = start_time.elapsed().as_secs_f64();
        eprintln!("Build done in {elapsed:.3} s");
    }

    Ok(())
}
