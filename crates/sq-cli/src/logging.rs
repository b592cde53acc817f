//! Log output for the CLI.
//!
//! Every record is one line on stdout, `[LEVEL] message`. In a dry run
//! non-error lines carry a `[DRY-RUN] ` prefix. `RUST_LOG` overrides the
//! level chosen by `--verbose`.

use env_logger::fmt::style::{AnsiColor, Style};
use log::{Level, LevelFilter};
use std::io::Write;

const DRY_RUN_STYLE: Style = AnsiColor::Yellow.on_default().bold();

/// Install the global logger. Safe to call more than once.
pub fn init(verbose: bool, dry_run: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(move |buf, record| {
            if dry_run && record.level() != Level::Error {
                write!(buf, "{DRY_RUN_STYLE}[DRY-RUN]{DRY_RUN_STYLE:#} ")?;
            }
            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{level_style}[{}]{level_style:#} {}",
                record.level(),
                record.args()
            )
        });

    let _ = builder.try_init();
}
