//! pgsquash - squash a PostgreSQL migration history into one baseline migration

use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::Cli;
use commands::squash;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.dry_run);

    if let Err(err) = squash::execute(&cli).await {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
