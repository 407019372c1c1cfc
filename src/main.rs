//! Provides the main entry point to the program.
use anyhow::Result;
use human_panic::{metadata, setup_panic};
use pathways::cli::run_cli;

fn main() -> Result<()> {
    setup_panic!(metadata!().support("Open an issue on GitHub with the error report attached."));

    run_cli()
}
