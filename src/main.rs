use clap::Parser;
use std::time;
use vcfcodec::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{validate, view},
    utils::util::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    log::trace!("CLI options set: {:?}", cli);

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        &**FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Validate(args) => {
            log::trace!("Validate arguments: {:#?}", args);
            validate(args)?
        }
        Command::View(args) => {
            log::trace!("View arguments: {:#?}", args);
            view(args)?
        }
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());

    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
