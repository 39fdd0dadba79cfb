//! Bullpen CLI entry point.

use clap::Parser;

use bullpen::cli::{Cli, Commands};
use bullpen::infrastructure::{config::ConfigLoader, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    logging::init(&config.logging);

    let result = match cli.command {
        Commands::Run(args) => bullpen::cli::commands::run::execute(args, &config).await,
        Commands::Doctor => bullpen::cli::commands::doctor::execute(&config).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
