use clap::Parser;
use tracing_subscriber::EnvFilter;

mod calling;
mod cli;
mod core;
mod evidence;
mod extract;
mod parsing;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("prophage_scan=debug,info")
    } else {
        EnvFilter::new("prophage_scan=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Scan(args) => {
            cli::scan::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Config(args) => {
            cli::config::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
