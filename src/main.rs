mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    multisuite::logger::init_logger();

    let cli = Cli::parse();
    let code = cli::run(cli)?;
    std::process::exit(code);
}
