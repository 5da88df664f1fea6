//! nbs-cli - select observation stations near a point and assemble their
//! cleaned time series.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "nbs-cli",
    version,
    about = "Nearby observation stations toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: nbs_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    nbs_cmd::run(cli.command)
}
