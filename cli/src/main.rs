mod commands;
mod terminal;

use commands::{CommandLine, Commands, monitor, resolve, sweep};
use sonar_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    let cfg: Config = commands.config();
    print::banner(&cfg);

    let result = match commands.command {
        Commands::Sweep(args) => sweep::sweep(args, &cfg).await,
        Commands::Monitor(args) => monitor::monitor(args, &cfg).await,
        Commands::Resolve(args) => resolve::resolve(args, &cfg).await,
    };

    if result.is_ok() && cfg.quiet == 0 {
        print::rule();
    }
    result
}
