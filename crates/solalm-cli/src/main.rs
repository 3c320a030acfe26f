mod commands;
mod opts;
mod output;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::donate::DonateArgs;
use opts::GlobalOpts;

#[derive(Parser, Debug)]
#[command(
    name = "solalm",
    version,
    about = "Donate, receive an illustrated verse, climb the leaderboard"
)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the donation address, presets and local configuration
    Info,

    /// Print the featured verse, refreshing it when stale
    Featured,

    /// Make one donation and receive an illustrated verse
    Donate(DonateArgs),

    /// Mint a contributor address
    Connect,

    /// Interactive session with the background verse refresh running
    Run,
}

fn main() -> Result<()> {
    // Before the runtime exists so no other thread can observe the environment.
    util::load_dotenv()?;

    let cli = Cli::parse();
    util::init_logging(cli.opts.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let opts = &cli.opts;
    match cli.command {
        Command::Info => commands::info::cmd_info(opts),
        Command::Featured => commands::featured::cmd_featured(opts).await,
        Command::Donate(args) => commands::donate::cmd_donate(opts, &args).await,
        Command::Connect => commands::connect::cmd_connect(opts),
        Command::Run => commands::run::cmd_run(opts).await,
    }
}
