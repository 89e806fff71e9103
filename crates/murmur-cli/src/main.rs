//! The murmur binary: a learning chatterbot over a concept network.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod bot;
mod config;
mod repl;

use bot::Bot;
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "murmur", version, about = "A learning, associating chatterbot")]
struct Args {
    /// Name of the utterer.
    #[arg(short = 'p', long)]
    person: Option<String>,

    /// Name of the bot.
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Directory holding the network snapshot and the state files.
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Seed the random generator for a reproducible session.
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level.
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(person) = args.person {
        config.username = person;
    }
    if let Some(name) = args.name {
        config.bot_name = name;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut bot = match args.seed {
        Some(seed) => Bot::with_seed(&config, seed),
        None => Bot::new(&config),
    };
    bot.load(&config.data_dir)?;

    repl::run(&mut bot, &config.data_dir)
}
