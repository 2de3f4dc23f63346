use std::path::PathBuf;

use clap::{ArgAction, Parser};

use quickrewind::Config;
use quickrewind::daemon::Daemon;

#[derive(Parser, Debug)]
#[command(name = "quickrewind")]
#[command(version, about = "Retroactive screen recorder with a rolling replay buffer")]
struct Cli {
    /// Run as daemon (SIGUSR1 exports the buffer, SIGUSR2 toggles recording)
    #[arg(long, short = 'd', action = ArgAction::SetTrue)]
    daemon: bool,

    /// Capture for the given number of seconds, export the buffer, and exit
    #[arg(long, value_name = "SECONDS")]
    once: Option<u64>,

    /// Override the configured output folder
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.once.is_some() || cli.daemon {
        let mut config = Config::load()?;
        if let Some(output) = cli.output {
            config.output.folder = output;
        }

        if let Some(seconds) = cli.once {
            log::info!("Starting one-shot capture ({} seconds)", seconds);
            Daemon::new(config).run_once(seconds)
        } else {
            log::info!("Starting in daemon mode");
            Daemon::new(config).run()
        }
    } else {
        // No flags: show usage
        println!("quickrewind: retroactive screen recorder");
        println!();
        println!("Usage:");
        println!("  quickrewind --daemon          Run as background capture service");
        println!("  quickrewind --once <SECONDS>  Capture once, export, and exit");
        println!("  quickrewind --help            Show help");
        println!();
        println!("Daemon mode (recommended):");
        println!("  1. Run: quickrewind --daemon");
        println!("  2. Bind hotkeys to signals, e.g.:");
        println!("     pkill -SIGUSR1 quickrewind   # save the last N seconds as a GIF");
        println!("     pkill -SIGUSR2 quickrewind   # start/stop an active recording");
        println!();
        println!("Configuration:");
        println!("  ~/.config/quickrewind/config.toml");
        Ok(())
    }
}
