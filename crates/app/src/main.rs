mod session;

use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use follow_me_core::{FileStorage, Frame, Trainer};
use tracing_subscriber::EnvFilter;

use crate::session::{ConsoleNarrator, Pace, Session, TracedHaptics};

fn main() -> follow_me_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let storage = FileStorage::open(&cli.data_dir)?;
    tracing::debug!(data_dir = ?cli.data_dir, "storage opened");

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => run_session(storage, cli.instant),
        Commands::Show => {
            print!("{}", Frame::capture(&Trainer::load(storage)));
            Ok(())
        }
        Commands::RestoreDefaults => {
            Trainer::load(storage).restore_defaults();
            tracing::info!("settings and sequences restored to defaults");
            Ok(())
        }
    }
}

fn run_session(storage: FileStorage, instant: bool) -> follow_me_core::Result<()> {
    let trainer = Trainer::load(storage)
        .with_narrator(ConsoleNarrator)
        .with_haptics(TracedHaptics);
    let pace = if instant { Pace::Instant } else { Pace::RealTime };
    tracing::info!(mode = %trainer.mode(), ?pace, "starting session");

    Session::new(trainer, pace).run(io::stdin().lock())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Sequence memorization trainer", long_about = None)]
struct Cli {
    /// Directory holding the persisted settings and sequences.
    #[arg(long, default_value = ".follow-me")]
    data_dir: PathBuf,
    /// Run timers without waiting in real time.
    #[arg(long)]
    instant: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read commands from stdin and play sequences back (default).
    Session,
    /// Print the active mode as it was last saved.
    Show,
    /// Wipe saved settings and sequences.
    RestoreDefaults,
}
