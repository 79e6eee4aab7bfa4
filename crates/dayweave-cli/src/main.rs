use clap::{CommandFactory, Parser, Subcommand};
use dayweave_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayweave", version, about = "Plan your day around your calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Free time of a day
    Slots(commands::slots::SlotsArgs),
    /// Place tasks into free time
    Plan(commands::plan::PlanArgs),
    /// Display geometry of a day
    Layout(commands::layout::LayoutArgs),
    /// Drag a stored proposal to a new time
    Move(commands::move_item::MoveArgs),
    /// Stored proposals
    Proposals {
        #[command(subcommand)]
        action: commands::proposals::ProposalsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Log to stderr. `DAYWEAVE_LOG` wins over the configured level.
fn init_logging() {
    let level = std::env::var("DAYWEAVE_LOG")
        .ok()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| Config::load_or_default().logging.level);

    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| {
        eprintln!("Warning: Unknown log level '{level}', defaulting to warn");
        EnvFilter::new("warn")
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Slots(args) => commands::slots::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Layout(args) => commands::layout::run(args),
        Commands::Move(args) => commands::move_item::run(args),
        Commands::Proposals { action } => commands::proposals::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "dayweave", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
