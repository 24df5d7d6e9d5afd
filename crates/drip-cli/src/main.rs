mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    activity::ActivitySubcommand, config::ConfigSubcommand, rule::RuleSubcommand,
    schedule::ScheduleSubcommand, selection::SelectionSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "drip",
    about = "Drip-feed release scheduling: open course activities in timed sessions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .drip/)
    #[arg(long, global = true, env = "DRIP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// IANA time zone for day arithmetic and display (overrides config)
    #[arg(long, global = true, env = "DRIP_TZ")]
    tz: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a drip project in the current directory
    Init,

    /// Manage the activity catalog
    Activity {
        #[command(subcommand)]
        subcommand: ActivitySubcommand,
    },

    /// Save, inspect and apply release schedules
    Schedule {
        #[command(subcommand)]
        subcommand: ScheduleSubcommand,
    },

    /// Inspect and edit a schedule's selected activities
    Selection {
        #[command(subcommand)]
        subcommand: SelectionSubcommand,
    },

    /// Work with stored availability rules
    Rule {
        #[command(subcommand)]
        subcommand: RuleSubcommand,
    },

    /// Validate or show the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let tz = cli.tz.as_deref();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, tz),
        Commands::Activity { subcommand } => cmd::activity::run(&root, subcommand, tz, cli.json),
        Commands::Schedule { subcommand } => cmd::schedule::run(&root, subcommand, tz, cli.json),
        Commands::Selection { subcommand } => {
            cmd::selection::run(&root, subcommand, tz, cli.json)
        }
        Commands::Rule { subcommand } => cmd::rule::run(&root, subcommand, tz, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
