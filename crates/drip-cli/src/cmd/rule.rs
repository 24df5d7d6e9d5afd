use crate::cmd::Project;
use crate::output::print_json;
use clap::Subcommand;
use drip_core::{rule, store::RuleField, types::ActivityId};
use std::path::Path;

#[derive(Subcommand)]
pub enum RuleSubcommand {
    /// Summarize an availability rule as from/to dates
    Decode {
        /// Read the stored rule of this activity
        #[arg(long, conflicts_with = "raw")]
        activity: Option<ActivityId>,
        /// Raw rule JSON
        raw: Option<String>,
    },
}

pub fn run(
    root: &Path,
    subcmd: RuleSubcommand,
    tz: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root, tz)?;
    match subcmd {
        RuleSubcommand::Decode { activity, raw } => {
            let raw = match activity {
                Some(id) => project.catalog.read(id)?,
                None => raw,
            };
            let summary = rule::decode(raw.as_deref(), &project.calendar);
            if json {
                return print_json(&summary);
            }
            if summary.is_empty() {
                println!("No date restrictions.");
                return Ok(());
            }
            if let Some(from) = &summary.from {
                println!("From:  {from}");
            }
            if let Some(to) = &summary.to {
                println!("Until: {to}");
            }
            Ok(())
        }
    }
}
