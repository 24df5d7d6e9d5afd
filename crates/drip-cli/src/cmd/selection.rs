use crate::cmd::Project;
use crate::output::print_json;
use clap::Subcommand;
use drip_core::types::{ActivityId, ScheduleId};
use std::path::Path;

#[derive(Subcommand)]
pub enum SelectionSubcommand {
    /// List the activities selected for a schedule
    List { schedule: ScheduleId },
    /// Remove one activity from a schedule's selection
    Remove {
        schedule: ScheduleId,
        activity: ActivityId,
    },
}

pub fn run(
    root: &Path,
    subcmd: SelectionSubcommand,
    tz: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root, tz)?;
    let release = project.release();
    match subcmd {
        SelectionSubcommand::List { schedule } => {
            release.schedule(schedule)?;
            let selections = release.selections(schedule)?;
            if json {
                return print_json(&selections);
            }
            if selections.is_empty() {
                println!("No activities selected for schedule {schedule}.");
            }
            for id in selections {
                println!("{id}");
            }
            Ok(())
        }
        SelectionSubcommand::Remove { schedule, activity } => {
            release.schedule(schedule)?;
            let removed = release.remove_selection(schedule, activity)?;
            if json {
                return print_json(&serde_json::json!({
                    "schedule": schedule,
                    "activity": activity,
                    "removed": removed,
                }));
            }
            if removed {
                println!("Removed activity {activity} from schedule {schedule}.");
            } else {
                println!("Activity {activity} was not selected for schedule {schedule}.");
            }
            Ok(())
        }
    }
}
