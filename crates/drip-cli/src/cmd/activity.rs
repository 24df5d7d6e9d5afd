use crate::cmd::Project;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use drip_core::{
    store::ActivityRepository,
    types::{Activity, ActivityId, CourseId, GroupId},
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// Add an activity to the catalog (replaces one with the same id)
    Add {
        id: ActivityId,
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        course: CourseId,
        /// Activity type (defaults to the configured type)
        #[arg(long = "type", value_name = "TYPE")]
        activity_type: Option<String>,
        /// 0-based position within the course
        #[arg(long)]
        order: u32,
        /// Number of questions, when the type has them
        #[arg(long)]
        questions: Option<u32>,
        /// Group membership (repeatable: --group 3 --group 4)
        #[arg(long = "group")]
        groups: Vec<GroupId>,
    },
    /// List a course's activities of one type in natural order
    List {
        #[arg(long)]
        course: CourseId,
        #[arg(long = "type", value_name = "TYPE")]
        activity_type: Option<String>,
        /// Only activities in this group
        #[arg(long)]
        group: Option<GroupId>,
    },
    /// Show the activity types present in a course
    Types {
        #[arg(long)]
        course: CourseId,
    },
}

pub fn run(
    root: &Path,
    subcmd: ActivitySubcommand,
    tz: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root, tz)?;
    match subcmd {
        ActivitySubcommand::Add {
            id,
            name,
            course,
            activity_type,
            order,
            questions,
            groups,
        } => {
            let activity_type =
                activity_type.unwrap_or_else(|| project.config.defaults.activity_type.clone());
            let mut activity = Activity::new(id, name, course, activity_type, order);
            activity.question_count = questions;
            activity.groups = groups;
            add(&project, activity, json)
        }
        ActivitySubcommand::List {
            course,
            activity_type,
            group,
        } => {
            let activity_type =
                activity_type.unwrap_or_else(|| project.config.defaults.activity_type.clone());
            list(&project, course, &activity_type, group, json)
        }
        ActivitySubcommand::Types { course } => types(&project, course, json),
    }
}

fn add(project: &Project, activity: Activity, json: bool) -> anyhow::Result<()> {
    project.catalog.upsert_activity(activity.clone())?;
    if json {
        print_json(&activity)?;
    } else {
        println!("Added activity {} '{}'.", activity.id, activity.name);
    }
    Ok(())
}

fn list(
    project: &Project,
    course: CourseId,
    activity_type: &str,
    group: Option<GroupId>,
    json: bool,
) -> anyhow::Result<()> {
    let activities = project
        .catalog
        .list_activities(course, activity_type, group)?;

    if json {
        return print_json(&activities);
    }
    if activities.is_empty() {
        println!("No {activity_type} activities in course {course}.");
        return Ok(());
    }
    let rows = activities
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.natural_order_index.to_string(),
                a.name.clone(),
                a.question_count.map(|q| q.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "ORDER", "NAME", "QUESTIONS"], rows);
    Ok(())
}

fn types(project: &Project, course: CourseId, json: bool) -> anyhow::Result<()> {
    let types = project.release().activity_types(course)?;
    if json {
        return print_json(&types);
    }
    let rows = types
        .values()
        .map(|t| vec![t.name.clone(), t.count.to_string()])
        .collect();
    print_table(&["TYPE", "COUNT"], rows);
    Ok(())
}
