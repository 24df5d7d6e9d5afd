use crate::cmd::Project;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use drip_core::{
    rows::Row,
    types::{ActivityId, CourseId, GroupId, ScheduleForm, ScheduleId},
    ApplyReport, Calendar,
};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Save a schedule and add the selected activities to it
    Update(UpdateArgs),
    /// List saved schedules
    List,
    /// Show one schedule and its selections
    Show { id: ScheduleId },
    /// Show the session rows a schedule produces
    Rows { id: ScheduleId },
    /// Write availability rules for every activity in the schedule
    Apply { id: ScheduleId },
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Course the schedule belongs to
    #[arg(long)]
    course: CourseId,
    /// Read settings from a YAML schedule form; flags below override it
    #[arg(long, value_name = "FILE")]
    form: Option<PathBuf>,
    /// Existing schedule id
    #[arg(long)]
    id: Option<ScheduleId>,
    /// Activity type to schedule (defaults to the configured type)
    #[arg(long = "type", value_name = "TYPE")]
    activity_type: Option<String>,
    /// Activities released together in one session
    #[arg(long = "per-session")]
    per_session: Option<u32>,
    /// Session length in days
    #[arg(long = "length")]
    length_days: Option<u32>,
    /// Start of the first session (RFC 3339 or YYYY-MM-DD in the project zone)
    #[arg(long)]
    start: Option<String>,
    /// Informational end date (defaults to the start)
    #[arg(long)]
    finish: Option<String>,
    /// Keep activities open after their session ends
    #[arg(long)]
    stay_available: bool,
    /// Only schedule activities in this group
    #[arg(long)]
    group: Option<GroupId>,
    /// Report unselected activities as hidden on apply
    #[arg(long)]
    hide_unselected: bool,
    /// Clear the rule of unselected activities on apply
    #[arg(long)]
    reset_unselected: bool,
    /// Show the rule to students before it opens
    #[arg(long)]
    display_disabled: bool,
    /// Activity to select (repeatable: --select 11 --select 12)
    #[arg(long = "select")]
    select: Vec<ActivityId>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    subcmd: ScheduleSubcommand,
    tz: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root, tz)?;
    match subcmd {
        ScheduleSubcommand::Update(args) => update(&project, args, json),
        ScheduleSubcommand::List => list(&project, json),
        ScheduleSubcommand::Show { id } => show(&project, id, json),
        ScheduleSubcommand::Rows { id } => rows(&project, id, json),
        ScheduleSubcommand::Apply { id } => apply(&project, id, json),
    }
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

fn update(project: &Project, args: UpdateArgs, json: bool) -> anyhow::Result<()> {
    let course = args.course;
    let form = build_form(project, args)?;
    let (selections, schedule) = project.release().update(&form, course)?;

    if json {
        let value = serde_json::json!({
            "schedule": schedule,
            "selections": selections,
        });
        return print_json(&value);
    }
    println!(
        "Saved schedule {} ({} selected).",
        schedule.id.unwrap_or_default(),
        selections.len()
    );
    Ok(())
}

fn build_form(project: &Project, args: UpdateArgs) -> anyhow::Result<ScheduleForm> {
    let calendar = &project.calendar;
    let mut form = match &args.form {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_yaml::from_str::<ScheduleForm>(&data)
                .with_context(|| format!("invalid schedule form {}", path.display()))?
        }
        None => {
            let start = args
                .start
                .as_deref()
                .context("--start is required without --form")?;
            let start = parse_instant(start, calendar)?;
            let defaults = &project.config.defaults;
            ScheduleForm {
                id: None,
                activity_type: defaults.activity_type.clone(),
                activities_per_session: defaults.activities_per_session,
                session_length_days: defaults.session_length_days,
                schedule_start: start,
                schedule_finish: start,
                stay_available: false,
                group_filter: None,
                hide_unselected: false,
                reset_unselected: false,
                display_disabled: false,
                activity_group: Default::default(),
            }
        }
    };

    if args.id.is_some() {
        form.id = args.id;
    }
    if let Some(t) = args.activity_type {
        form.activity_type = t;
    }
    if let Some(n) = args.per_session {
        form.activities_per_session = n;
    }
    if let Some(n) = args.length_days {
        form.session_length_days = n;
    }
    if args.form.is_some() {
        if let Some(s) = args.start.as_deref() {
            form.schedule_start = parse_instant(s, calendar)?;
        }
    }
    if let Some(f) = args.finish.as_deref() {
        form.schedule_finish = parse_instant(f, calendar)?;
    }
    if args.group.is_some() {
        form.group_filter = args.group;
    }
    form.stay_available |= args.stay_available;
    form.hide_unselected |= args.hide_unselected;
    form.reset_unselected |= args.reset_unselected;
    form.display_disabled |= args.display_disabled;
    for id in args.select {
        form.select(id);
    }
    Ok(form)
}

/// RFC 3339 instant, or a bare date taken as local midnight.
fn parse_instant(value: &str, calendar: &Calendar) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("'{value}' is neither RFC 3339 nor YYYY-MM-DD"))?;
    Ok(calendar.local_midnight(date))
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(project: &Project, json: bool) -> anyhow::Result<()> {
    let schedules = project.db.list_schedules()?;
    if json {
        return print_json(&schedules);
    }
    if schedules.is_empty() {
        println!("No schedules.");
        return Ok(());
    }
    let rows = schedules
        .iter()
        .map(|s| {
            vec![
                s.id.map(|id| id.to_string()).unwrap_or_default(),
                s.course_id.to_string(),
                s.activity_type.clone(),
                s.activities_per_session.to_string(),
                s.session_length_days.to_string(),
                project.calendar.display(s.schedule_start),
            ]
        })
        .collect();
    print_table(
        &["ID", "COURSE", "TYPE", "PER SESSION", "DAYS", "START"],
        rows,
    );
    Ok(())
}

fn show(project: &Project, id: ScheduleId, json: bool) -> anyhow::Result<()> {
    let release = project.release();
    let schedule = release.schedule(id)?;
    let selections = release.selections(id)?;

    if json {
        let value = serde_json::json!({
            "schedule": schedule,
            "selections": selections,
        });
        return print_json(&value);
    }

    let cal = &project.calendar;
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("Schedule:         {id}");
    println!("Course:           {}", schedule.course_id);
    println!("Type:             {}", schedule.activity_type);
    println!("Per session:      {}", schedule.activities_per_session);
    println!("Session length:   {} day(s)", schedule.session_length_days);
    println!("Start:            {}", cal.display(schedule.schedule_start));
    println!("Finish:           {}", cal.display(schedule.schedule_finish));
    if let Some(g) = schedule.group_filter {
        println!("Group:            {g}");
    }
    println!("Stay available:   {}", yes_no(schedule.stay_available));
    println!("Hide unselected:  {}", yes_no(schedule.hide_unselected));
    println!("Reset unselected: {}", yes_no(schedule.reset_unselected));
    println!("Display disabled: {}", yes_no(schedule.display_disabled));
    let ids: Vec<String> = selections.iter().map(ToString::to_string).collect();
    println!(
        "Selected:         {}",
        if ids.is_empty() {
            "(none)".to_string()
        } else {
            ids.join(", ")
        }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// rows
// ---------------------------------------------------------------------------

fn rows(project: &Project, id: ScheduleId, json: bool) -> anyhow::Result<()> {
    let release = project.release();
    let schedule = release.schedule(id)?;
    let rows = release.build_rows(&schedule)?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No {} activities to schedule.", schedule.activity_type);
        return Ok(());
    }

    let cal = &project.calendar;
    let table = rows
        .iter()
        .map(|row| match row {
            Row::Header(h) => vec![
                String::new(),
                format!("{} {}", h.name, h.window.session_index + 1),
                String::new(),
                cal.display(h.window.start),
                cal.display(h.window.end),
                String::new(),
            ],
            Row::Activity(a) => vec![
                a.activity.id.to_string(),
                format!("  {}", a.activity.name),
                String::from(if a.selected { "x" } else { "" }),
                cal.display(a.window.start),
                cal.display(a.window.end),
                current_summary(&a.current),
            ],
        })
        .collect();
    print_table(&["ID", "NAME", "SEL", "FROM", "TO", "CURRENT"], table);
    Ok(())
}

fn current_summary(current: &drip_core::rule::RuleSummary) -> String {
    match (&current.from, &current.to) {
        (Some(f), Some(t)) => format!("{f} .. {t}"),
        (Some(f), None) => format!("from {f}"),
        (None, Some(t)) => format!("until {t}"),
        (None, None) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

fn apply(project: &Project, id: ScheduleId, json: bool) -> anyhow::Result<()> {
    let release = project.release();
    let schedule = release.schedule(id)?;
    let report: ApplyReport = release.apply_schedule(&schedule)?;

    if json {
        return print_json(&report);
    }
    println!(
        "Applied schedule {id}: {} released, {} reset, {} left unchanged.",
        report.applied.len(),
        report.reset.len(),
        report.left.len()
    );
    if !report.hidden.is_empty() {
        let ids: Vec<String> = report.hidden.iter().map(ToString::to_string).collect();
        println!("Hidden: {}", ids.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_instant_accepts_rfc3339_and_dates() {
        let cal = Calendar::from_name("Europe/London").unwrap();
        assert_eq!(
            parse_instant("2023-01-01T09:00:00Z", &cal).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2023-07-01", &cal).unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 30, 23, 0, 0).unwrap()
        );
        assert!(parse_instant("next tuesday", &cal).is_err());
    }

    #[derive(clap::Parser)]
    struct UpdateCli {
        #[command(flatten)]
        args: UpdateArgs,
    }

    #[test]
    fn every_update_flag_has_help() {
        let cmd = <UpdateCli as clap::CommandFactory>::command();
        for arg in cmd.get_arguments() {
            if arg.get_id().as_str() == "help" {
                continue;
            }
            assert!(arg.get_help().is_some(), "--{} has no help", arg.get_id());
        }
    }

    #[test]
    fn summary_shows_open_ended_rules() {
        let mut s = drip_core::rule::RuleSummary::default();
        assert_eq!(current_summary(&s), "");
        s.from = Some("Fri 1 Jan 2021 00:00".to_string());
        assert_eq!(current_summary(&s), "from Fri 1 Jan 2021 00:00");
    }
}
