use std::cell::Cell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};
use chrono::Weekday;

use crate::availability::editor::{DirtyState, EditorEvent, LoadOutcome, SaveOutcome};
use crate::availability::hours::{HOURS_PER_DAY, to_hour, to_label};
use crate::availability::step::{AvailabilityStep, Navigation, RecordedNavigation};
use crate::availability::week::DAYS_PER_WEEK;

const HELP: &str = "\
Commands:
  show                 print the editable part of the week
  toggle <day> <hour>  flip one slot (day: 0-6 or mon..sun, hour: 9 or 9:00)
  start <hour>         first editable hour
  end <hour>           last editable hour
  save                 store the grid
  reload               drop unsaved changes
  status               summary line
  prev | next          leave the step
  quit                 leave without navigating";

enum Flow {
    Continue,
    Leave(Option<Navigation>),
}

/// Drives the availability step from line commands until the user navigates
/// away, quits, or input ends. Returns the navigation the user chose, if any.
pub fn run_console<R: BufRead, W: Write>(
    step: &mut AvailabilityStep,
    input: R,
    out: &mut W,
) -> Result<Option<Navigation>> {
    let became_dirty = Rc::new(Cell::new(false));
    let flag = Rc::clone(&became_dirty);
    step.subscribe(move |event| {
        if *event == EditorEvent::DirtyChanged(DirtyState::Dirty) {
            flag.set(true);
        }
    });

    writeln!(
        out,
        "Availability for {} | week of {}",
        step.user(),
        step.anchor().format("%a %m/%d/%Y")
    )?;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        let flow = match execute(step, command, out) {
            Ok(flow) => flow,
            Err(err) => {
                writeln!(out, "error: {err:#}")?;
                Flow::Continue
            }
        };
        if became_dirty.replace(false) {
            writeln!(out, "Unsaved changes")?;
        }
        if let Flow::Leave(navigation) = flow {
            return Ok(navigation);
        }
    }

    tracing::debug!(dirty = step.editor().is_dirty(), "console input ended");
    Ok(None)
}

fn execute<W: Write>(step: &mut AvailabilityStep, command: &str, out: &mut W) -> Result<Flow> {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match (verb.as_str(), args.as_slice()) {
        ("help" | "?", []) => writeln!(out, "{HELP}")?,
        ("show", []) => render_grid(step, out)?,
        ("status", []) => writeln!(out, "{}", status_line(step))?,
        ("toggle", [day, hour]) => {
            let day = parse_day(day)?;
            let hour = parse_hour(hour)?;
            let window = step.window();
            if !window.contains(hour) {
                bail!(
                    "{} is outside the editable window {}-{}",
                    to_label(hour),
                    to_label(window.start()),
                    to_label(window.end())
                );
            }
            let value = step.toggle(day, usize::from(hour))?;
            writeln!(
                out,
                "{} {} -> {}",
                step.day_labels()[day],
                to_label(hour),
                if value { "available" } else { "unavailable" }
            )?;
        }
        ("start", [hour]) => {
            step.set_start(parse_hour(hour)?)?;
            writeln!(out, "{}", window_line(step))?;
        }
        ("end", [hour]) => {
            step.set_end(parse_hour(hour)?)?;
            writeln!(out, "{}", window_line(step))?;
        }
        ("save", []) => match step.save() {
            Ok(SaveOutcome::Saved) => writeln!(out, "Saved.")?,
            Ok(SaveOutcome::Skipped) => writeln!(out, "Nothing saved: no user id.")?,
            Err(err) => bail!("save failed: {err}"),
        },
        ("reload", []) => {
            match step.reload()? {
                LoadOutcome::Recovered(err) => {
                    writeln!(out, "Stored availability was unreadable ({err}); starting empty.")?
                }
                LoadOutcome::Loaded | LoadOutcome::Defaulted => {}
            }
            writeln!(out, "Reloaded stored availability.")?;
        }
        ("prev" | "previous", []) => {
            let mut navigator = RecordedNavigation::default();
            step.previous(&mut navigator);
            writeln!(out, "<- previous step")?;
            return Ok(Flow::Leave(navigator.last));
        }
        ("next", []) => {
            let mut navigator = RecordedNavigation::default();
            step.next(&mut navigator);
            writeln!(out, "-> next step")?;
            return Ok(Flow::Leave(navigator.last));
        }
        ("quit" | "exit", []) => return Ok(Flow::Leave(None)),
        _ => bail!("unrecognised command '{command}' (try 'help')"),
    }
    Ok(Flow::Continue)
}

fn render_grid<W: Write>(step: &AvailabilityStep, out: &mut W) -> Result<()> {
    let labels = step.day_labels();
    write!(out, "{:>6}", "")?;
    for label in labels {
        write!(out, " {label:^9}")?;
    }
    writeln!(out)?;

    let editor = step.editor();
    for hour in step.window().hours() {
        write!(out, "{:>6}", to_label(hour))?;
        for day in 0..DAYS_PER_WEEK {
            let mark = if editor.get(day, usize::from(hour))? { "#" } else { "." };
            write!(out, " {mark:^9}")?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", status_line(step))?;
    Ok(())
}

fn status_line(step: &AvailabilityStep) -> String {
    let editor = step.editor();
    format!(
        "user {} | {} | {} slot(s) | {}",
        step.user(),
        window_line(step),
        editor.available_count(),
        match editor.dirty() {
            DirtyState::Clean => "saved",
            DirtyState::Dirty => "unsaved changes",
        }
    )
}

fn window_line(step: &AvailabilityStep) -> String {
    let window = step.window();
    format!(
        "window {}-{}",
        to_label(window.start()),
        to_label(window.end())
    )
}

fn parse_day(token: &str) -> Result<usize> {
    if let Ok(index) = token.parse::<usize>() {
        if index >= DAYS_PER_WEEK {
            bail!("day {index} is outside 0..=6");
        }
        return Ok(index);
    }
    let weekday = token
        .parse::<Weekday>()
        .map_err(|_| anyhow!("invalid day '{token}', expected 0-6 or mon..sun"))?;
    Ok(weekday.num_days_from_monday() as usize)
}

fn parse_hour(token: &str) -> Result<u8> {
    if let Ok(hour) = token.parse::<u8>() {
        if usize::from(hour) >= HOURS_PER_DAY {
            bail!("hour {hour} is outside 0..=23");
        }
        return Ok(hour);
    }
    Ok(to_hour(token)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chrono::NaiveDate;

    use super::*;
    use crate::availability::step::{Mounted, StepSettings};
    use crate::store::{AvailabilityStore, UserId};

    fn step_for(user: &str) -> AvailabilityStep {
        let mut navigator = RecordedNavigation::default();
        let (mounted, _) = AvailabilityStep::mount(
            UserId::parse(Some(user)),
            AvailabilityStore::in_memory(),
            NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
            StepSettings::default(),
            &mut navigator,
        )
        .expect("mount");
        match mounted {
            Mounted::Ready(step) => *step,
            Mounted::Retreated => panic!("user id was present"),
        }
    }

    fn run(step: &mut AvailabilityStep, script: &str) -> (Option<Navigation>, String) {
        let mut out = Vec::new();
        let navigation =
            run_console(step, Cursor::new(script.to_string()), &mut out).expect("session");
        (navigation, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn unsaved_notice_appears_once_per_dirty_period() {
        let mut step = step_for("u1");
        let (navigation, output) = run(
            &mut step,
            "toggle 0 9\ntoggle mon 10:00\nsave\ntoggle tue 9\n",
        );
        assert_eq!(navigation, None);
        assert_eq!(output.matches("Unsaved changes").count(), 2);
        assert!(output.contains("Mon 10/19 9:00 -> available"));
        assert!(output.contains("Tue 10/20 9:00 -> available"));
        assert!(output.contains("Saved."));
        assert!(step.editor().is_dirty());
    }

    #[test]
    fn toggles_outside_window_are_refused() {
        let mut step = step_for("u1");
        let (_, output) = run(&mut step, "toggle 0 6\nstart 6:00\ntoggle 0 6\n");
        assert!(output.contains("error: 6:00 is outside the editable window 7:00-17:00"));
        assert!(output.contains("window 6:00-17:00"));
        assert!(step.editor().get(0, 6).expect("in range"));
    }

    #[test]
    fn inverted_window_is_reported_and_kept() {
        let mut step = step_for("u1");
        let (_, output) = run(&mut step, "end 5:00\nstatus\n");
        assert!(output.contains("error: window start 7:00 would fall after end 5:00"));
        assert!(output.contains("window 7:00-17:00"));
    }

    #[test]
    fn next_leaves_the_session() {
        let mut step = step_for("u1");
        let (navigation, output) = run(&mut step, "next\ntoggle 0 9\n");
        assert_eq!(navigation, Some(Navigation::Advance));
        assert!(output.contains("-> next step"));
        assert_eq!(step.editor().available_count(), 0);
    }

    #[test]
    fn show_prints_only_window_rows() {
        let mut step = step_for("u1");
        let (_, output) = run(&mut step, "start 8\nend 9\ntoggle 2 9\nshow\n");
        let grid_rows: Vec<&str> = output
            .lines()
            .filter(|line| line.trim_start().starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(grid_rows.len(), 2);
        assert!(grid_rows[0].trim_start().starts_with("8:00"));
        assert_eq!(grid_rows[1].matches('#').count(), 1);
        assert!(output.contains("Wed 10/21"));
    }

    #[test]
    fn parses_days_and_hours() {
        assert_eq!(parse_day("0").expect("index"), 0);
        assert_eq!(parse_day("Sun").expect("name"), 6);
        assert_eq!(parse_day("wednesday").expect("long name"), 2);
        assert!(parse_day("7").is_err());
        assert!(parse_day("someday").is_err());

        assert_eq!(parse_hour("23").expect("number"), 23);
        assert_eq!(parse_hour("09:00").expect("label"), 9);
        assert!(parse_hour("24").is_err());
        assert!(parse_hour("9:15").is_err());
    }

    #[test]
    fn unknown_command_keeps_session_alive() {
        let mut step = step_for("u1");
        let (_, output) = run(&mut step, "dance\nstatus\n");
        assert!(output.contains("unrecognised command 'dance'"));
        assert!(output.contains("user u1 | window 7:00-17:00 | 0 slot(s) | saved"));
    }
}
