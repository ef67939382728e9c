//! From command-line flags to a scheduled pattern, shared by `preview` and `push`.

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::error::Failure;
use crate::grid::MAX_WEEKS;
use crate::schedule::{DropReason, DroppedCell, Limits, Schedule, default_start, schedule};
use crate::source::{Overflow, PatternSource, RenderOptions, Rendered, SourceArgs, render};
use crate::template::TemplateStore;

/// Placement flags shared by `preview` and `push`.
#[derive(Debug, Clone, Default, Args)]
pub struct LayoutArgs {
    /// Pattern width in weeks, 1-53 [default: push.weeks from config]
    #[arg(short, long)]
    pub weeks: Option<usize>,

    /// First Sunday of the pattern (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "offset")]
    pub start: Option<NaiveDate>,

    /// Move the default start this many weeks further into the past
    #[arg(long, value_name = "N")]
    pub offset: Option<usize>,

    /// How to fit sources wider than the span [default: scale for images, truncate for text]
    #[arg(long, value_enum)]
    pub overflow: Option<Overflow>,

    /// TrueType font for --text
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PatternArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub layout: LayoutArgs,
}

/// A rendered pattern anchored in the calendar.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub source: PatternSource,
    pub rendered: Rendered,
    pub start: NaiveDate,
    pub schedule: Schedule,
}

impl Prepared {
    /// Re-run the scheduler with tighter limits (e.g. once the account
    /// creation date is known).
    pub fn reschedule(&mut self, cfg: &Config, limits: &Limits) -> Result<()> {
        self.schedule = schedule(&self.rendered.grid, self.start, &cfg.render.commits, limits)
            .context(Failure::Input)?;
        Ok(())
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render the source named by `args` and schedule it within `limits`.
///
/// # Errors
/// Every failure here is a [`Failure::Input`].
pub fn prepare(
    args: &PatternArgs,
    cfg: &Config,
    templates: &TemplateStore,
    limits: &Limits,
) -> Result<Prepared> {
    let source = args.source.source()?;
    let weeks = args.layout.weeks.unwrap_or(cfg.push.weeks);
    if !(1..=MAX_WEEKS).contains(&weeks) {
        return Err(anyhow!(
            "--weeks must be between 1 and {}, got {}",
            MAX_WEEKS,
            weeks
        ))
        .context(Failure::Input);
    }

    let opts = RenderOptions {
        weeks,
        overflow: args.layout.overflow,
        font: args.layout.font.as_deref(),
        render: &cfg.render,
    };
    let rendered = render(&source, &opts, templates)?;

    let start = match args.layout.start {
        Some(d) => d,
        None => default_start(limits.today, weeks, args.layout.offset.unwrap_or(0))
            .context(Failure::Input)?,
    };
    let schedule = schedule(&rendered.grid, start, &cfg.render.commits, limits)
        .context(Failure::Input)?;

    Ok(Prepared {
        source,
        rendered,
        start,
        schedule,
    })
}

/// One line per kind of dropped cell, e.g. "3 cells fall after 2024-05-01",
/// followed by one line per cell when `every_cell` is set.
pub fn drop_report(dropped: &[DroppedCell], today: NaiveDate, every_cell: bool) -> Vec<String> {
    let count = |pred: &dyn Fn(&DropReason) -> bool| {
        let cells: Vec<&DroppedCell> = dropped.iter().filter(|d| pred(&d.reason)).collect();
        (cells.len(), cells.first().map(|d| d.date))
    };

    let mut lines = Vec::new();
    if let (n @ 1.., Some(first)) = count(&|r| *r == DropReason::Future) {
        lines.push(format!(
            "{} cell(s) fall after today ({}), first on {}; they are skipped",
            n, today, first
        ));
    }
    if let (n @ 1.., Some(first)) = count(&|r| *r == DropReason::BeforeEpoch) {
        lines.push(format!(
            "{} cell(s) fall before 1970-01-01, first on {}",
            n, first
        ));
    }
    let created = dropped.iter().find_map(|d| match d.reason {
        DropReason::BeforeAccount(c) => Some(c),
        _ => None,
    });
    if let Some(created) = created
        && let (n @ 1.., Some(first)) = count(&|r| matches!(r, DropReason::BeforeAccount(_)))
    {
        lines.push(format!(
            "{} cell(s) fall before the account was created ({}), first on {}",
            n, created, first
        ));
    }
    if every_cell {
        lines.extend(dropped.iter().map(|d| {
            format!(
                "   dropped {} {} (week {}, day {}): {}",
                d.date,
                d.date.format("%a"),
                d.week + 1,
                d.day + 1,
                d.reason
            )
        }));
    }
    lines
}

/// Print the fit note and the drop report under a preview. Every dropped
/// cell is logged at info level and listed on stdout with `every_cell`.
pub fn print_notes(prepared: &Prepared, today: NaiveDate, every_cell: bool) {
    if let Some(note) = prepared.rendered.fit.describe() {
        println!("{} {}", "note:".yellow(), note);
    }
    for d in &prepared.schedule.dropped {
        info!(date = %d.date, week = d.week, day = d.day, reason = %d.reason, "cell dropped");
    }
    for line in drop_report(&prepared.schedule.dropped, today, every_cell) {
        println!("{} {}", "note:".yellow(), line);
    }
    if let Some((first, last)) = prepared.schedule.plan.span() {
        println!(
            "Plan: {} commits on {} dates, {} to {}",
            prepared.schedule.plan.total_commits(),
            prepared.schedule.plan.len(),
            first,
            last
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn template_args(name: &str) -> PatternArgs {
        PatternArgs {
            source: PatternSource::Template(name.to_string()).into(),
            layout: LayoutArgs::default(),
        }
    }

    #[test]
    fn default_start_places_pattern_in_the_past() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let today = d(2024, 6, 12);
        let p = prepare(&template_args("heart"), &cfg, &store, &Limits::until(today)).unwrap();

        assert_eq!(p.start, d(2023, 6, 11));
        assert!(p.schedule.dropped.is_empty());
        assert_eq!(p.rendered.grid.weeks(), 52);
        let (_, last) = p.schedule.plan.span().unwrap();
        assert!(last < today);
    }

    #[test]
    fn explicit_start_must_be_a_sunday() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let mut args = template_args("heart");
        args.layout.start = Some(d(2024, 1, 8));
        let err = prepare(&args, &cfg, &store, &Limits::until(d(2024, 6, 1))).unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 2);
    }

    #[test]
    fn weeks_out_of_range_is_input_error() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let mut args = template_args("heart");
        args.layout.weeks = Some(60);
        let err = prepare(&args, &cfg, &store, &Limits::until(d(2024, 6, 1))).unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 2);
    }

    #[test]
    fn reschedule_applies_account_creation() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let today = d(2024, 6, 12);
        let args = template_args("diamond");
        let mut p = prepare(&args, &cfg, &store, &Limits::until(today)).unwrap();
        let planned = p.schedule.plan.len();

        let created = d(2023, 6, 20);
        p.reschedule(
            &cfg,
            &Limits {
                today,
                not_before: Some(created),
            },
        )
        .unwrap();
        assert_eq!(p.schedule.plan.len(), planned - 1);
        assert!(p.schedule.invalid().all(|c| c.date < created));

        let report = drop_report(&p.schedule.dropped, today, false);
        assert_eq!(report.len(), 1);
        assert!(report[0].contains("2023-06-20"));
    }

    #[test]
    fn future_cells_are_reported() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let today = d(2024, 1, 10);
        let mut args = template_args("heart");
        args.layout.start = Some(d(2024, 1, 7));
        let p = prepare(&args, &cfg, &store, &Limits::until(today)).unwrap();

        assert!(p.schedule.future().count() > 0);
        let report = drop_report(&p.schedule.dropped, today, false);
        assert!(report[0].contains("after today"));
    }

    #[test]
    fn every_dropped_cell_can_be_listed() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let today = d(2024, 1, 10);
        let mut args = template_args("heart");
        args.layout.start = Some(d(2024, 1, 7));
        let p = prepare(&args, &cfg, &store, &Limits::until(today)).unwrap();

        let dropped = &p.schedule.dropped;
        let report = drop_report(dropped, today, true);
        assert_eq!(report.len(), 1 + dropped.len());
        for (cell, line) in dropped.iter().zip(&report[1..]) {
            assert!(line.contains(&cell.date.to_string()), "{}", line);
            assert!(line.ends_with("in the future"), "{}", line);
        }
    }

    #[test]
    fn huge_offset_is_input_error() {
        let cfg = Config::default();
        let store = TemplateStore::builtin_only();
        let mut args = template_args("heart");
        args.layout.offset = Some(usize::MAX);
        let err = prepare(&args, &cfg, &store, &Limits::until(d(2024, 6, 1))).unwrap_err();
        assert_eq!(crate::error::exit_code_for(&err), 2);
    }
}
