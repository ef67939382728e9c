//! Terminal and PNG previews of a grid.

mod png;

use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};
use clap::Args;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::config::load_config;
use crate::grid::{CommitTiers, DAYS, Grid, GridStats, WEEKDAYS};
use crate::paths::paths;
use crate::pattern::{PatternArgs, prepare, print_notes, today};
use crate::schedule::Limits;
use crate::template::TemplateStore;

pub use png::save_png;

/// GitHub's dark-theme greens, level 0 to 4.
pub const PALETTE: [(u8, u8, u8); 5] = [
    (22, 27, 34),
    (14, 68, 41),
    (0, 109, 50),
    (38, 166, 65),
    (57, 211, 83),
];

const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Truecolor cells, for terminals.
    Color,
    /// Shade characters, for pipes and logs.
    Plain,
}

impl Style {
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Style::Color
        } else {
            Style::Plain
        }
    }
}

fn cell(level: u8, style: Style) -> String {
    let idx = usize::from(level).min(PALETTE.len() - 1);
    match style {
        Style::Color => {
            let (r, g, b) = PALETTE[idx];
            "  ".on_truecolor(r, g, b).to_string()
        }
        Style::Plain => SHADES[idx].to_string().repeat(2),
    }
}

/// Month labels over the columns; a label is placed on the first week that
/// starts in a new month, if it does not collide with the previous one.
pub fn month_header(start: NaiveDate, weeks: usize) -> String {
    let mut line = vec![' '; weeks * 2 + 3];
    let mut last_month = None;
    let mut free_from = 0;
    for week in 0..weeks {
        let Some(week_start) = start.checked_add_days(Days::new(week as u64 * 7)) else {
            break;
        };
        let month = week_start.month0() as usize;
        let pos = week * 2;
        if last_month != Some(month) && pos >= free_from {
            for (i, ch) in MONTHS[month].chars().enumerate() {
                line[pos + i] = ch;
            }
            free_from = pos + 4;
        }
        last_month = Some(month);
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

/// The graph as text: month header, then one line per weekday.
///
/// With `start` the header shows real months; `max_weeks` limits the width.
pub fn render_graph(
    grid: &Grid,
    start: Option<NaiveDate>,
    style: Style,
    max_weeks: Option<usize>,
) -> String {
    let weeks = max_weeks.map_or(grid.weeks(), |m| m.min(grid.weeks()));
    let mut out = String::new();
    if let Some(start) = start {
        out.push_str("    ");
        out.push_str(&month_header(start, weeks));
        out.push('\n');
    }
    for (day, label) in WEEKDAYS.iter().enumerate().take(DAYS) {
        out.push_str(label);
        out.push(' ');
        for week in 0..weeks {
            out.push_str(&cell(grid.get(day, week), style));
        }
        out.push('\n');
    }
    out
}

pub fn render_stats(stats: &GridStats) -> String {
    format!(
        "Statistics:\n   Contribution days: {}\n   Total commits: {}\n   \
         Max daily commits: {}\n   Coverage: {:.1}%\n",
        stats.active_days,
        stats.total_commits,
        stats.max_daily,
        stats.coverage()
    )
}

/// Print the graph and its statistics to stdout.
pub fn print_preview(grid: &Grid, start: NaiveDate, tiers: &CommitTiers) {
    let style = Style::detect();
    match style {
        Style::Color => println!("(GitHub colors)"),
        Style::Plain => println!("(' ' = no activity, '█' = highest activity)"),
    }
    println!();
    print!("{}", render_graph(grid, Some(start), style, None));
    println!();
    print!("{}", render_stats(&grid.stats(tiers)));
}

#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub pattern: PatternArgs,

    /// Also write the graph as a PNG image
    #[arg(long, value_name = "FILE")]
    pub png: Option<PathBuf>,
}

/// Render a pattern and show where it would land, without touching git.
pub fn cmd_preview(args: &PreviewArgs) -> Result<()> {
    let p = paths()?;
    let cfg = load_config(&p.config)?;
    let templates = TemplateStore::load(&p.templates)?;

    let today = today();
    let prepared = prepare(&args.pattern, &cfg, &templates, &Limits::until(today))?;
    println!("Preview of {}, starting {}", prepared.source, prepared.start);
    print_preview(&prepared.rendered.grid, prepared.start, &cfg.render.commits);
    println!();
    print_notes(&prepared, today, true);

    if let Some(out) = &args.png {
        save_png(&prepared.rendered.grid, out)?;
        println!("{} wrote {}", "✔".green(), out.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn plain_graph_has_seven_labelled_rows() {
        let g = Grid::from_rows(&[vec![0, 4], vec![1, 0]], 2);
        let out = render_graph(&g, None, Style::Plain, None);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Sun   ██");
        assert_eq!(lines[1], "Mon ░░  ");
        assert!(lines[6].starts_with("Sat"));
    }

    #[test]
    fn graph_width_can_be_limited() {
        let g = Grid::new(52);
        let out = render_graph(&g, None, Style::Plain, Some(20));
        assert_eq!(out.lines().next().unwrap().chars().count(), 4 + 40);
    }

    #[test]
    fn month_header_marks_month_starts() {
        // 2024-01-07 (Sun): weeks start Jan 7, 14, 21, 28, Feb 4, ...
        let h = month_header(d(2024, 1, 7), 6);
        assert!(h.starts_with("Jan"));
        assert_eq!(h.find("Feb"), Some(8));
    }

    #[test]
    fn month_header_skips_colliding_labels() {
        // Jan 28 then Feb 4: labels would overlap at positions 0 and 2
        let h = month_header(d(2024, 1, 28), 3);
        assert_eq!(h, "Jan");
    }

    #[test]
    fn stats_text_reports_coverage() {
        let g = Grid::from_rows(&[vec![1]], 1);
        let s = render_stats(&g.stats(&CommitTiers::default()));
        assert!(s.contains("Contribution days: 1"));
        assert!(s.contains("Coverage: 14.3%"));
    }
}
