//! Pattern-to-commit scheduling.
//!
//! Maps each active grid cell to a calendar date: column `w`, row `d` lands on
//! `start + 7*w + d`, where `start` is the Sunday heading column 0. The level
//! of the cell picks a commit count through [`CommitTiers`]. Nothing here does
//! I/O; the same inputs always produce the same [`Schedule`].

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use std::fmt;

use crate::grid::{CommitTiers, DAYS, Grid};

/// One date of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub date: NaiveDate,
    pub count: u32,
    pub week: usize,
    pub day: usize,
    pub level: u8,
}

/// Dates to commit on, chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPlan {
    entries: Vec<PlanEntry>,
}

impl CommitPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_commits(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.count)).sum()
    }

    /// First and last date, if any.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.entries.first()?.date, self.entries.last()?.date))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// After the day the plan was made for.
    Future,
    /// Before 1970-01-01; git cannot represent it.
    BeforeEpoch,
    /// Before the account existed.
    BeforeAccount(NaiveDate),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Future => f.write_str("in the future"),
            DropReason::BeforeEpoch => f.write_str("before the git epoch (1970-01-01)"),
            DropReason::BeforeAccount(created) => {
                write!(f, "before the account was created ({})", created)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedCell {
    pub week: usize,
    pub day: usize,
    pub date: NaiveDate,
    pub reason: DropReason,
}

/// Bounds a plan must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Latest date allowed (inclusive).
    pub today: NaiveDate,
    /// Earliest date allowed (inclusive), typically the account creation day.
    pub not_before: Option<NaiveDate>,
}

impl Limits {
    pub fn until(today: NaiveDate) -> Self {
        Self {
            today,
            not_before: None,
        }
    }

    fn check(&self, date: NaiveDate) -> Option<DropReason> {
        if date > self.today {
            return Some(DropReason::Future);
        }
        if date < git_epoch() {
            return Some(DropReason::BeforeEpoch);
        }
        match self.not_before {
            Some(created) if date < created => Some(DropReason::BeforeAccount(created)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub plan: CommitPlan,
    pub dropped: Vec<DroppedCell>,
}

impl Schedule {
    /// Cells dropped because their date has not happened yet.
    pub fn future(&self) -> impl Iterator<Item = &DroppedCell> {
        self.dropped.iter().filter(|d| d.reason == DropReason::Future)
    }

    /// Cells dropped because their date can never be valid for this account.
    pub fn invalid(&self) -> impl Iterator<Item = &DroppedCell> {
        self.dropped.iter().filter(|d| d.reason != DropReason::Future)
    }
}

pub fn git_epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// The Sunday on or before `date`.
pub fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday();
    date - Days::new(u64::from(back))
}

/// Start Sunday for a pattern `weeks` wide that ends before the current week,
/// shifted `offset_weeks` further into the past.
pub fn default_start(today: NaiveDate, weeks: usize, offset_weeks: usize) -> Result<NaiveDate> {
    let anchor = weeks
        .checked_add(offset_weeks)
        .and_then(|w| u64::try_from(w).ok())
        .and_then(|w| w.checked_mul(7))
        .and_then(|back| today.checked_sub_days(Days::new(back)))
        .with_context(|| {
            format!("{} weeks plus an offset of {} reach past the calendar", weeks, offset_weeks)
        })?;
    Ok(sunday_on_or_before(anchor))
}

/// Compute the commit plan for `grid` anchored at `start`.
///
/// `start` must be a Sunday. Cells whose date falls outside `limits` are
/// left out of the plan and listed in [`Schedule::dropped`].
pub fn schedule(
    grid: &Grid,
    start: NaiveDate,
    tiers: &CommitTiers,
    limits: &Limits,
) -> Result<Schedule> {
    if start.weekday() != Weekday::Sun {
        bail!(
            "start date {} is a {}, expected a Sunday (try {})",
            start,
            start.weekday(),
            sunday_on_or_before(start)
        );
    }

    let mut entries = Vec::with_capacity(grid.active_count());
    let mut dropped = Vec::new();

    for (week, day, level) in grid.active_cells() {
        let offset = (week * DAYS + day) as u64;
        let date = start
            .checked_add_days(Days::new(offset))
            .with_context(|| format!("week {} day {} is out of the calendar range", week, day))?;

        match limits.check(date) {
            Some(reason) => dropped.push(DroppedCell {
                week,
                day,
                date,
                reason,
            }),
            None => entries.push(PlanEntry {
                date,
                count: tiers.count(level),
                week,
                day,
                level,
            }),
        }
    }

    Ok(Schedule {
        plan: CommitPlan { entries },
        dropped,
    })
}
