use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use tracing::{debug, error};

use super::FailurePolicy;
use crate::git::CommitExecutor;
use crate::schedule::CommitPlan;

/// Commits still missing on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub date: NaiveDate,
    /// Commits already on the branch for this date.
    pub have: u32,
    /// Commits the plan asks for.
    pub want: u32,
}

impl Pending {
    pub fn missing(&self) -> u32 {
        self.want.saturating_sub(self.have)
    }
}

/// Compare the plan with what the branch already holds. Dates that are
/// already complete are counted as skipped.
pub fn reconcile(plan: &CommitPlan, existing: &BTreeMap<NaiveDate, u32>) -> (Vec<Pending>, usize) {
    let mut pending = Vec::new();
    let mut skipped = 0;
    for entry in plan.entries() {
        let have = existing.get(&entry.date).copied().unwrap_or(0);
        if have >= entry.count {
            skipped += 1;
        } else {
            pending.push(Pending {
                date: entry.date,
                have,
                want: entry.count,
            });
        }
    }
    (pending, skipped)
}

/// Timestamps for commits: a fixed time of day in a fixed offset, the n-th
/// commit of a date `n` minutes after the first. A stamp never leaves its date.
#[derive(Debug, Clone, Copy)]
pub struct Stamp {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl Stamp {
    pub fn at(&self, date: NaiveDate, n: u32) -> Result<DateTime<FixedOffset>> {
        let local = date.and_time(self.time) + Duration::minutes(i64::from(n));
        if local.date() != date {
            bail!("commit {} of {} would fall on {}", n + 1, date, local.date());
        }
        local
            .and_local_timezone(self.offset)
            .single()
            .with_context(|| format!("{} has no unique time in {}", local, self.offset))
    }
}

pub fn message(date: NaiveDate, n: u32, count: u32) -> String {
    format!("Art pixel {} ({}/{})", date, n + 1, count)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Dates whose missing commits were all created, in plan order.
    pub succeeded: Vec<NaiveDate>,
    pub commits: u64,
    /// Dates already complete before the run.
    pub skipped: usize,
    pub failed: Vec<(NaiveDate, String)>,
    /// Execution stopped early under [`FailurePolicy::Abort`].
    pub aborted: bool,
}

/// Create the missing commits in plan order.
///
/// A failed commit ends work on its date; under [`FailurePolicy::Abort`]
/// it also ends the run.
pub fn execute<E: CommitExecutor + ?Sized>(
    exec: &mut E,
    pending: &[Pending],
    stamp: &Stamp,
    policy: FailurePolicy,
    pb: &ProgressBar,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for p in pending {
        pb.set_message(p.date.to_string());
        let mut failure = None;
        for n in p.have..p.want {
            let res = stamp
                .at(p.date, n)
                .and_then(|at| exec.commit(at, &message(p.date, n, p.want)));
            match res {
                Ok(id) => {
                    debug!(date = %p.date, commit = %id, "committed");
                    report.commits += 1;
                }
                Err(e) => {
                    failure = Some(format!("{:#}", e));
                    break;
                }
            }
        }
        pb.inc(1);

        match failure {
            None => report.succeeded.push(p.date),
            Some(msg) => {
                error!(date = %p.date, operation = "commit", error = %msg, "commit failed");
                report.failed.push((p.date, msg));
                if policy == FailurePolicy::Abort {
                    report.aborted = true;
                    break;
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CommitTiers, Grid};
    use crate::schedule::{Limits, schedule};
    use anyhow::bail;
    use chrono::Datelike;
    use std::collections::HashSet;

    /// In-memory executor: records commits per date, fails on chosen dates.
    #[derive(Default)]
    struct FakeExecutor {
        commits: Vec<DateTime<FixedOffset>>,
        fail_on: HashSet<NaiveDate>,
    }

    impl CommitExecutor for FakeExecutor {
        fn existing(&self) -> Result<BTreeMap<NaiveDate, u32>> {
            let mut m = BTreeMap::new();
            for c in &self.commits {
                *m.entry(c.date_naive()).or_insert(0) += 1;
            }
            Ok(m)
        }

        fn commit(&mut self, at: DateTime<FixedOffset>, _message: &str) -> Result<String> {
            if self.fail_on.contains(&at.date_naive()) {
                bail!("object store is read-only");
            }
            self.commits.push(at);
            Ok(format!("{:07x}", self.commits.len()))
        }

        fn push(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn stamp() -> Stamp {
        Stamp {
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    /// Sun = level 1, Mon = level 3 in week 0; Sun = level 2 in week 1.
    fn plan() -> CommitPlan {
        let grid = Grid::from_rows(&[vec![1, 2], vec![3, 0]], 2);
        schedule(&grid, d(2024, 1, 7), &CommitTiers::default(), &Limits::until(d(2024, 6, 1)))
            .unwrap()
            .plan
    }

    fn run(exec: &mut FakeExecutor, policy: FailurePolicy) -> ExecutionReport {
        run_at(exec, &stamp(), policy)
    }

    fn run_at(exec: &mut FakeExecutor, stamp: &Stamp, policy: FailurePolicy) -> ExecutionReport {
        let existing = exec.existing().unwrap();
        let (pending, skipped) = reconcile(&plan(), &existing);
        let mut report = execute(exec, &pending, stamp, policy, &ProgressBar::hidden());
        report.skipped = skipped;
        report
    }

    #[test]
    fn all_planned_commits_are_created() {
        let mut ex = FakeExecutor::default();
        let report = run(&mut ex, FailurePolicy::Continue);
        assert_eq!(report.succeeded, vec![d(2024, 1, 7), d(2024, 1, 8), d(2024, 1, 14)]);
        assert_eq!(report.commits, 6);
        assert!(report.failed.is_empty());

        let per_day = ex.existing().unwrap();
        assert_eq!(per_day[&d(2024, 1, 7)], 1);
        assert_eq!(per_day[&d(2024, 1, 8)], 3);
        assert_eq!(per_day[&d(2024, 1, 14)], 2);
        assert!(ex.commits.iter().all(|c| c.weekday().num_days_from_sunday() <= 1));
    }

    #[test]
    fn commits_on_one_date_are_a_minute_apart() {
        let mut ex = FakeExecutor::default();
        run(&mut ex, FailurePolicy::Continue);
        let monday: Vec<String> = ex
            .commits
            .iter()
            .filter(|c| c.date_naive() == d(2024, 1, 8))
            .map(|c| c.format("%H:%M").to_string())
            .collect();
        assert_eq!(monday, vec!["12:00", "12:01", "12:02"]);
    }

    #[test]
    fn rerun_creates_nothing() {
        let mut ex = FakeExecutor::default();
        run(&mut ex, FailurePolicy::Continue);
        let report = run(&mut ex, FailurePolicy::Continue);
        assert_eq!(report.commits, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(ex.commits.len(), 6);
    }

    #[test]
    fn partial_dates_are_topped_up() {
        let mut ex = FakeExecutor::default();
        ex.commits.push(stamp().at(d(2024, 1, 8), 0).unwrap());
        let report = run(&mut ex, FailurePolicy::Continue);
        assert_eq!(report.commits, 5);
        let monday: Vec<_> = ex
            .commits
            .iter()
            .filter(|c| c.date_naive() == d(2024, 1, 8))
            .map(|c| c.format("%H:%M").to_string())
            .collect();
        assert_eq!(monday, vec!["12:00", "12:01", "12:02"]);
    }

    #[test]
    fn continue_policy_keeps_going_after_failure() {
        let mut ex = FakeExecutor {
            fail_on: HashSet::from([d(2024, 1, 8)]),
            ..Default::default()
        };
        let report = run(&mut ex, FailurePolicy::Continue);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, d(2024, 1, 8));
        assert!(report.failed[0].1.contains("read-only"));
        assert_eq!(report.succeeded, vec![d(2024, 1, 7), d(2024, 1, 14)]);
        assert!(!report.aborted);
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let mut ex = FakeExecutor {
            fail_on: HashSet::from([d(2024, 1, 8)]),
            ..Default::default()
        };
        let report = run(&mut ex, FailurePolicy::Abort);
        assert!(report.aborted);
        assert_eq!(report.succeeded, vec![d(2024, 1, 7)]);
        assert_eq!(report.failed.len(), 1);
        assert!(!ex.existing().unwrap().contains_key(&d(2024, 1, 14)));
    }

    #[test]
    fn stamp_uses_the_offset() {
        let s = Stamp {
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            offset: FixedOffset::west_opt(5 * 3600).unwrap(),
        };
        let at = s.at(d(2024, 1, 7), 2).unwrap();
        assert_eq!(at.to_rfc3339(), "2024-01-07T12:02:00-05:00");
    }

    #[test]
    fn stamp_refuses_to_cross_midnight() {
        let s = Stamp {
            time: NaiveTime::from_hms_opt(23, 58, 0).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
        };
        assert!(s.at(d(2024, 1, 8), 1).is_ok());
        assert!(s.at(d(2024, 1, 8), 2).is_err());
    }

    #[test]
    fn late_commit_time_never_spills_into_the_next_day() {
        let late = Stamp {
            time: NaiveTime::from_hms_opt(23, 58, 0).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
        };
        let mut ex = FakeExecutor::default();
        for _ in 0..2 {
            let report = run_at(&mut ex, &late, FailurePolicy::Continue);
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].0, d(2024, 1, 8));
        }
        let per_day = ex.existing().unwrap();
        assert_eq!(per_day[&d(2024, 1, 8)], 2);
        assert!(!per_day.contains_key(&d(2024, 1, 9)));
        assert!(!per_day.contains_key(&d(2024, 1, 15)));
    }
}
