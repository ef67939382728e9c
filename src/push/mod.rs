mod execute;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, Offset};
use clap::{Args, ValueEnum};
use colored::Colorize;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use indicatif::ProgressBar;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{Config, load_config};
use crate::credentials::{KeyringStore, TokenStore, resolve_token};
use crate::error::Failure;
use crate::git::{CommitExecutor, Git2Executor, resolve_author};
use crate::github::GitHub;
use crate::paths::{Paths, paths, work_dir_for};
use crate::pattern::{PatternArgs, Prepared, prepare, print_notes, today};
use crate::preview::print_preview;
use crate::progress::{bar_style, err_style, ok_style, spinner_style};
use crate::schedule::{CommitPlan, Limits, Schedule};
use crate::template::TemplateStore;

pub use execute::{ExecutionReport, Pending, Stamp, execute, message, reconcile};

/// What to do when a commit fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and move on to the next date.
    #[default]
    Continue,
    /// Stop at the first failure and do not push.
    Abort,
}

#[derive(Debug, Clone, Args)]
pub struct PushArgs {
    #[command(flatten)]
    pub pattern: PatternArgs,

    /// Target repository
    #[arg(short, long, value_name = "OWNER/NAME")]
    pub repo: String,

    /// Branch to commit to [default: push.branch from config]
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Print the plan and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Failure policy [default: push.on_failure from config]
    #[arg(long, value_enum)]
    pub on_failure: Option<FailurePolicy>,

    /// Remote URL instead of the GitHub one
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// Stored account whose token to use
    #[arg(long)]
    pub account: Option<String>,
}

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9-]*)/([A-Za-z0-9._-]+)$").unwrap());

/// Split `owner/name`.
pub fn parse_slug(slug: &str) -> Result<(&str, &str)> {
    SLUG.captures(slug)
        .and_then(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .filter(|(_, name)| *name != "." && *name != "..")
        .ok_or_else(|| anyhow!("invalid repository {:?}, expected OWNER/NAME", slug))
        .context(Failure::Input)
}

/// HTTPS when a token is available, SSH otherwise.
pub fn remote_url(host: &str, slug: &str, with_token: bool) -> String {
    if with_token {
        format!("https://{}/{}.git", host, slug)
    } else {
        format!("git@{}:{}.git", host, slug)
    }
}

fn print_plan(schedule: &Schedule) {
    println!("{}", "Dry run, planned commits:".bold());
    for e in schedule.plan.entries() {
        println!("   {} {}  x{}", e.date, e.date.format("%a"), e.count);
    }
    println!(
        "{} commits on {} dates",
        schedule.plan.total_commits(),
        schedule.plan.len()
    );
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Look up the token owner and repository on GitHub, then drop dates before
/// the account was created. Any such date is an input error.
fn check_account(
    gh: &GitHub,
    slug: &str,
    prepared: &mut Prepared,
    cfg: &Config,
) -> Result<()> {
    let pb = spinner(format!("checking access to {}", slug));
    let res = (|| {
        let user = gh.user()?;
        gh.ensure_push_access(slug)?;
        Ok::<_, anyhow::Error>(user)
    })();
    let user = match res {
        Ok(user) => {
            pb.set_style(ok_style());
            pb.finish_with_message(format!("{} can push to {}", user.login, slug));
            user
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("checking access to {} (error: {})", slug, e));
            return Err(e);
        }
    };

    let created = user.created_at.date_naive();
    prepared.reschedule(
        cfg,
        &Limits {
            today: today(),
            not_before: Some(created),
        },
    )?;
    Ok(())
}

fn reject_invalid_dates(schedule: &Schedule) -> Result<()> {
    let invalid: Vec<_> = schedule.invalid().collect();
    if let Some(first) = invalid.first() {
        return Err(anyhow!(
            "{} cell(s) map to dates that cannot appear on the graph (first: {}, {}); \
             move the pattern with --start or --offset",
            invalid.len(),
            first.date,
            first.reason
        ))
        .context(Failure::Input);
    }
    Ok(())
}

/// Draw the pattern into `--repo` with backdated empty commits.
///
/// Flow:
/// 1. Render and schedule the pattern; print the preview and notes.
/// 2. With `--dry-run`, print the plan and stop.
/// 3. Resolve a token; if there is one, check it and the repository on GitHub.
/// 4. Confirm, prepare the work repository and create only the missing commits.
/// 5. Push unless the run was aborted, then report and log a summary.
pub fn cmd_push(args: &PushArgs) -> Result<()> {
    let p = paths()?;
    let cfg = load_config(&p.config)?;
    let templates = TemplateStore::load(&p.templates)?;
    run_push(args, &cfg, &p, &templates, &KeyringStore).map(|_| ())
}

/// [`cmd_push`] with its environment passed in. Returns the execution report,
/// or `None` when no commit was attempted (dry run, empty plan, declined).
pub fn run_push(
    args: &PushArgs,
    cfg: &Config,
    p: &Paths,
    templates: &TemplateStore,
    store: &dyn TokenStore,
) -> Result<Option<ExecutionReport>> {
    let slug = args.repo.trim();
    let (owner, _) = parse_slug(slug)?;
    let branch = args.branch.as_deref().unwrap_or(&cfg.push.branch);
    let policy = args.on_failure.unwrap_or(cfg.push.on_failure);
    let stamp = Stamp {
        time: cfg.first_commit_time().context(Failure::Input)?,
        offset: Local::now().offset().fix(),
    };

    let today = today();
    let mut prepared = prepare(&args.pattern, cfg, templates, &Limits::until(today))?;
    print_preview(&prepared.rendered.grid, prepared.start, &cfg.render.commits);
    println!();
    print_notes(&prepared, today, args.dry_run);
    reject_invalid_dates(&prepared.schedule)?;

    if prepared.schedule.plan.is_empty() {
        println!("Nothing to commit.");
        return Ok(None);
    }
    if args.dry_run {
        print_plan(&prepared.schedule);
        return Ok(None);
    }

    let mut accounts: Vec<&str> = Vec::new();
    accounts.extend(args.account.as_deref());
    accounts.push(owner);
    accounts.extend(cfg.github.account.as_deref());
    let token = resolve_token(store, &accounts).context(Failure::Auth)?;

    match &token {
        Some(tok) => {
            let gh = GitHub::new(&cfg.github.api_url, tok)?;
            check_account(&gh, slug, &mut prepared, cfg)?;
        }
        None => warn!(
            "no token for {} (run `contrib-art login`); pushing over SSH without account checks",
            owner
        ),
    }
    reject_invalid_dates(&prepared.schedule)?;

    let plan = &prepared.schedule.plan;
    if !args.yes {
        let question = format!(
            "Create up to {} commits on {} dates in {} (branch {})?",
            plan.total_commits(),
            plan.len(),
            slug,
            branch
        );
        let ok = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()?;
        if !ok {
            println!("Aborted.");
            return Ok(None);
        }
    }

    let author = resolve_author(
        cfg.push.author_name.as_deref(),
        cfg.push.author_email.as_deref(),
    )?;
    let url = args
        .remote
        .clone()
        .unwrap_or_else(|| remote_url(&cfg.github.host, slug, token.is_some()));

    let pb = spinner(format!("preparing work repository for {}", slug));
    let mut exec = match Git2Executor::prepare(&work_dir_for(p, slug), &url, branch, token, author)
    {
        Ok(exec) => {
            pb.finish_and_clear();
            exec
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("preparing work repository (error: {})", e));
            return Err(e).context(Failure::Execution);
        }
    };

    let report = draw(&mut exec, plan, &stamp, policy, slug, branch)?;
    if args.remote.is_none() {
        println!("View at: https://{}/{}", cfg.github.host, slug);
        println!("Contribution graph: https://{}/{}", cfg.github.host, owner);
    }
    Ok(Some(report))
}

/// Create the commits `plan` still misses through `exec`, then push unless
/// the run was aborted. Any failed date or a failed push is a
/// [`Failure::Execution`].
fn draw(
    exec: &mut dyn CommitExecutor,
    plan: &CommitPlan,
    stamp: &Stamp,
    policy: FailurePolicy,
    slug: &str,
    branch: &str,
) -> Result<ExecutionReport> {
    let existing = exec.existing().context(Failure::Execution)?;
    let (pending, skipped) = reconcile(plan, &existing);
    let missing: u64 = pending.iter().map(|p| u64::from(p.missing())).sum();
    info!(
        repo = slug,
        branch,
        dates = pending.len(),
        commits = missing,
        skipped,
        "starting run"
    );

    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(bar_style());
    let mut report = execute(&mut *exec, &pending, stamp, policy, &pb);
    report.skipped = skipped;
    pb.finish_and_clear();

    let pushed = if report.aborted {
        warn!("aborted after a failed commit; nothing was pushed, re-run to resume");
        false
    } else {
        let pb = spinner(format!("pushing {} to {}", branch, slug));
        match exec.push() {
            Ok(()) => {
                pb.set_style(ok_style());
                pb.finish_with_message(format!("pushed {} to {}", branch, slug));
                true
            }
            Err(e) => {
                let msg = format!("{:#}", e);
                pb.set_style(err_style());
                pb.finish_with_message(format!("pushing {} (error: {})", branch, msg));
                error!(repo = slug, branch, operation = "push", error = %msg, "push failed");
                false
            }
        }
    };

    info!(
        repo = slug,
        branch,
        succeeded = %date_list(&report.succeeded),
        commits = report.commits,
        skipped = report.skipped,
        failed = report.failed.len(),
        pushed,
        "run finished"
    );
    print_report(&report, pushed);

    if !report.failed.is_empty() || !pushed {
        return Err(anyhow!(
            "{} date(s) failed{}",
            report.failed.len(),
            if pushed { "" } else { ", branch not pushed" }
        ))
        .context(Failure::Execution);
    }
    Ok(report)
}

fn date_list(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_report(report: &ExecutionReport, pushed: bool) {
    println!(
        "{} {} commits on {} dates, {} dates already present",
        "Done:".green().bold(),
        report.commits,
        report.succeeded.len(),
        report.skipped
    );
    if report.failed.is_empty() && pushed {
        if let (Some(first), Some(last)) = (report.succeeded.first(), report.succeeded.last()) {
            println!("   dates {} to {}", first, last);
        }
        return;
    }

    if !report.succeeded.is_empty() {
        let state = if pushed { "pushed" } else { "committed locally, not pushed" };
        println!("{} ({}):", "Succeeded".bold(), state);
        for date in &report.succeeded {
            println!("   {}", date);
        }
    }
    if !report.failed.is_empty() {
        println!("{} {} dates failed:", "Failed:".red().bold(), report.failed.len());
        for (date, err) in &report.failed {
            println!("   {} {}", date, err);
        }
    }
}
