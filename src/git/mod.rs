//! Git integration layer.
//!
//! Callers talk to a [`CommitExecutor`]; the production implementation is
//! [`Git2Executor`] (based on the `git2` crate). Keeping the trait as the seam
//! lets the run loop be exercised against an in-memory fake.

mod git2_backend;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate};
use std::collections::BTreeMap;

pub use git2_backend::{Git2Executor, resolve_author};

/// Identity written into every commit as both author and committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Creates backdated empty commits on one branch and publishes them.
pub trait CommitExecutor {
    /// Number of commits per author date already on the target branch.
    fn existing(&self) -> Result<BTreeMap<NaiveDate, u32>>;

    /// Create one empty commit dated `at` and return its short id.
    fn commit(&mut self, at: DateTime<FixedOffset>, message: &str) -> Result<String>;

    /// Push the branch to `origin`. Never forces.
    fn push(&mut self) -> Result<()>;
}
