use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset, NaiveDate};
use git2::{
    Commit, Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks, Repository,
    Signature, Time,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{Author, CommitExecutor};
use crate::error::Failure;

/// Credential callbacks are retried by libgit2 on rejection; stop after this many.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// Build `RemoteCallbacks` that authenticate with the token if one is given,
/// otherwise with the user's SSH agent, falling back to default credentials.
fn remote_callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut attempts = 0;
    let mut cb = RemoteCallbacks::new();
    cb.credentials(move |_url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::from_str(
                "credentials rejected by remote, giving up",
            ));
        }
        if let Some(tok) = token
            && allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
        {
            return Cred::userpass_plaintext("x-access-token", tok);
        }
        Cred::ssh_key_from_agent(username_from_url.unwrap_or("git")).or_else(|_| Cred::default())
    });
    cb
}

/// Day a commit timestamp falls on, in the offset it was written with.
fn author_date(t: &Time) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(t.offset_minutes() * 60)?;
    let utc = DateTime::from_timestamp(t.seconds(), 0)?;
    Some(utc.with_timezone(&offset).date_naive())
}

/// Author identity: explicit values first, then `user.name` / `user.email`
/// from git config.
///
/// # Errors
/// Returns [`Failure::Input`] if either part cannot be determined.
pub fn resolve_author(name: Option<&str>, email: Option<&str>) -> Result<Author> {
    let cfg = git2::Config::open_default().ok();
    let lookup = |key: &str| cfg.as_ref().and_then(|c| c.get_string(key).ok());

    let name = name.map(str::to_string).or_else(|| lookup("user.name"));
    let email = email.map(str::to_string).or_else(|| lookup("user.email"));
    match (name, email) {
        (Some(name), Some(email)) if !name.trim().is_empty() && !email.trim().is_empty() => {
            Ok(Author { name, email })
        }
        _ => Err(anyhow!(
            "no git identity found; run `git config --global user.name \"Your Name\"` and \
             `git config --global user.email you@example.com`, or set push.author_name and \
             push.author_email in the config"
        )
        .context(Failure::Input)),
    }
}

/// [`CommitExecutor`] backed by a persistent bare repository.
pub struct Git2Executor {
    repo: Repository,
    branch: String,
    token: Option<String>,
    author: Author,
}

impl Git2Executor {
    /// Open (or create) the work repository at `work_dir` and bring `branch`
    /// up to date with `origin`.
    ///
    /// - `origin` is (re)pointed at `remote_url`.
    /// - The local branch is moved to the remote tip, unless it already
    ///   contains it (commits left over from an interrupted run).
    ///
    /// # Errors
    /// Returns an error if the repository cannot be opened or the fetch fails.
    pub fn prepare(
        work_dir: &Path,
        remote_url: &str,
        branch: &str,
        token: Option<String>,
        author: Author,
    ) -> Result<Self> {
        fs::create_dir_all(work_dir)
            .with_context(|| format!("failed to create {}", work_dir.display()))?;
        let repo = match Repository::open(work_dir) {
            Ok(repo) => repo,
            Err(_) => {
                debug!(dir = %work_dir.display(), "initializing work repository");
                Repository::init_bare(work_dir)
                    .with_context(|| format!("git init {}", work_dir.display()))?
            }
        };

        match repo.find_remote("origin") {
            Ok(r) if r.url() == Some(remote_url) => {}
            Ok(_) => repo.remote_set_url("origin", remote_url)?,
            Err(_) => {
                repo.remote("origin", remote_url)?;
            }
        }

        let exec = Self {
            repo,
            branch: branch.to_string(),
            token,
            author,
        };
        exec.repo.set_head(&exec.local_ref())?;
        exec.fetch_origin()?;
        exec.sync_branch()?;
        Ok(exec)
    }

    fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    /// Perform `git fetch origin`, force-updating remote-tracking refs.
    fn fetch_origin(&self) -> Result<()> {
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(remote_callbacks(self.token.as_deref()));

        let mut remote = self.repo.find_remote("origin")?;
        remote
            .fetch(&["+refs/heads/*:refs/remotes/origin/*"], Some(&mut fo), None)
            .context("git fetch origin")?;
        Ok(())
    }

    fn sync_branch(&self) -> Result<()> {
        let remote_ref = format!("refs/remotes/origin/{}", self.branch);
        let Ok(remote) = self.repo.find_reference(&remote_ref) else {
            debug!(branch = %self.branch, "branch not on remote yet");
            return Ok(());
        };
        let remote_tip = remote.peel_to_commit()?.id();

        let local_ref = self.local_ref();
        if let Ok(local) = self.repo.find_reference(&local_ref) {
            let local_tip = local.peel_to_commit()?.id();
            if local_tip == remote_tip || self.repo.graph_descendant_of(local_tip, remote_tip)? {
                return Ok(());
            }
            warn!(
                branch = %self.branch,
                "local work branch diverged from origin, resetting to the remote tip"
            );
        }
        self.repo
            .reference(&local_ref, remote_tip, true, "contrib-art: sync with origin")?;
        Ok(())
    }

    fn tip(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.find_reference(&self.local_ref()) {
            Ok(r) => Ok(Some(r.peel_to_commit()?)),
            Err(_) => Ok(None),
        }
    }
}

impl CommitExecutor for Git2Executor {
    fn existing(&self) -> Result<BTreeMap<NaiveDate, u32>> {
        let mut counts = BTreeMap::new();
        let Some(tip) = self.tip()? else {
            return Ok(counts);
        };

        let mut walk = self.repo.revwalk()?;
        walk.push(tip.id())?;
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            if let Some(date) = author_date(&commit.author().when()) {
                *counts.entry(date).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn commit(&mut self, at: DateTime<FixedOffset>, message: &str) -> Result<String> {
        let time = Time::new(at.timestamp(), at.offset().local_minus_utc() / 60);
        let sig = Signature::new(&self.author.name, &self.author.email, &time)?;

        let parent = self.tip()?;
        let tree_id = match &parent {
            Some(p) => p.tree_id(),
            None => self.repo.treebuilder(None)?.write()?,
        };
        let tree = self.repo.find_tree(tree_id)?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some(&self.local_ref()), &sig, &sig, message, &tree, &parents)
            .with_context(|| format!("git commit at {}", at))?;
        let short = self.repo.find_object(oid, None)?.short_id()?;
        Ok(short.as_str().unwrap_or_default().to_string())
    }

    fn push(&mut self) -> Result<()> {
        let local_ref = self.local_ref();
        if self.tip()?.is_none() {
            info!(branch = %self.branch, "nothing to push");
            return Ok(());
        }

        let mut rejected = Vec::new();
        {
            let mut cb = remote_callbacks(self.token.as_deref());
            cb.push_update_reference(|name, status| {
                if let Some(msg) = status {
                    rejected.push(format!("{}: {}", name, msg));
                }
                Ok(())
            });
            let mut po = PushOptions::new();
            po.remote_callbacks(cb);

            let spec = format!("{0}:{0}", local_ref);
            let mut remote = self.repo.find_remote("origin")?;
            remote
                .push(&[spec.as_str()], Some(&mut po))
                .with_context(|| format!("git push origin {}", self.branch))?;
        }
        if !rejected.is_empty() {
            bail!("push rejected: {}", rejected.join("; "));
        }
        Ok(())
    }
}
