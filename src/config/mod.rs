mod edit;

use anyhow::{Context, Result, bail};
use chrono::{NaiveTime, Timelike};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Failure;
use crate::grid::{CommitTiers, MAX_WEEKS, Shading};
use crate::push::FailurePolicy;
use crate::source::Overflow;

pub use edit::{cmd_config_edit, ensure_default_config};

/// Commented template written by `config edit`. Parses to [`Config::default`].
pub const DEFAULT_CONFIG: &str = r#"# contrib-art configuration

[github]
api_url = "https://api.github.com"
host = "github.com"
# account = "octocat"

[push]
branch = "contribution"
weeks = 52
commit_time = "12:00"
on_failure = "continue"
# author_name = "Your Name"
# author_email = "you@example.com"

[render]
image_overflow = "scale"
text_overflow = "truncate"
shading = [64, 128, 192, 255]
commits = [1, 2, 3, 4]
# font = "/usr/share/fonts/TTF/DejaVuSansMono.ttf"

[log]
# file = "/tmp/contrib-art.log"
"#;

/// Top-level configuration loaded from `config.toml`.
///
/// Every section and key is optional; missing values take the defaults
/// shown in [`DEFAULT_CONFIG`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub github: GithubConfig,
    pub push: PushConfig,
    pub render: RenderConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    pub api_url: String,
    pub host: String,
    /// Token store key used when the repository owner has no stored token.
    pub account: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            host: "github.com".to_string(),
            account: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushConfig {
    pub branch: String,
    pub weeks: usize,
    pub commit_time: String,
    pub on_failure: FailurePolicy,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            branch: "contribution".to_string(),
            weeks: crate::grid::DEFAULT_WEEKS,
            commit_time: "12:00".to_string(),
            on_failure: FailurePolicy::Continue,
            author_name: None,
            author_email: None,
        }
    }
}

impl PushConfig {
    /// Time of day the first commit of each date is stamped with.
    pub fn commit_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.commit_time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.commit_time, "%H:%M:%S"))
            .with_context(|| format!("invalid commit_time {:?}, expected HH:MM", self.commit_time))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub image_overflow: Overflow,
    pub text_overflow: Overflow,
    pub shading: Shading,
    pub commits: CommitTiers,
    pub font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_overflow: Overflow::Scale,
            text_overflow: Overflow::Truncate,
            shading: Shading::default(),
            commits: CommitTiers::default(),
            font: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
}

impl Config {
    /// Time of the first commit on each date. Later commits on the same date
    /// follow a minute apart, so the darkest tier must still end before
    /// midnight.
    pub fn first_commit_time(&self) -> Result<NaiveTime> {
        let time = self.push.commit_time()?;
        let most = self.render.commits.max();
        let last = u64::from(time.num_seconds_from_midnight()) + u64::from(most - 1) * 60;
        if last >= 24 * 60 * 60 {
            bail!(
                "push.commit_time {} leaves no room for {} commits before midnight",
                self.push.commit_time,
                most
            );
        }
        Ok(time)
    }

    fn validate(&self) -> Result<()> {
        self.first_commit_time()?;
        if !(1..=MAX_WEEKS).contains(&self.push.weeks) {
            bail!("push.weeks must be between 1 and {}, got {}", MAX_WEEKS, self.push.weeks);
        }
        if self.push.branch.trim().is_empty() {
            bail!("push.branch must not be empty");
        }
        Ok(())
    }
}

/// Load `config.toml` from `path`. A missing file yields the defaults.
///
/// # Errors
/// - The file exists but cannot be read.
/// - Parsing or validation fails (classified as [`Failure::Input`]).
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))
        .context(Failure::Input)
}

pub fn parse_config(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)?;
    cfg.validate()?;
    Ok(cfg)
}
