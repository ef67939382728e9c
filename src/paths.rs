use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone, Debug)]
pub struct Paths {
    pub config: PathBuf,
    pub templates: PathBuf,
    pub work: PathBuf,
    pub log: PathBuf,
}

/// Application home: `$XDG_CONFIG_HOME/contrib-art`, or `~/.config/contrib-art`.
pub fn contrib_art_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME");
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join("contrib-art"))
}

pub fn paths() -> Result<Paths> {
    let home = contrib_art_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
        templates: home.join("templates.json"),
        work: home.join("work"),
        log: home.join("contrib-art.log"),
    })
}

/// Work repository for a `owner/name` slug, e.g. `work/octocat__art`.
pub fn work_dir_for(p: &Paths, repo: &str) -> PathBuf {
    p.work.join(repo.replace('/', "__"))
}
