use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use dialoguer::Password;
use dialoguer::theme::ColorfulTheme;
use tracing::info;

use crate::config::{Config, load_config};
use crate::credentials::{KeyringStore, TokenStore};
use crate::error::Failure;
use crate::github::GitHub;
use crate::paths::paths;

/// Validate `token` against GitHub and store it under the login it belongs
/// to, and under `alias` if that differs. Returns the login.
pub fn login_with(
    store: &dyn TokenStore,
    cfg: &Config,
    token: &str,
    alias: Option<&str>,
) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow!("no token entered")).context(Failure::Input);
    }
    let user = GitHub::new(&cfg.github.api_url, token)?.user()?;
    store.set(&user.login, token).context(Failure::Auth)?;
    if let Some(alias) = alias
        && alias != user.login
    {
        store.set(alias, token).context(Failure::Auth)?;
    }
    info!(login = %user.login, "token stored");
    Ok(user.login)
}

/// Prompt for a personal access token and store it in the keyring.
pub fn cmd_login(account: Option<&str>) -> Result<()> {
    let cfg = load_config(&paths()?.config)?;
    println!("Create a token with the `repo` scope at https://{}/settings/tokens", cfg.github.host);
    let token = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("GitHub personal access token")
        .interact()?;
    let login = login_with(&KeyringStore, &cfg, &token, account)?;
    println!("{} logged in as {}", "✔".green(), login.bold());
    Ok(())
}

pub fn logout_with(store: &dyn TokenStore, cfg: &Config, account: Option<&str>) -> Result<bool> {
    let account = account
        .or(cfg.github.account.as_deref())
        .ok_or_else(|| anyhow!("no account given; pass --account or set github.account"))
        .context(Failure::Input)?;
    let removed = store.delete(account).context(Failure::Auth)?;
    if removed {
        info!(%account, "token removed");
    }
    Ok(removed)
}

pub fn cmd_logout(account: Option<&str>) -> Result<()> {
    let cfg = load_config(&paths()?.config)?;
    if logout_with(&KeyringStore, &cfg, account)? {
        println!("{} token removed", "✔".green());
    } else {
        println!("no stored token");
    }
    Ok(())
}
