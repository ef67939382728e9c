//! # contrib-art
//!
//! **contrib-art** draws images, text and templates on a GitHub
//! contribution graph using backdated empty commits.
//!
//! Features:
//! - `contrib-art preview` renders a pattern in the terminal (and optionally as PNG)
//! - `contrib-art push` creates the commits in a repository and pushes them
//! - `contrib-art templates` lists, imports and exports templates
//! - `contrib-art login` / `logout` manage the GitHub token in the system keyring
//! - `contrib-art config` edits or locates `config.toml`
//! - without arguments an interactive menu is started
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use contrib_art::{
    PreviewArgs, PushArgs, cmd_config_edit, cmd_login, cmd_logout, cmd_preview, cmd_push,
    cmd_templates_export, cmd_templates_import, cmd_templates_list, cmd_wizard, contrib_art_home,
    exit_code_for, init_logging, load_config, paths,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "contrib-art",
    version,
    about = "contrib-art - draw on your GitHub contribution graph"
)]
struct Cli {
    /// More output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive menu (the default)
    Wizard,
    /// Show a pattern on the graph without committing
    Preview(PreviewArgs),
    /// Create the commits for a pattern and push them
    Push(PushArgs),
    /// Manage templates
    #[command(subcommand)]
    Templates(TemplatesCmd),
    /// Store a GitHub token in the system keyring
    Login {
        /// Also store the token under this name
        #[arg(long)]
        account: Option<String>,
    },
    /// Remove a stored GitHub token
    Logout {
        #[arg(long)]
        account: Option<String>,
    },
    /// Edit or locate config.toml
    #[command(subcommand)]
    Config(ConfigCmd),
    /// Print the contrib-art home directory
    Home,
}

#[derive(Subcommand, Debug)]
enum TemplatesCmd {
    /// List templates with a preview
    List,
    /// Import templates from a JSON file
    Import { file: PathBuf },
    /// Export all templates to a JSON file
    Export { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Open config.toml in $EDITOR
    Edit,
    /// Print the path of config.toml
    Path,
}

/// Log file from the config, falling back to `<home>/contrib-art.log`.
fn log_file() -> Result<PathBuf> {
    let p = paths()?;
    let configured = load_config(&p.config).ok().and_then(|c| c.log.file);
    Ok(configured.unwrap_or(p.log))
}

fn run(cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Wizard => cmd_wizard(),
        Cmd::Preview(args) => cmd_preview(&args),
        Cmd::Push(args) => cmd_push(&args),
        Cmd::Templates(TemplatesCmd::List) => cmd_templates_list(),
        Cmd::Templates(TemplatesCmd::Import { file }) => cmd_templates_import(&file),
        Cmd::Templates(TemplatesCmd::Export { file }) => cmd_templates_export(&file),
        Cmd::Login { account } => cmd_login(account.as_deref()),
        Cmd::Logout { account } => cmd_logout(account.as_deref()),
        Cmd::Config(ConfigCmd::Edit) => cmd_config_edit(&paths()?.config),
        Cmd::Config(ConfigCmd::Path) => {
            println!("{}", paths()?.config.display());
            Ok(())
        }
        Cmd::Home => {
            println!("{}", contrib_art_home()?.display());
            Ok(())
        }
    }
}

/// CLI entry point.
///
/// Parses arguments, sets up logging and maps the outcome to an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = log_file().and_then(|f| init_logging(cli.verbose, &f));
    if let Err(e) = &logging {
        eprintln!("warning: logging disabled: {:#}", e);
    }

    match run(cli.cmd.unwrap_or(Cmd::Wizard)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if logging.is_ok() {
                tracing::error!("{:#}", e);
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::from(exit_code_for(&e))
        }
    }
}
