//! Interactive menu, used when `contrib-art` runs without arguments.

use anyhow::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input, Select};
use std::path::PathBuf;

use crate::account::cmd_login;
use crate::config::load_config;
use crate::paths::paths;
use crate::pattern::{LayoutArgs, PatternArgs};
use crate::preview::{PreviewArgs, cmd_preview};
use crate::push::{PushArgs, cmd_push};
use crate::source::PatternSource;
use crate::template::{
    TemplateStore, cmd_templates_export, cmd_templates_import, cmd_templates_list,
};

const ACTIONS: [&str; 7] = [
    "Preview a pattern",
    "Draw a pattern into a repository",
    "List templates",
    "Import templates",
    "Export templates",
    "Connect GitHub account",
    "Exit",
];

pub fn cmd_wizard() -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("{}", "contrib-art: draw on your GitHub contribution graph".bold());
    loop {
        println!();
        let choice = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&ACTIONS[..])
            .default(0)
            .interact()?;

        let res = match choice {
            0 => ask_pattern(&theme).and_then(|pattern| {
                cmd_preview(&PreviewArgs {
                    pattern,
                    png: None,
                })
            }),
            1 => ask_push(&theme).and_then(|args| cmd_push(&args)),
            2 => cmd_templates_list(),
            3 => ask_path(&theme, "Template file to import").and_then(|p| cmd_templates_import(&p)),
            4 => ask_path(&theme, "File to export to").and_then(|p| cmd_templates_export(&p)),
            5 => cmd_login(None),
            _ => return Ok(()),
        };
        if let Err(e) = res {
            eprintln!("{} {:#}", "error:".red(), e);
        }
    }
}

fn ask_path(theme: &ColorfulTheme, prompt: &str) -> Result<PathBuf> {
    let s: String = Input::with_theme(theme).with_prompt(prompt).interact_text()?;
    Ok(PathBuf::from(s.trim()))
}

fn ask_pattern(theme: &ColorfulTheme) -> Result<PatternArgs> {
    let p = paths()?;
    let cfg = load_config(&p.config)?;

    let kind = Select::with_theme(theme)
        .with_prompt("Draw from")
        .items(&["Image", "Text", "Template"][..])
        .default(0)
        .interact()?;
    let source = match kind {
        0 => PatternSource::Image(ask_path(theme, "Image file")?),
        1 => PatternSource::Text(Input::with_theme(theme).with_prompt("Text").interact_text()?),
        _ => {
            let names = TemplateStore::load(&p.templates)?.names();
            let i = FuzzySelect::with_theme(theme)
                .with_prompt("Template")
                .items(&names[..])
                .default(0)
                .interact()?;
            PatternSource::Template(names[i].clone())
        }
    };

    let weeks: usize = Input::with_theme(theme)
        .with_prompt("Weeks")
        .default(cfg.push.weeks)
        .interact_text()?;
    let offset: usize = Input::with_theme(theme)
        .with_prompt("Weeks to shift into the past")
        .default(0)
        .interact_text()?;

    Ok(PatternArgs {
        source: source.into(),
        layout: LayoutArgs {
            weeks: Some(weeks),
            offset: Some(offset),
            ..LayoutArgs::default()
        },
    })
}

fn ask_push(theme: &ColorfulTheme) -> Result<PushArgs> {
    let pattern = ask_pattern(theme)?;
    let repo: String = Input::with_theme(theme)
        .with_prompt("Repository (owner/name)")
        .interact_text()?;
    let dry_run = Confirm::with_theme(theme)
        .with_prompt("Dry run only?")
        .default(true)
        .interact()?;
    Ok(PushArgs {
        pattern,
        repo,
        branch: None,
        dry_run,
        yes: false,
        on_failure: None,
        remote: None,
        account: None,
    })
}
