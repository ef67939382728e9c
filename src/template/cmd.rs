use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::TemplateStore;
use crate::paths::paths;
use crate::preview::{Style, render_graph};

/// Weeks shown per template in `templates list`.
const LIST_PREVIEW_WEEKS: usize = 20;

/// Print every template with a small preview.
pub fn cmd_templates_list() -> Result<()> {
    let store = TemplateStore::load(&paths()?.templates)?;
    print!("{}", list_templates(&store, Style::detect()));
    Ok(())
}

pub fn list_templates(store: &TemplateStore, style: Style) -> String {
    let mut out = String::new();
    for t in store.all() {
        out.push_str(&format!(
            "{} ({}x{})\n",
            t.name.bold(),
            t.width(),
            t.grid.len()
        ));
        let rendered = t.render(LIST_PREVIEW_WEEKS);
        out.push_str(&render_graph(&rendered.grid, None, style, Some(LIST_PREVIEW_WEEKS)));
        out.push('\n');
    }
    out
}

pub fn cmd_templates_import(file: &Path) -> Result<()> {
    let mut store = TemplateStore::load(&paths()?.templates)?;
    let names = store.import(file)?;
    println!(
        "{} imported {} template(s): {}",
        "✔".green(),
        names.len(),
        names.join(", ")
    );
    Ok(())
}

pub fn cmd_templates_export(file: &Path) -> Result<()> {
    let store = TemplateStore::load(&paths()?.templates)?;
    let n = store.export(file)?;
    println!("{} exported {} template(s) to {}", "✔".green(), n, file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_shows_every_template() {
        colored::control::set_override(false);
        let store = TemplateStore::builtin_only();
        let out = list_templates(&store, Style::Plain);
        for name in ["skull", "heart", "smile", "diamond", "checkmark"] {
            assert!(out.contains(name), "{}", name);
        }
        assert!(out.contains("heart (7x7)"));
        assert!(out.lines().any(|l| l.starts_with("Wed ")));
    }
}
