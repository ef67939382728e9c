//! Named patterns: built-in templates plus user templates imported from JSON.
//!
//! A template file is one of:
//! - a single object: `{"name": "wave", "grid": [[0, 1, 2], ...]}`
//! - an array of such objects (what `export` writes)
//! - a map of name to matrix: `{"wave": [[0, 1, 2], ...]}`
//!
//! Cells are levels `0..=4` or booleans (`true` is level 1). At most 7 rows,
//! all rows the same length. Fewer rows are padded at the bottom.

mod builtin;
mod cmd;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::Failure;
use crate::grid::{DAYS, Grid, MAX_LEVEL};
use crate::source::{Fit, Overflow, Rendered};

pub use builtin::builtin_templates;
pub use cmd::{cmd_templates_export, cmd_templates_import, cmd_templates_list, list_templates};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    /// Row-major levels, Sunday first.
    pub grid: Vec<Vec<u8>>,
}

impl Template {
    pub fn width(&self) -> usize {
        self.grid.first().map(Vec::len).unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if !valid_name(&self.name) {
            bail!(
                "invalid template name {:?} (lowercase letters, digits, '-' and '_', max 32)",
                self.name
            );
        }
        if self.grid.is_empty() || self.grid.len() > DAYS {
            bail!(
                "template {:?} has {} rows, expected 1 to {}",
                self.name,
                self.grid.len(),
                DAYS
            );
        }
        let width = self.width();
        if width == 0 {
            bail!("template {:?} has empty rows", self.name);
        }
        if let Some((i, row)) = self.grid.iter().enumerate().find(|(_, r)| r.len() != width) {
            bail!(
                "template {:?}: row {} has {} cells, expected {}",
                self.name,
                i,
                row.len(),
                width
            );
        }
        if let Some(level) = self.grid.iter().flatten().find(|l| **l > MAX_LEVEL) {
            bail!(
                "template {:?}: level {} is above {}",
                self.name,
                level,
                MAX_LEVEL
            );
        }
        Ok(())
    }

    /// Place the template at the left edge of a `weeks`-wide grid.
    pub fn render(&self, weeks: usize) -> Rendered {
        Rendered {
            grid: Grid::from_rows(&self.grid, weeks),
            fit: Fit {
                policy: Overflow::Truncate,
                source_columns: self.width(),
                weeks,
            },
        }
    }
}

fn valid_name(name: &str) -> bool {
    static NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,31}$").unwrap());
    NAME.is_match(name)
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Cell {
    Flag(bool),
    Level(u8),
}

impl Cell {
    fn level(self) -> u8 {
        match self {
            Cell::Flag(on) => u8::from(on),
            Cell::Level(l) => l,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    name: String,
    #[serde(alias = "rows", alias = "pattern")]
    grid: Vec<Vec<Cell>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    One(RawTemplate),
    Many(Vec<RawTemplate>),
    Named(BTreeMap<String, Vec<Vec<Cell>>>),
}

fn convert(name: &str, grid: Vec<Vec<Cell>>) -> Result<Template> {
    let t = Template {
        name: name.trim().to_lowercase(),
        grid: grid
            .into_iter()
            .map(|row| row.into_iter().map(Cell::level).collect())
            .collect(),
    };
    t.validate()?;
    Ok(t)
}

/// Parse and validate a template file in any of the accepted shapes.
pub fn parse_templates(json: &str) -> Result<Vec<Template>> {
    let file: TemplateFile = serde_json::from_str(json).context("not a valid template file")?;
    let raw: Vec<(String, Vec<Vec<Cell>>)> = match file {
        TemplateFile::One(t) => vec![(t.name, t.grid)],
        TemplateFile::Many(ts) => ts.into_iter().map(|t| (t.name, t.grid)).collect(),
        TemplateFile::Named(map) => map.into_iter().collect(),
    };
    if raw.is_empty() {
        bail!("template file contains no templates");
    }
    raw.into_iter()
        .map(|(name, grid)| convert(&name, grid))
        .collect()
}

/// Built-in templates plus the user's imported ones.
///
/// User templates live in `templates.json` and shadow built-ins of the
/// same name.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    builtin: Vec<Template>,
    user: Vec<Template>,
    path: Option<PathBuf>,
}

impl TemplateStore {
    pub fn builtin_only() -> Self {
        Self {
            builtin: builtin_templates(),
            user: Vec::new(),
            path: None,
        }
    }

    /// Load the store backed by `path`; a missing file means no user templates.
    pub fn load(path: &Path) -> Result<Self> {
        let mut store = Self::builtin_only();
        store.path = Some(path.to_path_buf());
        if path.exists() {
            let txt = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            store.user = parse_templates(&txt)
                .with_context(|| format!("broken template store {}", path.display()))
                .context(Failure::Input)?;
        }
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Result<&Template> {
        let key = name.trim().to_lowercase();
        self.user
            .iter()
            .chain(self.builtin.iter())
            .find(|t| t.name == key)
            .ok_or_else(|| {
                anyhow!(
                    "template {:?} not found (available: {})",
                    name,
                    self.names().join(", ")
                )
            })
    }

    /// Every visible template: built-ins first, then user templates.
    pub fn all(&self) -> Vec<&Template> {
        let shadowed = |t: &&Template| self.user.iter().any(|u| u.name == t.name);
        let mut out: Vec<&Template> = self.builtin.iter().filter(|t| !shadowed(t)).collect();
        out.extend(self.user.iter());
        out
    }

    pub fn names(&self) -> Vec<String> {
        self.all().into_iter().map(|t| t.name.clone()).collect()
    }

    /// Add or replace user templates and persist them.
    pub fn insert(&mut self, templates: Vec<Template>) -> Result<()> {
        for t in templates {
            match self.user.iter_mut().find(|u| u.name == t.name) {
                Some(slot) => *slot = t,
                None => self.user.push(t),
            }
        }
        self.save()
    }

    /// Import every template in `file`; returns the imported names.
    pub fn import(&mut self, file: &Path) -> Result<Vec<String>> {
        let txt = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))
            .context(Failure::Input)?;
        let templates = parse_templates(&txt)
            .with_context(|| format!("cannot import {}", file.display()))
            .context(Failure::Input)?;
        let names = templates.iter().map(|t| t.name.clone()).collect();
        self.insert(templates)?;
        Ok(names)
    }

    /// Write every visible template to `file` as a JSON array.
    pub fn export(&self, file: &Path) -> Result<usize> {
        let all = self.all();
        let json = serde_json::to_string_pretty(&all)?;
        fs::write(file, json + "\n")
            .with_context(|| format!("failed to write {}", file.display()))?;
        Ok(all.len())
    }

    /// Persist user templates atomically.
    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.user)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
