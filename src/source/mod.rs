//! Grid producers: images, text and templates.
//!
//! Every producer returns a [`Rendered`] grid together with a [`Fit`] that
//! says how the source was squeezed into the week span, so the caller can
//! tell the user instead of guessing silently.

mod bitmap;
mod font;
mod text;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RenderConfig;
use crate::error::Failure;
use crate::grid::Grid;
use crate::template::TemplateStore;

pub use bitmap::{grid_from_image, grid_from_luma, load_image};
pub use font::{glyph, supported_chars};
pub use text::{render_text, text_to_luma};

/// What to do when a source is wider than the week span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Resize to exactly fill the span.
    Scale,
    /// Keep the aspect ratio; drop columns past the span.
    Truncate,
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overflow::Scale => f.write_str("scale"),
            Overflow::Truncate => f.write_str("truncate"),
        }
    }
}

/// How a source was fitted into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fit {
    pub policy: Overflow,
    /// Width of the source at 7 rows, aspect ratio kept.
    pub source_columns: usize,
    pub weeks: usize,
}

impl Fit {
    pub fn dropped_columns(&self) -> usize {
        match self.policy {
            Overflow::Truncate => self.source_columns.saturating_sub(self.weeks),
            Overflow::Scale => 0,
        }
    }

    /// A note for the user when the source did not fit as-is.
    pub fn describe(&self) -> Option<String> {
        match self.policy {
            Overflow::Scale if self.source_columns != self.weeks => Some(format!(
                "source is {} columns wide at 7 rows, scaled to {} weeks",
                self.source_columns, self.weeks
            )),
            Overflow::Truncate if self.dropped_columns() > 0 => Some(format!(
                "source is {} columns wide, truncated to {} weeks \
                 ({} columns dropped; use --overflow scale to fit)",
                self.source_columns,
                self.weeks,
                self.dropped_columns()
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rendered {
    pub grid: Grid,
    pub fit: Fit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSource {
    Image(PathBuf),
    Text(String),
    Template(String),
}

impl fmt::Display for PatternSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSource::Image(p) => write!(f, "image {}", p.display()),
            PatternSource::Text(t) => write!(f, "text {:?}", t),
            PatternSource::Template(n) => write!(f, "template {}", n),
        }
    }
}

/// Pattern source flags shared by `preview` and `push`.
#[derive(Debug, Clone, Default, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Image to draw; darker pixels become more commits
    #[arg(short, long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Text to draw
    #[arg(short, long)]
    pub text: Option<String>,

    /// Built-in or imported template (see `templates list`)
    #[arg(short = 'T', long, value_name = "NAME")]
    pub template: Option<String>,
}

impl SourceArgs {
    pub fn source(&self) -> Result<PatternSource> {
        match (&self.image, &self.text, &self.template) {
            (Some(p), None, None) => Ok(PatternSource::Image(p.clone())),
            (None, Some(t), None) => Ok(PatternSource::Text(t.clone())),
            (None, None, Some(n)) => Ok(PatternSource::Template(n.clone())),
            _ => Err(anyhow::anyhow!("exactly one of --image, --text or --template is required"))
                .context(Failure::Input),
        }
    }
}

impl From<PatternSource> for SourceArgs {
    fn from(src: PatternSource) -> Self {
        match src {
            PatternSource::Image(p) => Self {
                image: Some(p),
                ..Self::default()
            },
            PatternSource::Text(t) => Self {
                text: Some(t),
                ..Self::default()
            },
            PatternSource::Template(n) => Self {
                template: Some(n),
                ..Self::default()
            },
        }
    }
}

/// Options for turning a [`PatternSource`] into a grid.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub weeks: usize,
    /// Overrides the per-source default from the config.
    pub overflow: Option<Overflow>,
    /// Overrides `render.font` from the config.
    pub font: Option<&'a Path>,
    pub render: &'a RenderConfig,
}

/// Produce a grid for `source`. Every failure is an input error.
pub fn render(
    source: &PatternSource,
    opts: &RenderOptions<'_>,
    templates: &TemplateStore,
) -> Result<Rendered> {
    render_inner(source, opts, templates)
        .with_context(|| format!("cannot render {}", source))
        .context(Failure::Input)
}

fn render_inner(
    source: &PatternSource,
    opts: &RenderOptions<'_>,
    templates: &TemplateStore,
) -> Result<Rendered> {
    match source {
        PatternSource::Image(path) => {
            let img = load_image(path)?;
            let overflow = opts.overflow.unwrap_or(opts.render.image_overflow);
            grid_from_image(&img, opts.weeks, overflow, &opts.render.shading)
        }
        PatternSource::Text(text) => {
            if text.trim().is_empty() {
                bail!("text is empty");
            }
            let overflow = opts.overflow.unwrap_or(opts.render.text_overflow);
            let font = opts.font.or(opts.render.font.as_deref());
            render_text(text, font, opts.weeks, overflow, &opts.render.shading)
        }
        PatternSource::Template(name) => {
            let tpl = templates.get(name)?;
            Ok(tpl.render(opts.weeks))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_notes_only_when_shape_changes() {
        let scaled = Fit {
            policy: Overflow::Scale,
            source_columns: 80,
            weeks: 52,
        };
        assert!(scaled.describe().unwrap().contains("scaled"));
        assert_eq!(scaled.dropped_columns(), 0);

        let cut = Fit {
            policy: Overflow::Truncate,
            source_columns: 60,
            weeks: 52,
        };
        assert_eq!(cut.dropped_columns(), 8);
        assert!(cut.describe().unwrap().contains("8 columns dropped"));

        let narrow = Fit {
            policy: Overflow::Truncate,
            source_columns: 20,
            weeks: 52,
        };
        assert!(narrow.describe().is_none());
    }

    #[test]
    fn source_args_round_trip() {
        let args = SourceArgs::from(PatternSource::Text("HI".into()));
        assert_eq!(args.source().unwrap(), PatternSource::Text("HI".into()));
        assert!(SourceArgs::default().source().is_err());
    }

    #[test]
    fn empty_text_is_an_input_failure() {
        let cfg = RenderConfig::default();
        let opts = RenderOptions {
            weeks: 52,
            overflow: None,
            font: None,
            render: &cfg,
        };
        let err = render(
            &PatternSource::Text("   ".into()),
            &opts,
            &TemplateStore::builtin_only(),
        )
        .unwrap_err();
        assert_eq!(err.downcast_ref::<Failure>(), Some(&Failure::Input));
    }

    #[test]
    fn missing_image_is_an_input_failure() {
        let cfg = RenderConfig::default();
        let opts = RenderOptions {
            weeks: 52,
            overflow: None,
            font: None,
            render: &cfg,
        };
        let err = render(
            &PatternSource::Image("/no/such/file.png".into()),
            &opts,
            &TemplateStore::builtin_only(),
        )
        .unwrap_err();
        assert_eq!(err.downcast_ref::<Failure>(), Some(&Failure::Input));
    }

    #[test]
    fn templates_render_through_store() {
        let cfg = RenderConfig::default();
        let opts = RenderOptions {
            weeks: 52,
            overflow: None,
            font: None,
            render: &cfg,
        };
        let r = render(
            &PatternSource::Template("heart".into()),
            &opts,
            &TemplateStore::builtin_only(),
        )
        .unwrap();
        assert_eq!(r.grid.weeks(), 52);
        assert!(r.grid.active_count() > 0);
    }
}
