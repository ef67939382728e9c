//! Crate entry point for **contrib-art**.
//!
//! The library turns images, text and templates into a grid of intensity
//! levels, maps the grid onto calendar dates and creates backdated empty
//! commits so the pattern shows up on a GitHub contribution graph.
//!
//! Each submodule encapsulates one responsibility; the `pub use` re-exports
//! make the commands accessible from the crate root for `main.rs`.

pub mod account;
pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod github;
pub mod grid;
pub mod logging;
pub mod paths;
pub mod pattern;
pub mod preview;
mod progress;
pub mod push;
pub mod schedule;
pub mod source;
pub mod template;
pub mod wizard;

pub use account::{cmd_login, cmd_logout};
pub use config::{Config, cmd_config_edit, ensure_default_config, load_config};
pub use error::{Failure, exit_code_for};
pub use logging::init_logging;
pub use paths::{contrib_art_home, paths};
pub use preview::{PreviewArgs, cmd_preview};
pub use push::{PushArgs, cmd_push};
pub use template::{cmd_templates_export, cmd_templates_import, cmd_templates_list};
pub use wizard::cmd_wizard;
