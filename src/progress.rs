//! Terminal styles for the push flow. Templates are fixed strings, so
//! building them cannot fail at runtime.

use indicatif::ProgressStyle;

const TICKS: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Shown while checking the account, preparing the work repository and pushing.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&TICKS)
}

/// Dates processed out of dates pending; the message names the current date.
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "\x1b[33m{spinner}\x1b[0m [{bar:32.green/white}] {pos}/{len} dates {wide_msg}",
    )
    .unwrap()
    .tick_strings(&[&TICKS[..], &["✔"][..]].concat())
    .progress_chars("█▓░")
}

pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}
