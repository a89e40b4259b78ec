use indicatif::{ProgressBar, ProgressStyle};
use std::ops::Deref;

use crate::utils::LOG_PREFIX_INFO;

/// A bar counting `target_value` items, styled like the log output.
///
/// The bar is driven from the calling thread: call `inc` after each item and
/// `finish_and_clear` once done.
pub fn new_progress_bar(target_value: u64, prefix: &str) -> ProgressBar {
    let mut template_str = String::new();
    template_str.push_str(&format!("{} ", LOG_PREFIX_INFO.deref()));
    template_str.push_str("{spinner:.green} ");
    template_str.push_str("[{elapsed_precise}] {prefix} ");
    template_str.push_str("{bar:32.cyan/blue} {pos} / {len} {wide_msg}");

    let style = ProgressStyle::default_bar()
        .template(&template_str)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let progress_bar = ProgressBar::new(target_value);
    progress_bar.set_style(style);
    progress_bar.set_prefix(prefix.to_owned());
    progress_bar
}
