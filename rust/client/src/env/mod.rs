pub mod browser;
pub mod http;

use itertools::Itertools;

/// Text frame: where we are, what we are after, and what can be done next.
pub(crate) fn ansi_frame(url: &str, instruction: &str, actions: &[String]) -> String {
    let actions = actions
        .iter()
        .enumerate()
        .map(|(i, label)| format!("[{i}] {label}"))
        .join("\n");

    format!("{url}\n{instruction}\n{actions}")
}
