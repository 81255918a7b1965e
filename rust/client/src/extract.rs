//! Pattern-matching extraction of the discrete action set from raw page source.
//!
//! The set is built from the markup text, not a DOM: every
//! `action="..."` attribute comes first, then every product link, and only
//! site-relative targets (leading `/`) survive.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::OnceLock;

/// Characters left untouched when a target is re-encoded: the unreserved set plus `/`.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

const SEGMENT_ELIDE_OVER: usize = 20;
const SEGMENT_KEEP: usize = 10;

fn form_action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"action="(.*?)""#).expect("valid form action regex"))
}

fn product_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"class="product-link" href="(.*?)""#).expect("valid product link regex")
    })
}

/// Clickable targets of the page, ready to be requested relative to the site root.
pub fn click_urls(html: &str) -> Vec<String> {
    form_action_re()
        .captures_iter(html)
        .chain(product_link_re().captures_iter(html))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|url| url.starts_with('/'))
        .map(normalize_target)
        .collect()
}

/// Decode percent escapes and HTML entities, then percent-encode again so that
/// every target reaches the server in one canonical form.
///
/// Only entities terminated by `;` are decoded. Legacy forms such as `&amp`
/// without the semicolon are kept verbatim.
pub fn normalize_target(raw: &str) -> String {
    let unquoted = percent_decode_str(raw).decode_utf8_lossy();
    let unescaped = html_escape::decode_html_entities(&unquoted);
    quote(&unescaped)
}

pub fn quote(s: &str) -> String {
    utf8_percent_encode(s, PATH_SAFE).to_string()
}

/// Make a url readable by eliding the middle of long path segments.
pub fn clean_url(url: &str) -> String {
    url.split('/')
        .map(|part| {
            let len = part.chars().count();
            if len > SEGMENT_ELIDE_OVER {
                let head: String = part.chars().take(SEGMENT_KEEP).collect();
                let tail: String = part.chars().skip(len - SEGMENT_KEEP).collect();
                format!("{head}...{tail}")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
