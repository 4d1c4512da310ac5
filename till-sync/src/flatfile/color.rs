//! Color-string normalizer
//!
//! The back office stores button colors in several historical forms: hex,
//! a semantic `R=.. G=.. B=..` form, and free text with three channel
//! numbers buried in it.

use regex::Regex;
use std::sync::OnceLock;

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

/// Normalize a raw color string.
///
/// Hex values pass through; any string carrying three ordered channel
/// numbers in 0–255 (which covers the `R=.. G=.. B=..` form) becomes
/// `rgb(r, g, b)`; anything else is returned trimmed. Empty input is `None`.
pub fn parse_color(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if hex_re().is_match(trimmed) {
        return Some(trimmed.to_string());
    }

    let channels: Vec<u32> = number_re()
        .find_iter(trimmed)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if channels.len() >= 3 && channels[..3].iter().all(|&n| n <= 255) {
        return Some(format!(
            "rgb({}, {}, {})",
            channels[0], channels[1], channels[2]
        ));
    }

    Some(trimmed.to_string())
}
