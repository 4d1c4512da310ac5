//! Flat-file parsers for the legacy till dialects
//!
//! Leaf utilities with no engine dependencies: `KEY=VALUE` files, the CSV
//! dialect, color strings and price-option extraction. All parsers are
//! total — malformed input degrades to defaults or dropped entries, never
//! to an error.

mod color;
mod csv;
mod kv;
mod price;

pub use color::parse_color;
pub use csv::{parse_csv, write_csv_row};
pub use kv::{KvFile, parse_kv};
pub use price::parse_price_options;

/// File kind, resolved once per manifest path.
///
/// Every consumer dispatches on this tag instead of re-matching path
/// prefixes in each parse function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// `PLUDATA/<group>/<dept>/*.PLU`
    Plu,
    /// `MENUDATA/*.CSV`
    Menu,
    /// `TENDERDATA/*.TENDER`
    Tender,
    /// `VATDATA/*.VATCODE`
    VatRate,
    /// `OPERATORDATA/*.OPERATOR`
    Operator,
    /// Anything under `TABDATA/`
    TableData,
    Other,
}

impl FileCategory {
    /// Classify a normalized (forward-slash) manifest path.
    pub fn classify(path: &str) -> Self {
        let folder = path.split('/').next().unwrap_or_default();
        match folder.to_ascii_uppercase().as_str() {
            "PLUDATA" if has_extension(path, "PLU") => FileCategory::Plu,
            "MENUDATA" if has_extension(path, "CSV") => FileCategory::Menu,
            "TENDERDATA" if has_extension(path, "TENDER") => FileCategory::Tender,
            "VATDATA" if has_extension(path, "VATCODE") => FileCategory::VatRate,
            "OPERATORDATA" if has_extension(path, "OPERATOR") => FileCategory::Operator,
            "TABDATA" => FileCategory::TableData,
            _ => FileCategory::Other,
        }
    }
}

fn has_extension(path: &str, ext: &str) -> bool {
    path.rsplit('.')
        .next()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Normalize a manifest path: backslashes become `/`, a leading `DATA/`
/// prefix (the back office's export root) is stripped.
pub fn normalize_path(raw: &str) -> String {
    let path = raw.replace('\\', "/");
    let path = path.trim_start_matches('/');
    let upper = path.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("DATA/") {
        path[path.len() - rest.len()..].to_string()
    } else {
        path.to_string()
    }
}

/// Final path segment (the filename).
pub fn final_segment(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Filename without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = final_segment(path);
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}
