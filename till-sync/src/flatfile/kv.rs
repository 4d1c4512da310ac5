//! `KEY=VALUE` file parser

/// Parsed `KEY=VALUE` file, preserving source order.
///
/// Order matters downstream: price-option dedup keeps the first occurrence
/// of a key, so a plain map would lose information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvFile {
    entries: Vec<(String, String)>,
}

impl KvFile {
    /// First value recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a line-oriented `KEY=VALUE` body.
///
/// Blank lines and lines starting with `#` or `;` are ignored. Each line is
/// split on the first `=`; both sides are trimmed; values may contain
/// further `=` unescaped. Lines without `=` are skipped.
pub fn parse_kv(text: &str) -> KvFile {
    let mut entries = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some(eq) = line.find('=') else {
            continue;
        };
        let key = line[..eq].trim();
        if key.is_empty() {
            continue;
        }
        let value = line[eq + 1..].trim();
        entries.push((key.to_string(), value.to_string()));
    }

    KvFile { entries }
}
