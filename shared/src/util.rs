/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Deterministic hue for a name: base-31 rolling hash over the UTF-16 code
/// units, kept unsigned, mod 360. Identical names produce identical hues on
/// every device and every sync.
pub fn name_hue(name: &str) -> u32 {
    let mut hash: u32 = 0;
    for unit in name.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    hash % 360
}

/// HSL color string for a name, derived from [`name_hue`].
pub fn name_color(name: &str) -> String {
    format!("hsl({}, 70%, 45%)", name_hue(name))
}
