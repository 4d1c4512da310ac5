//! Price-option extraction from PLU `KEY=VALUE` bodies

use std::collections::HashSet;

use shared::models::PriceOption;

use super::KvFile;

const PRICE_PREFIX: &str = "PRICE_";

/// Extract the ordered price options from a parsed PLU file.
///
/// Scans keys matching `PRICE_*` in source order. The label is the key
/// remainder with underscores as spaces, lower-cased, defaulting to
/// `standard`. Promo-labeled entries are dropped. The sentinel values
/// `not set` / `open` (case-insensitive) become the `NOT SET` / `OPEN`
/// options with price 0, bypassing numeric validation. Every other value
/// must parse as a finite number >= 0, and a zero price is accepted only
/// for `standard`. Output is sorted ascending by price and deduplicated by
/// source key, first occurrence winning.
pub fn parse_price_options(kv: &KvFile) -> Vec<PriceOption> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut options: Vec<PriceOption> = Vec::new();

    for (key, value) in kv.iter() {
        let Some(rest) = key.strip_prefix(PRICE_PREFIX) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }

        let mut label = rest.replace('_', " ").trim().to_lowercase();
        if label.is_empty() {
            label = "standard".to_string();
        }
        if label.contains("promo") {
            continue;
        }

        let value = value.trim();
        let (label, price) = if value.eq_ignore_ascii_case("not set") {
            ("NOT SET".to_string(), 0.0)
        } else if value.eq_ignore_ascii_case("open") {
            ("OPEN".to_string(), 0.0)
        } else {
            let Ok(price) = value.parse::<f64>() else {
                tracing::warn!(key = %key, value = %value, "Skipping unparsable price option");
                continue;
            };
            if !price.is_finite() || price < 0.0 {
                tracing::warn!(key = %key, value = %value, "Skipping invalid price option");
                continue;
            }
            if price == 0.0 && label != "standard" {
                continue;
            }
            (label, price)
        };

        options.push(PriceOption {
            key: key.to_string(),
            label,
            price,
        });
    }

    options.sort_by(|a, b| a.price.total_cmp(&b.price));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatfile::parse_kv;

    #[test]
    fn extracts_and_orders_options_excluding_promo() {
        let kv = parse_kv("PRICE_STANDARD=4.50\nPRICE_DOUBLE=8\nPRICE_PROMO=3\n");
        let options = parse_price_options(&kv);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "standard");
        assert_eq!(options[0].price, 4.50);
        assert_eq!(options[1].label, "double");
        assert_eq!(options[1].price, 8.0);
    }

    #[test]
    fn sentinels_are_first_class() {
        let kv = parse_kv("PRICE_STANDARD=OPEN\nPRICE_LARGE=Not Set\n");
        let options = parse_price_options(&kv);
        assert_eq!(options.len(), 2);
        assert!(options.iter().any(|o| o.label == "OPEN" && o.price == 0.0));
        assert!(options.iter().any(|o| o.label == "NOT SET" && o.price == 0.0));
    }

    #[test]
    fn zero_price_only_for_standard() {
        let kv = parse_kv("PRICE_STANDARD=0\nPRICE_LARGE=0\n");
        let options = parse_price_options(&kv);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "standard");
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let kv = parse_kv("PRICE_STANDARD=4.50\nPRICE_STANDARD=9.00\n");
        let options = parse_price_options(&kv);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].price, 4.50);
    }

    #[test]
    fn underscores_become_spaces_in_labels() {
        let kv = parse_kv("PRICE_EXTRA_LARGE=9.75\n");
        let options = parse_price_options(&kv);
        assert_eq!(options[0].label, "extra large");
    }

    #[test]
    fn garbage_values_are_skipped() {
        let kv = parse_kv("PRICE_STANDARD=abc\nPRICE_LARGE=-2\nPRICE_SMALL=2.25\n");
        let options = parse_price_options(&kv);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "small");
    }
}
