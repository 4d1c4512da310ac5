//! Row synthesis and the legacy CSV wire dialect
//!
//! The back office keys order lines by a synthesized PLU filename and
//! expects variant prefixes baked into the product name, exact decimal
//! widths and a leading space on the product column. Everything here must
//! match that dialect byte-for-byte.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use shared::tab::{BasketLine, TableDataRow};

use crate::flatfile::write_csv_row;

/// Upload-payload header (per-table slot files).
pub const TAB_HEADER: &str = "X,Product,Price,PLUFile,Group,Department,VATCode,VATPercentage,VATAmount,Added By,Time/Date Added,PRINTER 1,PRINTER 2,PRINTER 3,Item Printed?";

/// Flat local-cache header: same columns plus the embedded table id.
pub const TAB_HEADER_FLAT: &str = "X,Product,Price,PLUFile,Group,Department,VATCode,VATPercentage,VATAmount,Added By,Time/Date Added,PRINTER 1,PRINTER 2,PRINTER 3,Item Printed?,Table ID";

/// The legacy importer reads CRLF; both the local cache and the upload
/// payload use it so the two writers cannot drift apart.
pub const LINE_ENDING: &str = "\r\n";

const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Row timestamp in the dialect's local-time format.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

/// Maps UI variant labels to the legacy filename-prefix tokens the importer
/// expects baked into product names.
#[derive(Debug, Clone)]
pub struct VariantRegistry {
    tokens: HashMap<String, String>,
}

impl Default for VariantRegistry {
    fn default() -> Self {
        let mut tokens = HashMap::new();
        for (label, token) in [
            ("half", "1/2"),
            ("double", "DOUBLE"),
            ("small", "SMALL"),
            ("large", "LARGE"),
            ("schooner", "SCHOONER"),
            ("open", "OPEN"),
            ("125ml", "125ML"),
            ("175ml", "175ML"),
            ("250ml", "250ML"),
        ] {
            tokens.insert(label.to_string(), token.to_string());
        }
        Self { tokens }
    }
}

impl VariantRegistry {
    /// Register a custom variant label.
    pub fn register(&mut self, label: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(label.into().to_lowercase(), token.into());
    }

    /// Prefix `name` with the variant's token, unless the name already
    /// starts with it. Unregistered labels leave the name untouched.
    pub fn apply(&self, name: &str, variant: Option<&str>) -> String {
        let Some(label) = variant else {
            return name.to_string();
        };
        let Some(token) = self.tokens.get(&label.to_lowercase()) else {
            tracing::debug!(variant = %label, "Unregistered variant label, leaving name as is");
            return name.to_string();
        };
        if name
            .to_ascii_uppercase()
            .starts_with(&token.to_ascii_uppercase())
        {
            name.to_string()
        } else {
            format!("{token} {name}")
        }
    }
}

/// Synthesize the wire row for one basket line.
///
/// The PLU filename is rebuilt from the numeric group/department codes and
/// the product index — never taken from the product object — because the
/// back office keys lines by this exact format. VAT is back-calculated
/// from the gross line price.
pub fn synthesize_row(
    line: &BasketLine,
    registry: &VariantRegistry,
    added_at: &str,
) -> TableDataRow {
    TableDataRow {
        quantity: line.quantity,
        product: registry.apply(&line.product_name, line.variant.as_deref()),
        price: line.price,
        plu_file: format!(
            "{:03}-{:03}-{:05}.PLU",
            line.group_code, line.department_code, line.product_index
        ),
        group: line.group_name.clone(),
        department: line.department_name.clone(),
        vat_code: line.vat_code.clone(),
        vat_percentage: line.vat_percentage,
        vat_amount: vat_amount(line.price, line.vat_percentage),
        added_by: line.added_by.clone(),
        added_at: added_at.to_string(),
        printer1: line.printer1.clone(),
        printer2: line.printer2.clone(),
        printer3: line.printer3.clone(),
        printed: if line.printed { "YES" } else { "NO" }.to_string(),
    }
}

/// VAT share of a gross price: `price - price / (1 + vat% / 100)`,
/// rounded to 2 decimal places.
pub fn vat_amount(price: f64, vat_percentage: f64) -> f64 {
    let price = Decimal::from_f64(price).unwrap_or_default();
    let vat = Decimal::from_f64(vat_percentage).unwrap_or_default();
    let divisor = Decimal::ONE + vat / Decimal::ONE_HUNDRED;
    if divisor.is_zero() {
        return 0.0;
    }
    (price - price / divisor)
        .round_dp(2)
        .to_f64()
        .unwrap_or(0.0)
}

/// Serialize one row: quantity to 3 decimals, money to 2, product with one
/// leading space. The table id column is appended only for the flat cache.
pub fn format_row(row: &TableDataRow, table_id: Option<&str>) -> String {
    let mut fields = vec![
        format!("{:.3}", row.quantity),
        format!(" {}", row.product),
        format!("{:.2}", row.price),
        row.plu_file.clone(),
        row.group.clone(),
        row.department.clone(),
        row.vat_code.clone(),
        format!("{:.2}", row.vat_percentage),
        format!("{:.2}", row.vat_amount),
        row.added_by.clone(),
        row.added_at.clone(),
        row.printer1.clone(),
        row.printer2.clone(),
        row.printer3.clone(),
        row.printed.clone(),
    ];
    if let Some(id) = table_id {
        fields.push(id.to_string());
    }
    write_csv_row(&fields)
}

/// Serialize a slot file: header plus rows, CRLF-terminated. An empty slot
/// still yields the header line, never an empty file.
pub fn serialize_rows(rows: &[TableDataRow], table_id: Option<&str>, header: &str) -> String {
    let mut out = String::with_capacity(header.len() + 2 + rows.len() * 96);
    out.push_str(header);
    out.push_str(LINE_ENDING);
    for row in rows {
        out.push_str(&format_row(row, table_id));
        out.push_str(LINE_ENDING);
    }
    out
}

/// Parse a slot or flat-cache file back into rows. The header row is
/// skipped; short rows are dropped.
pub fn parse_rows(content: &str, with_table_id: bool) -> Vec<(TableDataRow, Option<String>)> {
    let parsed = crate::flatfile::parse_csv(content);
    let mut rows = Vec::new();

    for fields in parsed.iter().skip(1) {
        if fields.len() < 15 {
            continue;
        }
        let num = |i: usize| fields[i].trim().parse::<f64>().unwrap_or(0.0);
        let row = TableDataRow {
            quantity: num(0),
            product: fields[1]
                .strip_prefix(' ')
                .unwrap_or(&fields[1])
                .to_string(),
            price: num(2),
            plu_file: fields[3].clone(),
            group: fields[4].clone(),
            department: fields[5].clone(),
            vat_code: fields[6].clone(),
            vat_percentage: num(7),
            vat_amount: num(8),
            added_by: fields[9].clone(),
            added_at: fields[10].clone(),
            printer1: fields[11].clone(),
            printer2: fields[12].clone(),
            printer3: fields[13].clone(),
            printed: fields[14].clone(),
        };
        let table_id = if with_table_id {
            fields.get(15).cloned()
        } else {
            None
        };
        rows.push((row, table_id));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: f64) -> BasketLine {
        BasketLine {
            product_name: name.to_string(),
            quantity: 1.0,
            price,
            vat_code: "A".to_string(),
            vat_percentage: 20.0,
            group_code: 2,
            group_name: "002 - DRINK".to_string(),
            department_code: 10,
            department_name: "010 - Soft Drinks".to_string(),
            product_index: 10901,
            variant: None,
            added_by: "Alex".to_string(),
            printer1: String::new(),
            printer2: String::new(),
            printer3: String::new(),
            printed: false,
        }
    }

    #[test]
    fn vat_is_back_calculated_from_gross() {
        assert_eq!(vat_amount(12.0, 20.0), 2.0);
        assert_eq!(vat_amount(4.50, 0.0), 0.0);
    }

    #[test]
    fn plu_filename_is_synthesized_zero_padded() {
        let row = synthesize_row(&line("Cola", 2.20), &VariantRegistry::default(), "ts");
        assert_eq!(row.plu_file, "002-010-10901.PLU");
    }

    #[test]
    fn variant_prefix_applies_once() {
        let registry = VariantRegistry::default();
        assert_eq!(registry.apply("Lager", Some("half")), "1/2 Lager");
        assert_eq!(registry.apply("1/2 Lager", Some("half")), "1/2 Lager");
        assert_eq!(registry.apply("House Red", Some("175ml")), "175ML House Red");
        assert_eq!(registry.apply("Lager", None), "Lager");
    }

    #[test]
    fn custom_variant_registration() {
        let mut registry = VariantRegistry::default();
        registry.register("Taster", "TST");
        assert_eq!(registry.apply("Stout", Some("taster")), "TST Stout");
        // Unregistered labels leave the name alone.
        assert_eq!(registry.apply("Stout", Some("bucket")), "Stout");
    }

    #[test]
    fn format_matches_wire_dialect() {
        let mut row = synthesize_row(&line("Cola", 2.20), &VariantRegistry::default(), "ts");
        row.quantity = 2.0;
        let formatted = format_row(&row, None);
        assert_eq!(
            formatted,
            "2.000, Cola,2.20,002-010-10901.PLU,002 - DRINK,010 - Soft Drinks,A,20.00,0.37,Alex,ts,,,,NO"
        );
    }

    #[test]
    fn rows_round_trip_through_serialize_and_parse() {
        let registry = VariantRegistry::default();
        let rows: Vec<TableDataRow> = vec![
            synthesize_row(&line("Cola", 2.20), &registry, "01/08/2026 12:00:00"),
            synthesize_row(&line("Fish, Chips & Peas", 11.45), &registry, "01/08/2026 12:00:01"),
        ];
        let content = serialize_rows(&rows, Some("BAR_5"), TAB_HEADER_FLAT);
        assert!(content.starts_with(TAB_HEADER_FLAT));
        assert!(content.ends_with(LINE_ENDING));

        let parsed = parse_rows(&content, true);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, rows[0]);
        assert_eq!(parsed[1].0.product, "Fish, Chips & Peas");
        assert_eq!(parsed[1].1.as_deref(), Some("BAR_5"));
    }

    #[test]
    fn empty_slot_serializes_to_header_only() {
        let content = serialize_rows(&[], None, TAB_HEADER);
        assert_eq!(content, format!("{TAB_HEADER}{LINE_ENDING}"));
        assert!(parse_rows(&content, false).is_empty());
    }
}
