//! Deterministic catalog builder

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use shared::Catalog;
use shared::models::{
    Department, Menu, MenuEntry, Operator, PriceOption, Product, ProductGroup, Table, Tender,
    VatRate,
};
use shared::util::name_color;

use super::SourceFile;
use crate::flatfile::{
    FileCategory, file_stem, final_segment, parse_color, parse_csv, parse_kv, parse_price_options,
};

/// Error-correction journal the back office leaves next to real PLU files.
/// Never part of the catalog.
const ERROR_CORRECT_MARKER: &str = "ERRORCORRECT.PLU";

const DEFAULT_VAT_PERCENTAGE: f64 = 20.0;

fn plu_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^PLUDATA/([^/]+)/([^/]+)/(\d{3}-\d{3}-[^/]*\.PLU)$").unwrap()
    })
}

fn plu_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\d{3}-\d{3}-.*\.PLU$").unwrap())
}

fn menu_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:MENU)?(\d+)$").unwrap())
}

/// Build the full catalog from a downloaded file set.
pub fn build_catalog(files: &[SourceFile]) -> Catalog {
    let files: Vec<&SourceFile> = files
        .iter()
        .filter(|f| !f.path.to_ascii_uppercase().contains(ERROR_CORRECT_MARKER))
        .collect();

    let vat_rates = build_vat_rates(&files);
    let (groups, departments, hierarchy) = discover_hierarchy(&files);
    // The menu-referenced filename set must exist before products are parsed:
    // it rescues non-sellable products that a menu still points at.
    let (menus, referenced) = build_menus(&files);
    let products = build_products(&files, &hierarchy, &vat_rates, &referenced);
    let tenders = build_tenders(&files);
    let tables = build_tables(&files);
    let operators = build_operators(&files);

    tracing::info!(
        groups = groups.len(),
        departments = departments.len(),
        products = products.len(),
        menus = menus.len(),
        tenders = tenders.len(),
        vat_rates = vat_rates.len(),
        tables = tables.len(),
        operators = operators.len(),
        "Catalog built"
    );

    Catalog {
        groups,
        departments,
        products,
        menus,
        tenders,
        vat_rates,
        tables,
        operators,
    }
}

// ========== Group / department discovery ==========

type HierarchyIndex = HashMap<(String, String), (u32, u32)>;

/// Register groups and departments from the first two path segments under
/// `PLUDATA/`, in first-seen order. Groups are sorted alphabetically for
/// output; departments keep discovery order. Ids are regenerated per build.
fn discover_hierarchy(
    files: &[&SourceFile],
) -> (Vec<ProductGroup>, Vec<Department>, HierarchyIndex) {
    let mut group_names: Vec<String> = Vec::new();
    let mut dept_names: Vec<(String, String)> = Vec::new();
    let mut seen_groups: HashSet<String> = HashSet::new();
    let mut seen_depts: HashSet<(String, String)> = HashSet::new();

    for file in files {
        let mut segments = file.path.split('/');
        if !segments
            .next()
            .is_some_and(|root| root.eq_ignore_ascii_case("PLUDATA"))
        {
            continue;
        }
        let (Some(group), rest) = (segments.next(), segments.next()) else {
            continue;
        };
        if group.trim().is_empty() {
            tracing::warn!(path = %file.path, "Skipping path with an empty group segment");
            continue;
        }
        // `group` is only a folder when at least one more segment follows.
        if rest.is_none() {
            continue;
        }
        if seen_groups.insert(group.to_string()) {
            group_names.push(group.to_string());
        }
        // `rest` is only a department folder when a filename follows it.
        if let (Some(dept), Some(_)) = (rest, segments.next())
            && !dept.trim().is_empty()
            && seen_depts.insert((group.to_string(), dept.to_string()))
        {
            dept_names.push((group.to_string(), dept.to_string()));
        }
    }

    group_names.sort();
    let groups: Vec<ProductGroup> = group_names
        .iter()
        .enumerate()
        .map(|(i, name)| ProductGroup {
            id: i as u32 + 1,
            name: name.clone(),
        })
        .collect();

    let group_ids: HashMap<&str, u32> = groups.iter().map(|g| (g.name.as_str(), g.id)).collect();

    let mut departments = Vec::new();
    let mut hierarchy = HierarchyIndex::new();
    for (i, (group, dept)) in dept_names.iter().enumerate() {
        let Some(&group_id) = group_ids.get(group.as_str()) else {
            tracing::warn!(group = %group, department = %dept, "Dropping orphan department");
            continue;
        };
        let id = i as u32 + 1;
        departments.push(Department {
            id,
            group_id,
            name: dept.clone(),
        });
        hierarchy.insert((group.clone(), dept.clone()), (group_id, id));
    }

    (groups, departments, hierarchy)
}

// ========== Menus ==========

/// Parse menu CSVs and collect the set of menu-referenced PLU filenames
/// (upper-cased, `BACK.PLU` excluded).
fn build_menus(files: &[&SourceFile]) -> (Vec<Menu>, HashSet<String>) {
    let mut menus = Vec::new();
    let mut referenced: HashSet<String> = HashSet::new();

    for file in files {
        if file.category != FileCategory::Menu {
            continue;
        }
        let stem = file_stem(&file.path);
        let Some(number) = menu_name_re()
            .captures(stem)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            tracing::debug!(path = %file.path, "Ignoring non-menu CSV");
            continue;
        };

        let rows = parse_csv(&file.content);
        let mut entries: Vec<MenuEntry> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut close_button = false;

        // Header row is always present and always skipped.
        for row in rows.iter().skip(1) {
            let Some(raw_path) = row.get(1) else {
                continue;
            };
            let filename = final_segment(raw_path.trim());
            if filename.is_empty() {
                continue;
            }
            if filename.eq_ignore_ascii_case("BACK.PLU") {
                close_button = true;
                continue;
            }
            // Price/size overlay files share the folder; only real PLU
            // filenames become menu products.
            if !plu_filename_re().is_match(filename) {
                continue;
            }

            let product_name = row
                .first()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| file_stem(filename).to_string());
            if !seen_names.insert(product_name.to_lowercase()) {
                continue;
            }

            referenced.insert(filename.to_ascii_uppercase());
            entries.push(MenuEntry {
                product_name,
                filename: filename.to_string(),
                hotcode: row
                    .get(2)
                    .map(|h| h.trim())
                    .filter(|h| !h.is_empty())
                    .map(str::to_string),
                color: row.get(3).and_then(|c| parse_color(c)),
            });
        }

        if close_button && !entries.is_empty() {
            entries.push(MenuEntry::back_button());
        }

        menus.push(Menu {
            number,
            name: stem.to_string(),
            entries,
        });
    }

    menus.sort_by_key(|m| m.number);
    (menus, referenced)
}

// ========== Products ==========

fn is_falsy(token: &str) -> bool {
    matches!(
        token.trim().to_ascii_uppercase().as_str(),
        "NO" | "N" | "FALSE" | "0" | "OFF"
    )
}

fn build_products(
    files: &[&SourceFile],
    hierarchy: &HierarchyIndex,
    vat_rates: &[VatRate],
    referenced: &HashSet<String>,
) -> Vec<Product> {
    let mut products = Vec::new();
    let mut next_id = 1u32;

    for file in files {
        if file.category != FileCategory::Plu {
            continue;
        }
        let Some(caps) = plu_path_re().captures(&file.path) else {
            continue;
        };
        let group = caps.get(1).map_or("", |m| m.as_str());
        let dept = caps.get(2).map_or("", |m| m.as_str());
        let filename = caps.get(3).map_or("", |m| m.as_str());

        let Some(&(group_id, department_id)) =
            hierarchy.get(&(group.to_string(), dept.to_string()))
        else {
            tracing::warn!(path = %file.path, "Dropping product outside the discovered hierarchy");
            continue;
        };

        let kv = parse_kv(&file.content);

        let sellable = kv.get("SELLABLE?").map_or(true, |v| !is_falsy(v));
        if !sellable && !referenced.contains(&filename.to_ascii_uppercase()) {
            tracing::debug!(filename = %filename, "Skipping non-sellable product with no menu reference");
            continue;
        }

        let mut prices = parse_price_options(&kv);
        if prices.is_empty() {
            // Some very old PLU files carry only a sentinel in the standard
            // slot and nothing parseable elsewhere.
            match kv.get("PRICE_STANDARD").map(str::trim) {
                Some(v) if v.eq_ignore_ascii_case("open") => prices.push(PriceOption {
                    key: "PRICE_STANDARD".to_string(),
                    label: "OPEN".to_string(),
                    price: 0.0,
                }),
                Some(v) if v.eq_ignore_ascii_case("not set") => prices.push(PriceOption {
                    key: "PRICE_STANDARD".to_string(),
                    label: "NOT SET".to_string(),
                    price: 0.0,
                }),
                _ => {
                    tracing::warn!(filename = %filename, "Dropping product with unresolvable price list");
                    continue;
                }
            }
        }

        let name = kv
            .get("NAME")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(filename).to_string());

        let vat_code = kv
            .get("VATCODE")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let vat_percentage = resolve_vat(vat_code.as_deref(), &kv, vat_rates);

        products.push(Product {
            id: next_id,
            name,
            group_id,
            department_id,
            prices,
            vat_code,
            vat_percentage,
            color: kv
                .get("COLOUR")
                .or_else(|| kv.get("COLOR"))
                .and_then(parse_color),
            hotcode: kv.get("HOTCODE").map(str::to_string),
            barcode: kv.get("BARCODE").map(str::to_string),
            filename: filename.to_string(),
            sellable,
        });
        next_id += 1;
    }

    products
}

/// The VAT table wins over the in-file percentage; the in-file value wins
/// over the 20% default.
fn resolve_vat(code: Option<&str>, kv: &crate::flatfile::KvFile, vat_rates: &[VatRate]) -> f64 {
    if let Some(code) = code
        && let Some(rate) = vat_rates
            .iter()
            .find(|r| r.code.eq_ignore_ascii_case(code))
    {
        return rate.percentage;
    }
    kv.get("VATPERCENTAGE")
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_VAT_PERCENTAGE)
}

// ========== Tenders ==========

fn build_tenders(files: &[&SourceFile]) -> Vec<Tender> {
    let mut tenders = Vec::new();

    for file in files {
        if file.category != FileCategory::Tender {
            continue;
        }
        let kv = parse_kv(&file.content);
        let name = kv
            .get("TENDER_NAME")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(&file.path).to_string());
        tenders.push(Tender {
            id: tenders.len() as u32 + 1,
            color: name_color(&name),
            name,
        });
    }

    tenders
}

/// Fallback tender pair for sites with no `TENDERDATA` at all.
///
/// Applied by the engine on a full rebuild, never during an incremental
/// merge — an incremental slice that happens to contain no tender files
/// must not replace real stored tenders with this pair.
pub fn default_tenders() -> Vec<Tender> {
    vec![
        Tender {
            id: 1,
            name: "Cash".to_string(),
            color: "#4caf50".to_string(),
        },
        Tender {
            id: 2,
            name: "Card".to_string(),
            color: "#2196f3".to_string(),
        },
    ]
}

// ========== Tables ==========

fn build_tables(files: &[&SourceFile]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for file in files {
        if file.category != FileCategory::TableData {
            continue;
        }
        let segments: Vec<&str> = file.path.split('/').collect();
        // TABDATA/<area>/<table>/<file>
        if segments.len() < 4 {
            continue;
        }
        // `.ini` control files (presence locks etc.) do not establish a table.
        if segments
            .last()
            .is_some_and(|f| f.to_ascii_lowercase().ends_with(".ini"))
        {
            continue;
        }
        let area = segments[1].to_string();
        let name = segments[2].to_string();
        if area.is_empty() || name.is_empty() || !seen.insert((area.clone(), name.clone())) {
            continue;
        }
        tables.push(Table {
            id: tables.len() as u32 + 1,
            color: name_color(&format!("{area}_{name}")),
            name,
            area,
        });
    }

    tables
}

// ========== VAT rates ==========

fn build_vat_rates(files: &[&SourceFile]) -> Vec<VatRate> {
    let mut rates: Vec<VatRate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for file in files {
        if file.category != FileCategory::VatRate {
            continue;
        }
        let kv = parse_kv(&file.content);
        let code = kv
            .get("CODE")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(&file.path).to_string());
        if !seen.insert(code.to_ascii_uppercase()) {
            continue;
        }
        let percentage = kv
            .get("RATE")
            .or_else(|| kv.get("PERCENTAGE"))
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or_else(|| {
                tracing::warn!(code = %code, "VAT rate file without a usable percentage");
                0.0
            });
        rates.push(VatRate { code, percentage });
    }

    rates
}

// ========== Operators ==========

fn build_operators(files: &[&SourceFile]) -> Vec<Operator> {
    let mut operators = Vec::new();

    for file in files {
        if file.category != FileCategory::Operator {
            continue;
        }
        let kv = parse_kv(&file.content);
        let name = kv
            .get("OPERATOR_NAME")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(&file.path).to_string());
        operators.push(Operator {
            id: operators.len() as u32 + 1,
            name,
            code: kv.get("OPERATOR_CODE").map(str::to_string),
        });
    }

    operators
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(path: &str, content: &str) -> SourceFile {
        SourceFile::new(path, content)
    }

    fn plu(path: &str, name: &str, price: &str) -> SourceFile {
        src(
            path,
            &format!("NAME={name}\nPRICE_STANDARD={price}\nVATCODE=A\n"),
        )
    }

    #[test]
    fn single_plu_yields_linked_group_and_department() {
        let files = vec![plu(
            "PLUDATA/002 - DRINK/010 - Soft Drinks/002-010-10901.PLU",
            "Cola",
            "2.20",
        )];
        let catalog = build_catalog(&files);

        assert_eq!(catalog.groups.len(), 1);
        assert_eq!(catalog.departments.len(), 1);
        assert_eq!(catalog.groups[0].name, "002 - DRINK");
        assert_eq!(catalog.departments[0].name, "010 - Soft Drinks");
        assert_eq!(catalog.departments[0].group_id, catalog.groups[0].id);

        assert_eq!(catalog.products.len(), 1);
        let product = &catalog.products[0];
        assert_eq!(product.name, "Cola");
        assert_eq!(product.group_id, catalog.groups[0].id);
        assert_eq!(product.department_id, catalog.departments[0].id);
        assert_eq!(product.filename, "002-010-10901.PLU");
    }

    #[test]
    fn groups_sorted_departments_in_discovery_order() {
        let files = vec![
            plu("PLUDATA/005 - FOOD/020 - Mains/005-020-00001.PLU", "Pie", "9.00"),
            plu("PLUDATA/002 - DRINK/010 - Soft/002-010-00001.PLU", "Cola", "2.20"),
            plu("PLUDATA/002 - DRINK/011 - Beer/002-011-00001.PLU", "Lager", "4.50"),
        ];
        let catalog = build_catalog(&files);

        let group_names: Vec<&str> = catalog.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(group_names, vec!["002 - DRINK", "005 - FOOD"]);
        let dept_names: Vec<&str> = catalog.departments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(dept_names, vec!["020 - Mains", "010 - Soft", "011 - Beer"]);
    }

    #[test]
    fn errorcorrect_files_are_excluded_everywhere() {
        let files = vec![
            plu("PLUDATA/002 - DRINK/010 - Soft/002-010-00001.PLU", "Cola", "2.20"),
            src("PLUDATA/002 - DRINK/010 - Soft/ERRORCORRECT.PLU", "NAME=junk\n"),
        ];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.products.len(), 1);
        assert_eq!(catalog.products[0].name, "Cola");
    }

    #[test]
    fn non_sellable_product_needs_a_menu_reference() {
        let body = "NAME=Staff Meal\nSELLABLE?=NO\nPRICE_STANDARD=1.00\n";
        let path = "PLUDATA/005 - FOOD/020 - Mains/005-020-00042.PLU";

        let without_menu = vec![src(path, body)];
        assert!(build_catalog(&without_menu).products.is_empty());

        let with_menu = vec![
            src(path, body),
            src(
                "MENUDATA/MENU1.CSV",
                "Button,Path,Hotcode,Colour\r\nStaff Meal,C:\\POS\\PLUDATA\\005-020-00042.PLU,,\r\n",
            ),
        ];
        let catalog = build_catalog(&with_menu);
        assert_eq!(catalog.products.len(), 1);
        assert!(!catalog.products[0].sellable);
    }

    #[test]
    fn menu_parses_back_button_and_dedupes_by_name() {
        let menu = "Button,Path,Hotcode,Colour\r\n\
                    Lager,C:\\POS\\PLUDATA\\002-011-00001.PLU,H1,R=255 G=0 B=0\r\n\
                    LAGER,C:\\POS\\PLUDATA\\002-011-00002.PLU,,\r\n\
                    ,C:\\POS\\PLUDATA\\BACK.PLU,,\r\n\
                    ,C:\\POS\\PLUDATA\\PRICELEVELS.CSV,,\r\n";
        let files = vec![src("MENUDATA/MENU2.CSV", menu)];
        let catalog = build_catalog(&files);

        assert_eq!(catalog.menus.len(), 1);
        let m = &catalog.menus[0];
        assert_eq!(m.number, 2);
        // One real product (case-insensitive dedup) plus the synthetic back button.
        assert_eq!(m.entries.len(), 2);
        assert_eq!(m.entries[0].product_name, "Lager");
        assert_eq!(m.entries[0].hotcode.as_deref(), Some("H1"));
        assert_eq!(m.entries[0].color.as_deref(), Some("rgb(255, 0, 0)"));
        assert!(m.entries[1].is_back_button());
    }

    #[test]
    fn back_button_alone_yields_no_entries() {
        let menu = "Button,Path\r\n,C:\\POS\\PLUDATA\\BACK.PLU\r\n";
        let catalog = build_catalog(&[src("MENUDATA/3.CSV", menu)]);
        assert_eq!(catalog.menus.len(), 1);
        assert!(catalog.menus[0].entries.is_empty());
    }

    #[test]
    fn vat_table_wins_over_in_file_percentage() {
        let files = vec![
            src("VATDATA/A.VATCODE", "CODE=a\nRATE=5\n"),
            src(
                "PLUDATA/005 - FOOD/020 - Mains/005-020-00001.PLU",
                "NAME=Pie\nPRICE_STANDARD=9.00\nVATCODE=A\nVATPERCENTAGE=20\n",
            ),
        ];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.products[0].vat_percentage, 5.0);
    }

    #[test]
    fn vat_falls_back_to_in_file_then_default() {
        let in_file = src(
            "PLUDATA/005 - FOOD/020 - Mains/005-020-00001.PLU",
            "NAME=Pie\nPRICE_STANDARD=9.00\nVATCODE=Z\nVATPERCENTAGE=12.5\n",
        );
        let catalog = build_catalog(&[in_file]);
        assert_eq!(catalog.products[0].vat_percentage, 12.5);

        let bare = src(
            "PLUDATA/005 - FOOD/020 - Mains/005-020-00002.PLU",
            "NAME=Chips\nPRICE_STANDARD=3.00\n",
        );
        let catalog = build_catalog(&[bare]);
        assert_eq!(catalog.products[0].vat_percentage, DEFAULT_VAT_PERCENTAGE);
    }

    #[test]
    fn sentinel_only_product_survives_via_fallback() {
        let files = vec![src(
            "PLUDATA/005 - FOOD/020 - Mains/005-020-00009.PLU",
            "NAME=Market Fish\nPRICE_STANDARD=Open\n",
        )];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.products.len(), 1);
        assert!(catalog.products[0].prices[0].is_open());
    }

    #[test]
    fn priceless_product_is_dropped() {
        let files = vec![src(
            "PLUDATA/005 - FOOD/020 - Mains/005-020-00010.PLU",
            "NAME=Ghost\n",
        )];
        assert!(build_catalog(&files).products.is_empty());
    }

    #[test]
    fn tenders_hash_to_stable_colors_and_default_when_absent() {
        let files = vec![
            src("TENDERDATA/CASH.TENDER", "TENDER_NAME=Cash\n"),
            src("TENDERDATA/VOUCHER.TENDER", ""),
        ];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.tenders.len(), 2);
        assert_eq!(catalog.tenders[0].name, "Cash");
        assert_eq!(catalog.tenders[0].color, name_color("Cash"));
        // Name falls back to the filename stem.
        assert_eq!(catalog.tenders[1].name, "VOUCHER");

        // The builder itself never invents tenders; the fallback pair is a
        // separate, engine-applied step.
        assert!(build_catalog(&[]).tenders.is_empty());
        let names: Vec<String> = default_tenders().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Cash", "Card"]);
    }

    #[test]
    fn tables_discovered_once_excluding_ini_markers() {
        let files = vec![
            src("TABDATA/BAR/5/tabledata.csv", ""),
            src("TABDATA/BAR/5/tabledata2.csv", ""),
            src("TABDATA/BAR/6/tableopen.ini", ""),
            src("TABDATA/RESTAURANT/1/tabledata.csv", ""),
        ];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.tables.len(), 2);
        assert_eq!(catalog.tables[0].area, "BAR");
        assert_eq!(catalog.tables[0].name, "5");
        assert_eq!(catalog.tables[0].color, name_color("BAR_5"));
        assert_eq!(catalog.tables[1].area, "RESTAURANT");
    }

    #[test]
    fn operators_parse_with_stem_fallback() {
        let files = vec![
            src("OPERATORDATA/1.OPERATOR", "OPERATOR_NAME=Alex\nOPERATOR_CODE=11\n"),
            src("OPERATORDATA/SAM.OPERATOR", ""),
        ];
        let catalog = build_catalog(&files);
        assert_eq!(catalog.operators.len(), 2);
        assert_eq!(catalog.operators[0].name, "Alex");
        assert_eq!(catalog.operators[0].code.as_deref(), Some("11"));
        assert_eq!(catalog.operators[1].name, "SAM");
    }
}
