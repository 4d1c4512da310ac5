//! Built catalog collections

use serde::{Deserialize, Serialize};

use crate::models::{Department, Menu, Operator, Product, ProductGroup, Table, Tender, VatRate};

/// Everything the catalog builder reconstructs from one file set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub groups: Vec<ProductGroup>,
    pub departments: Vec<Department>,
    pub products: Vec<Product>,
    pub menus: Vec<Menu>,
    pub tenders: Vec<Tender>,
    pub vat_rates: Vec<VatRate>,
    pub tables: Vec<Table>,
    pub operators: Vec<Operator>,
}

impl Catalog {
    /// Merge a freshly built catalog into this one at whole-collection
    /// granularity: a non-empty fresh collection replaces the stored one, an
    /// empty one leaves the stored one untouched. Used by incremental sync.
    pub fn merge_from(&mut self, fresh: Catalog) {
        fn replace_if_nonempty<T>(stored: &mut Vec<T>, fresh: Vec<T>) {
            if !fresh.is_empty() {
                *stored = fresh;
            }
        }

        replace_if_nonempty(&mut self.groups, fresh.groups);
        replace_if_nonempty(&mut self.departments, fresh.departments);
        replace_if_nonempty(&mut self.products, fresh.products);
        replace_if_nonempty(&mut self.menus, fresh.menus);
        replace_if_nonempty(&mut self.tenders, fresh.tenders);
        replace_if_nonempty(&mut self.vat_rates, fresh.vat_rates);
        replace_if_nonempty(&mut self.tables, fresh.tables);
        replace_if_nonempty(&mut self.operators, fresh.operators);
    }
}
