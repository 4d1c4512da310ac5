//! Per-table order persistence

use std::collections::{BTreeMap, HashMap};

use shared::tab::{BasketLine, SLOT_COUNT, TableDataRow, TableStatus};

use super::rows::{
    LINE_ENDING, TAB_HEADER, TAB_HEADER_FLAT, VariantRegistry, format_row, parse_rows,
    serialize_rows, synthesize_row, timestamp_now,
};
use super::storage::TabStorage;
use crate::error::{TabError, TabResult};
use crate::remote::RemoteFileStore;

/// Flat local cache of every open table's rows, keyed by the embedded
/// `Table ID` column. Exists for fast status lookups; the per-table folder
/// files are the actual upload payload.
const FLAT_FILE: &str = "tabledata_all.csv";

fn table_id(area: &str, table: &str) -> String {
    format!("{area}_{table}")
}

fn table_dir(area: &str, table: &str) -> String {
    format!("TABDATA/{area}/{table}")
}

fn slot_filename(slot: usize) -> String {
    if slot == 0 {
        "tabledata.csv".to_string()
    } else {
        format!("tabledata{}.csv", slot + 1)
    }
}

/// Maintains the CSV state of open table orders — main bill plus up to four
/// split bills per table — across a local storage backend and the remote
/// store.
///
/// Local writes always precede the remote push and are never rolled back on
/// remote failure: local durable state is the source of truth, remote is
/// best-effort. Callers must not issue two concurrent saves for one table.
pub struct TableTabStore<S, R> {
    storage: S,
    remote: R,
    site_id: String,
    variants: VariantRegistry,
}

impl<S: TabStorage, R: RemoteFileStore> TableTabStore<S, R> {
    pub fn new(storage: S, remote: R, site_id: impl Into<String>) -> Self {
        Self {
            storage,
            remote,
            site_id: site_id.into(),
            variants: VariantRegistry::default(),
        }
    }

    /// Register a custom variant label for row synthesis.
    pub fn register_variant(&mut self, label: impl Into<String>, token: impl Into<String>) {
        self.variants.register(label, token);
    }

    /// Save the main bill of a table, preserving its existing split bills.
    pub async fn save_table_order(
        &self,
        area: &str,
        table: &str,
        lines: &[BasketLine],
    ) -> TabResult<()> {
        let added_at = timestamp_now();
        let mut slots = self.load_slots(area, table)?;
        slots[0] = lines
            .iter()
            .map(|l| synthesize_row(l, &self.variants, &added_at))
            .collect();
        self.persist_slots(area, table, &slots).await
    }

    /// Rewrite all five slot files of a table from the given bills.
    ///
    /// An empty bill still produces a header-only CSV, never an absent
    /// file, so the remote side can tell "emptied" from "never existed".
    pub async fn save_split_bills_to_table(
        &self,
        area: &str,
        table: &str,
        bills: &[Vec<BasketLine>; SLOT_COUNT],
    ) -> TabResult<()> {
        let added_at = timestamp_now();
        let slots = bills.each_ref().map(|bill| {
            bill.iter()
                .map(|l| synthesize_row(l, &self.variants, &added_at))
                .collect::<Vec<_>>()
        });
        self.persist_slots(area, table, &slots).await
    }

    /// Remove all local rows for a table and push the emptied state.
    pub async fn clear_table(&self, area: &str, table: &str) -> TabResult<()> {
        self.rewrite_flat(area, table, None)?;
        let dir = table_dir(area, table);
        for slot in 0..SLOT_COUNT {
            self.storage.remove(&format!("{dir}/{}", slot_filename(slot)))?;
        }

        let empty = serialize_rows(&[], None, TAB_HEADER);
        let mut upload = BTreeMap::new();
        for slot in 0..SLOT_COUNT {
            upload.insert(slot_filename(slot), empty.clone());
        }
        self.push_remote(area, table, &upload).await
    }

    /// Clear a table after its sale completed.
    pub async fn complete_sale(&self, area: &str, table: &str) -> TabResult<()> {
        tracing::info!(area = %area, table = %table, "Completing sale, clearing table data");
        self.clear_table(area, table).await
    }

    /// Current rows of a table, one vector per slot.
    pub fn load_table_order(
        &self,
        area: &str,
        table: &str,
    ) -> TabResult<[Vec<TableDataRow>; SLOT_COUNT]> {
        self.load_slots(area, table)
    }

    /// Answer has-data / subtotal / presence-lock for each requested table
    /// in a single pass over the flat cache, regardless of how many tables
    /// are asked about.
    pub fn get_all_table_statuses(
        &self,
        tables: &[(String, String)],
    ) -> TabResult<Vec<TableStatus>> {
        let mut totals: HashMap<String, (bool, f64)> = HashMap::new();
        for (area, table) in tables {
            totals.insert(table_id(area, table), (false, 0.0));
        }

        if let Some(content) = self.storage.read(FLAT_FILE)? {
            for (row, id) in parse_rows(&content, true) {
                if let Some(id) = id
                    && let Some(entry) = totals.get_mut(&id)
                {
                    entry.0 = true;
                    entry.1 += row.price;
                }
            }
        }

        let mut statuses = Vec::with_capacity(tables.len());
        for (area, table) in tables {
            let (has_data, subtotal) = totals[&table_id(area, table)];
            let locked = self
                .storage
                .exists(&format!("{}/tableopen.ini", table_dir(area, table)))?;
            statuses.push(TableStatus {
                area: area.clone(),
                table: table.clone(),
                has_data,
                subtotal,
                locked,
            });
        }
        Ok(statuses)
    }

    // ========== Internals ==========

    fn load_slots(
        &self,
        area: &str,
        table: &str,
    ) -> TabResult<[Vec<TableDataRow>; SLOT_COUNT]> {
        let dir = table_dir(area, table);
        let mut slots: [Vec<TableDataRow>; SLOT_COUNT] = Default::default();
        for (slot, rows) in slots.iter_mut().enumerate() {
            if let Some(content) = self.storage.read(&format!("{dir}/{}", slot_filename(slot)))? {
                *rows = parse_rows(&content, false)
                    .into_iter()
                    .map(|(row, _)| row)
                    .collect();
            }
        }
        Ok(slots)
    }

    /// Write the five slot files and the flat cache, then push to the
    /// remote store. The remote error, if any, surfaces only after every
    /// local write has already succeeded.
    async fn persist_slots(
        &self,
        area: &str,
        table: &str,
        slots: &[Vec<TableDataRow>; SLOT_COUNT],
    ) -> TabResult<()> {
        let dir = table_dir(area, table);
        let mut upload = BTreeMap::new();
        for (slot, rows) in slots.iter().enumerate() {
            let content = serialize_rows(rows, None, TAB_HEADER);
            self.storage
                .write(&format!("{dir}/{}", slot_filename(slot)), &content)?;
            upload.insert(slot_filename(slot), content);
        }

        self.rewrite_flat(area, table, Some(slots))?;
        self.push_remote(area, table, &upload).await
    }

    /// Replace this table's rows in the flat cache wholesale; `None` drops
    /// them without replacement.
    fn rewrite_flat(
        &self,
        area: &str,
        table: &str,
        slots: Option<&[Vec<TableDataRow>; SLOT_COUNT]>,
    ) -> TabResult<()> {
        let id = table_id(area, table);
        let mut kept: Vec<(TableDataRow, Option<String>)> = self
            .storage
            .read(FLAT_FILE)?
            .map(|content| parse_rows(&content, true))
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, row_id)| row_id.as_deref() != Some(id.as_str()))
            .collect();

        if let Some(slots) = slots {
            for rows in slots {
                for row in rows {
                    kept.push((row.clone(), Some(id.clone())));
                }
            }
        }

        let mut out = String::from(TAB_HEADER_FLAT);
        out.push_str(LINE_ENDING);
        for (row, row_id) in &kept {
            out.push_str(&format_row(row, row_id.as_deref()));
            out.push_str(LINE_ENDING);
        }
        self.storage.write(FLAT_FILE, &out)?;
        Ok(())
    }

    async fn push_remote(
        &self,
        area: &str,
        table: &str,
        files: &BTreeMap<String, String>,
    ) -> TabResult<()> {
        // Legacy Windows path convention for the upload destination.
        let destination = format!("TABDATA\\{area}\\{table}");
        self.remote
            .upload_files(&self.site_id, &destination, files)
            .await
            .map_err(|e| {
                tracing::error!(
                    area = %area,
                    table = %table,
                    error = %e,
                    "Remote table sync failed; local state is kept"
                );
                TabError::RemoteSync(e)
            })
    }
}
