//! Table-tab persistence
//!
//! Converts UI basket state into legacy CSV rows (the inverse of the
//! flat-file parsers), persists them locally across two shapes — a flat
//! cache keyed by table id and per-table upload folders — and pushes the
//! folder payload to the remote store.

mod rows;
mod storage;
mod store;

pub use rows::{
    LINE_ENDING, TAB_HEADER, TAB_HEADER_FLAT, VariantRegistry, parse_rows, serialize_rows,
    synthesize_row, vat_amount,
};
pub use storage::{FsTabStorage, MemoryTabStorage, TabStorage};
pub use store::TableTabStore;
