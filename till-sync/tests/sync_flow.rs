//! End-to-end sync and tab flows over the in-memory remote store, with the
//! durable redb / filesystem backends where persistence matters.

use shared::tab::{BasketLine, SLOT_COUNT};
use till_sync::kv::RedbKvStore;
use till_sync::remote::MemoryRemoteStore;
use till_sync::tabs::{FsTabStorage, TAB_HEADER, TableTabStore};
use till_sync::{EngineConfig, SyncEngine, SyncMode};

fn seed_site(remote: &MemoryRemoteStore) {
    remote.put_file("VATDATA/A.VATCODE", "CODE=A\nRATE=20\n", Some("1"));
    remote.put_file("VATDATA/B.VATCODE", "CODE=B\nRATE=5\n", Some("1"));

    remote.put_file(
        "PLUDATA/002 - DRINK/010 - Soft Drinks/002-010-10901.PLU",
        "NAME=Cola\nPRICE_STANDARD=2.20\nVATCODE=A\nSELLABLE?=YES\n",
        Some("1"),
    );
    remote.put_file(
        "PLUDATA/002 - DRINK/011 - Beer/002-011-00042.PLU",
        "NAME=Lager\nPRICE_STANDARD=4.50\nPRICE_HALF=2.25\nVATCODE=A\n",
        Some("1"),
    );
    remote.put_file(
        "PLUDATA/005 - FOOD/020 - Mains/005-020-00007.PLU",
        "NAME=Staff Meal\nSELLABLE?=NO\nPRICE_STANDARD=1.00\nVATCODE=B\n",
        Some("1"),
    );

    remote.put_file(
        "MENUDATA/MENU1.CSV",
        "Button,Path,Hotcode,Colour\r\n\
         Lager,C:\\POS\\PLUDATA\\002-011-00042.PLU,,\r\n\
         Staff Meal,C:\\POS\\PLUDATA\\005-020-00007.PLU,,\r\n\
         ,C:\\POS\\PLUDATA\\BACK.PLU,,\r\n",
        Some("1"),
    );

    remote.put_file("TENDERDATA/CASH.TENDER", "TENDER_NAME=Cash\n", Some("1"));
    remote.put_file("TENDERDATA/CARD.TENDER", "TENDER_NAME=Card\n", Some("1"));

    remote.put_file("OPERATORDATA/1.OPERATOR", "OPERATOR_NAME=Alex\n", Some("1"));

    remote.put_file("TABDATA/BAR/5/tabledata.csv", "", Some("1"));
    remote.put_file("TABDATA/BAR/6/tabledata.csv", "", Some("1"));

    // Noise the filter must drop.
    remote.put_file("PLUDATA/002 - DRINK/010 - Soft Drinks/ERRORCORRECT.PLU", "X=1\n", Some("1"));
    remote.put_file("MENUDATA/MENU1.CSV.bak", "old\n", Some("1"));
    remote.put_file("LOGS/today.txt", "noise\n", Some("1"));
}

#[tokio::test]
async fn full_sync_reconstructs_catalog_and_persists_to_redb() {
    let dir = tempfile::tempdir().unwrap();
    let kv_path = dir.path().join("sync.redb");

    let remote = MemoryRemoteStore::new();
    seed_site(&remote);

    let engine = SyncEngine::new(
        remote.clone(),
        RedbKvStore::open(&kv_path).unwrap(),
        EngineConfig::new("site-1"),
    );
    let report = engine.sync(SyncMode::Full).await.unwrap();
    assert_eq!(report.failed, 0);
    // Everything except the three filtered-out noise files.
    assert_eq!(report.fetched, 11);

    let catalog = engine.catalog().unwrap();
    assert_eq!(catalog.groups.len(), 2);
    assert_eq!(catalog.departments.len(), 3);
    // The non-sellable staff meal survives through its menu reference.
    assert_eq!(catalog.products.len(), 3);
    assert!(
        catalog
            .products
            .iter()
            .any(|p| p.name == "Staff Meal" && !p.sellable)
    );
    // VAT resolved through the rate table.
    let lager = catalog.products.iter().find(|p| p.name == "Lager").unwrap();
    assert_eq!(lager.vat_percentage, 20.0);
    assert_eq!(lager.prices.len(), 2);
    assert_eq!(lager.prices[0].label, "half");

    assert_eq!(catalog.menus.len(), 1);
    // Two real products plus the synthetic back button.
    assert_eq!(catalog.menus[0].entries.len(), 3);
    assert_eq!(catalog.tenders.len(), 2);
    assert_eq!(catalog.vat_rates.len(), 2);
    assert_eq!(catalog.tables.len(), 2);
    assert_eq!(catalog.operators.len(), 1);

    // A fresh engine over the same redb file sees the synced catalog.
    let reopened = SyncEngine::new(
        remote,
        RedbKvStore::open(&kv_path).unwrap(),
        EngineConfig::new("site-1"),
    );
    assert_eq!(reopened.catalog().unwrap().products.len(), 3);
    assert!(reopened.last_sync_millis().unwrap().is_some());
}

#[tokio::test]
async fn incremental_sync_is_additive_and_idempotent() {
    let remote = MemoryRemoteStore::new();
    seed_site(&remote);

    let dir = tempfile::tempdir().unwrap();
    let engine = SyncEngine::new(
        remote.clone(),
        RedbKvStore::open(dir.path().join("sync.redb")).unwrap(),
        EngineConfig::new("site-1"),
    );
    engine.sync(SyncMode::Full).await.unwrap();
    remote.reset_fetch_count();

    // Price change on one file only.
    remote.put_file(
        "PLUDATA/002 - DRINK/010 - Soft Drinks/002-010-10901.PLU",
        "NAME=Cola\nPRICE_STANDARD=2.40\nVATCODE=A\n",
        Some("2"),
    );

    let report = engine.sync(SyncMode::Incremental).await.unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(remote.fetch_count(), 1);

    let catalog = engine.catalog().unwrap();
    let cola = catalog.products.iter().find(|p| p.name == "Cola").unwrap();
    assert_eq!(cola.prices[0].price, 2.40);
    // Collections the slice did not cover are untouched.
    assert_eq!(catalog.tenders.len(), 2);
    assert_eq!(catalog.menus.len(), 1);

    // Re-running with nothing changed is a no-op.
    let report = engine.sync(SyncMode::Incremental).await.unwrap();
    assert!(report.no_changes);
    assert_eq!(remote.fetch_count(), 1);
}

#[tokio::test]
async fn table_order_flow_on_filesystem_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FsTabStorage::new(dir.path().join("tabs")).unwrap();
    let remote = MemoryRemoteStore::new();
    let store = TableTabStore::new(storage, remote.clone(), "site-1");

    let lager = BasketLine {
        product_name: "Lager".to_string(),
        quantity: 2.0,
        price: 9.00,
        vat_code: "A".to_string(),
        vat_percentage: 20.0,
        group_code: 2,
        group_name: "002 - DRINK".to_string(),
        department_code: 11,
        department_name: "011 - Beer".to_string(),
        product_index: 42,
        variant: None,
        added_by: "Alex".to_string(),
        printer1: String::new(),
        printer2: String::new(),
        printer3: String::new(),
        printed: false,
    };

    store.save_table_order("BAR", "5", &[lager]).await.unwrap();

    // Upload hit the legacy backslash destination with all five slots.
    let uploaded = remote.uploaded("TABDATA\\BAR\\5").unwrap();
    assert_eq!(uploaded.len(), SLOT_COUNT);
    assert!(uploaded["tabledata.csv"].contains("002-011-00042.PLU"));

    // Reload from disk and check the row survived byte-level round-trip.
    let slots = store.load_table_order("BAR", "5").unwrap();
    assert_eq!(slots[0].len(), 1);
    assert_eq!(slots[0][0].quantity, 2.0);
    assert_eq!(slots[0][0].vat_amount, 1.50);

    let statuses = store
        .get_all_table_statuses(&[("BAR".to_string(), "5".to_string())])
        .unwrap();
    assert!(statuses[0].has_data);
    assert_eq!(statuses[0].subtotal, 9.00);

    store.complete_sale("BAR", "5").await.unwrap();
    let statuses = store
        .get_all_table_statuses(&[("BAR".to_string(), "5".to_string())])
        .unwrap();
    assert!(!statuses[0].has_data);
    let cleared = remote.uploaded("TABDATA\\BAR\\5").unwrap();
    assert!(cleared["tabledata.csv"].starts_with(TAB_HEADER));
    assert!(!cleared["tabledata.csv"].contains("Lager"));
}
