//! Behaviour every `InventoryStore` must share. Each case runs against the
//! SQLite store (in-memory database) and the in-memory store. SQLite-only
//! transaction checks follow the shared cases.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use stockkeep_core::{DomainError, ProductId};
use stockkeep_infra::{InventoryError, InventoryStore, SqliteInventoryStore};
use stockkeep_inventory::{AddedWindow, RegisterProduct, ReportDate, SellProduct, UnitPrice};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 15, 0).unwrap()
}

fn price(s: &str) -> UnitPrice {
    s.parse().unwrap()
}

fn register(name: &str, quantity: i64, when: DateTime<Utc>) -> RegisterProduct {
    RegisterProduct::new(name, quantity, price("2.50"), when)
}

fn domain(err: InventoryError) -> DomainError {
    match err {
        InventoryError::Domain(e) => e,
        other => panic!("expected domain error, got {other:?}"),
    }
}

async fn widget_sale_scenario(store: &dyn InventoryStore) {
    let widget = store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();

    let receipt = store
        .sell_product(&SellProduct::new(widget.id, 3, at(2024, 1, 1)))
        .await
        .unwrap();
    assert_eq!(receipt.remaining, 7);
    assert_eq!(receipt.sale.quantity_sold, 3);
    assert_eq!(receipt.sale.product_id, widget.id);
    assert_eq!(receipt.sale.sold_at, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 7);
    let sales = store.sales_for_product(widget.id).await.unwrap();
    assert_eq!(sales, vec![receipt.sale.clone()]);

    let report = store
        .daily_report(ReportDate::from_parts(1, 1, 2024).unwrap(), AddedWindow::OnDay)
        .await
        .unwrap();
    assert_eq!(report.items_sold, 3);
    assert_eq!(report.items_added, 10);
}

async fn oversell_leaves_state_untouched(store: &dyn InventoryStore) {
    let widget = store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .sell_product(&SellProduct::new(widget.id, 3, at(2024, 1, 1)))
        .await
        .unwrap();

    let err = store
        .sell_product(&SellProduct::new(widget.id, 100, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert_eq!(
        domain(err),
        DomainError::InsufficientStock {
            product_id: widget.id,
            requested: 100,
            available: 7,
        }
    );

    assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 7);
    assert_eq!(store.sales_for_product(widget.id).await.unwrap().len(), 1);
}

async fn selling_exact_stock_reaches_zero(store: &dyn InventoryStore) {
    let lot = store
        .register_product(&register("Bolt", 4, at(2024, 3, 5)))
        .await
        .unwrap();
    let receipt = store
        .sell_product(&SellProduct::new(lot.id, 4, at(2024, 3, 5)))
        .await
        .unwrap();
    assert_eq!(receipt.remaining, 0);

    let err = store
        .sell_product(&SellProduct::new(lot.id, 1, at(2024, 3, 5)))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::InsufficientStock { available: 0, .. }));
}

async fn unknown_product_sale_is_not_found(store: &dyn InventoryStore) {
    let missing = ProductId::new(999);
    let err = store
        .sell_product(&SellProduct::new(missing, 1, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert_eq!(domain(err), DomainError::NotFound(missing));

    let err = store.sales_for_product(missing).await.unwrap_err();
    assert_eq!(domain(err), DomainError::NotFound(missing));

    let report = store
        .daily_report(ReportDate::from_parts(1, 1, 2024).unwrap(), AddedWindow::OnDay)
        .await
        .unwrap();
    assert_eq!((report.items_sold, report.items_added), (0, 0));
}

async fn non_positive_sale_is_rejected(store: &dyn InventoryStore) {
    let widget = store
        .register_product(&register("Widget", 5, at(2024, 1, 1)))
        .await
        .unwrap();
    let err = store
        .sell_product(&SellProduct::new(widget.id, 0, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::Validation(_)));
    assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 5);
}

async fn invalid_registration_has_no_effect(store: &dyn InventoryStore) {
    let err = store
        .register_product(&register("  ", 5, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::Validation(_)));

    let err = store
        .register_product(&register("Widget", -5, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::Validation(_)));

    assert!(store.list_products().await.unwrap().is_empty());
}

async fn empty_date_reports_zero(store: &dyn InventoryStore) {
    store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();

    let report = store
        .daily_report(ReportDate::from_parts(15, 6, 2024).unwrap(), AddedWindow::OnDay)
        .await
        .unwrap();
    assert_eq!(report.items_added, 0);
    assert_eq!(report.items_sold, 0);
}

async fn cumulative_window_counts_earlier_registrations(store: &dyn InventoryStore) {
    let first = store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("Gadget", 5, at(2024, 1, 2)))
        .await
        .unwrap();
    store
        .register_product(&register("Gizmo", 100, at(2024, 1, 3)))
        .await
        .unwrap();
    store
        .sell_product(&SellProduct::new(first.id, 4, at(2024, 1, 2)))
        .await
        .unwrap();

    let jan2 = ReportDate::from_parts(2, 1, 2024).unwrap();

    let on_day = store.daily_report(jan2, AddedWindow::OnDay).await.unwrap();
    assert_eq!(on_day.items_added, 5);
    assert_eq!(on_day.items_sold, 4);

    let cumulative = store
        .daily_report(jan2, AddedWindow::UpToAndIncluding)
        .await
        .unwrap();
    assert_eq!(cumulative.items_added, 15);
    assert_eq!(cumulative.items_sold, 4);
    assert_eq!(cumulative.window, AddedWindow::UpToAndIncluding);
}

async fn search_matches_substring_case_insensitively(store: &dyn InventoryStore) {
    store
        .register_product(&register("Widget", 1, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("Gadget", 1, at(2024, 1, 1)))
        .await
        .unwrap();

    let found = store.search_products("wid").await.unwrap();
    let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Widget"]);

    let all = store.search_products("").await.unwrap();
    let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Widget", "Gadget"]);

    let blank = store.search_products("   ").await.unwrap();
    assert_eq!(blank.len(), 2);

    let none = store.search_products("sprocket").await.unwrap();
    assert!(none.is_empty());
}

async fn search_treats_wildcards_literally(store: &dyn InventoryStore) {
    store
        .register_product(&register("50% off bin", 1, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("500 washers", 1, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("Wire clamp", 1, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("snake_case cable", 1, at(2024, 1, 1)))
        .await
        .unwrap();

    let pct = store.search_products("50%").await.unwrap();
    assert_eq!(pct.len(), 1);
    assert_eq!(pct[0].name, "50% off bin");

    let underscore = store.search_products("e_c").await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].name, "snake_case cable");
}

async fn duplicate_names_are_distinct_lots(store: &dyn InventoryStore) {
    let a = store
        .register_product(&register("Widget", 1, at(2024, 1, 1)))
        .await
        .unwrap();
    let b = store
        .register_product(&register("Widget", 2, at(2024, 1, 1)))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);

    let listed = store.list_products().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, a.id);
    assert_eq!(listed[1].id, b.id);
}

async fn stored_product_round_trips(store: &dyn InventoryStore) {
    let when = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap()
        + chrono::Duration::nanoseconds(123_456_789);
    let registered = store
        .register_product(&RegisterProduct::new(" Hex key ", 12, price("0.075"), when))
        .await
        .unwrap();

    let loaded = store.get_product(registered.id).await.unwrap();
    assert_eq!(loaded, registered);
    assert_eq!(loaded.name, "Hex key");
    assert_eq!(loaded.registered_at, when);
    assert_eq!(loaded.unit_price, price("0.075"));
}

async fn get_unknown_product_is_not_found(store: &dyn InventoryStore) {
    let err = store.get_product(ProductId::new(7)).await.unwrap_err();
    assert_eq!(domain(err), DomainError::NotFound(ProductId::new(7)));
}

async fn purge_removes_everything(store: &dyn InventoryStore) {
    let widget = store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("Gadget", 3, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .sell_product(&SellProduct::new(widget.id, 2, at(2024, 1, 1)))
        .await
        .unwrap();

    let summary = store.purge_all().await.unwrap();
    assert_eq!(summary.products_deleted, 2);
    assert_eq!(summary.sales_deleted, 1);

    assert!(store.list_products().await.unwrap().is_empty());
    let report = store
        .daily_report(ReportDate::from_parts(1, 1, 2024).unwrap(), AddedWindow::UpToAndIncluding)
        .await
        .unwrap();
    assert_eq!((report.items_added, report.items_sold), (0, 0));
}

async fn report_total_overflow_is_an_error(store: &dyn InventoryStore) {
    store
        .register_product(&register("Bulk grain", i64::MAX, at(2024, 1, 1)))
        .await
        .unwrap();
    store
        .register_product(&register("Widget", 1, at(2024, 1, 1)))
        .await
        .unwrap();

    let err = store
        .daily_report(ReportDate::from_parts(1, 1, 2024).unwrap(), AddedWindow::OnDay)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Storage(_)), "{err:?}");
}

macro_rules! store_contract {
    ($($case:ident),* $(,)?) => {
        mod sqlite {
            $(
                #[tokio::test]
                async fn $case() {
                    let store = stockkeep_infra::SqliteInventoryStore::open_in_memory()
                        .await
                        .unwrap();
                    super::$case(&store).await;
                    store.close().await;
                }
            )*
        }

        mod in_memory {
            $(
                #[tokio::test]
                async fn $case() {
                    let store = stockkeep_infra::InMemoryInventoryStore::new();
                    super::$case(&store).await;
                }
            )*
        }
    };
}

store_contract!(
    widget_sale_scenario,
    oversell_leaves_state_untouched,
    selling_exact_stock_reaches_zero,
    unknown_product_sale_is_not_found,
    non_positive_sale_is_rejected,
    invalid_registration_has_no_effect,
    empty_date_reports_zero,
    cumulative_window_counts_earlier_registrations,
    search_matches_substring_case_insensitively,
    search_treats_wildcards_literally,
    duplicate_names_are_distinct_lots,
    stored_product_round_trips,
    get_unknown_product_is_not_found,
    purge_removes_everything,
    report_total_overflow_is_an_error,
);

#[tokio::test]
async fn failed_ledger_insert_rolls_back_stock() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteInventoryStore::with_pool(pool.clone()).await.unwrap();
    let widget = store
        .register_product(&register("Widget", 10, at(2024, 1, 1)))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_sales BEFORE INSERT ON sales \
         BEGIN SELECT RAISE(ABORT, 'ledger unavailable'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = store
        .sell_product(&SellProduct::new(widget.id, 3, at(2024, 1, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Storage(_)), "{err:?}");

    assert_eq!(store.get_product(widget.id).await.unwrap().quantity, 10);
    assert!(store.sales_for_product(widget.id).await.unwrap().is_empty());
    store.close().await;
}
