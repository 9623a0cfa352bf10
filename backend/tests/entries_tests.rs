//! Entry book tests
//!
//! Tests for row-level inventory entries including:
//! - Replace by natural key
//! - Delete by natural key
//! - Scoped listing in insertion order

use branch_ledger_backend::db;
use branch_ledger_backend::services::EntryService;
use chrono::NaiveDate;
use shared::{DateRange, Entry, EntryKey, EntryScope, LineItem};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn service() -> EntryService {
    EntryService::new(db::connect_in_memory().await.unwrap())
}

fn onion(day: u32, quantity: i64) -> Entry {
    Entry::new(
        date(2025, 8, day),
        "Mayon",
        "Commissary",
        LineItem::new("Produce", "Onion")
            .with_quantity(quantity, "kg")
            .with_amount(quantity * 50),
    )
    .in_group("Raw Materials")
}

#[tokio::test]
async fn test_save_and_list() {
    let service = service().await;
    service.save_entry(&onion(4, 3)).await.unwrap();

    let entries = service
        .list_entries(&EntryScope::on(date(2025, 8, 4), "Mayon", "Commissary"))
        .await
        .unwrap();

    assert_eq!(entries, vec![onion(4, 3)]);
}

/// Saving the same item twice replaces it in place
#[tokio::test]
async fn test_save_replaces_by_natural_key() {
    let service = service().await;
    let garlic = Entry::new(
        date(2025, 8, 4),
        "Mayon",
        "Commissary",
        LineItem::new("Produce", "Garlic").with_quantity(1, "kg"),
    )
    .in_group("Raw Materials");

    let first = service.save_entry(&onion(4, 3)).await.unwrap();
    service.save_entry(&garlic).await.unwrap();
    let replaced = service.save_entry(&onion(4, 5)).await.unwrap();

    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.created_at, first.created_at);
    assert!(replaced.updated_at >= first.updated_at);

    let entries = service
        .list_entries(&EntryScope::on(date(2025, 8, 4), "Mayon", "Commissary"))
        .await
        .unwrap();
    let items: Vec<&str> = entries.iter().map(|e| e.line.item.as_str()).collect();

    assert_eq!(items, vec!["Onion", "Garlic"]);
    assert_eq!(entries[0].line.quantity.value(), 5.0);
}

#[tokio::test]
async fn test_load_and_delete_entry() {
    let service = service().await;
    service.save_entry(&onion(4, 3)).await.unwrap();
    let key = EntryKey::new(date(2025, 8, 4), "Mayon", "Commissary", Some("Raw Materials"), "Onion");

    assert!(service.load_entry(&key).await.unwrap().is_some());
    assert_eq!(service.delete_entry(&key).await.unwrap(), 1);
    assert!(service.load_entry(&key).await.unwrap().is_none());
    assert_eq!(service.delete_entry(&key).await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_entries_scope() {
    let service = service().await;
    for day in 4..=8 {
        service.save_entry(&onion(day, i64::from(day))).await.unwrap();
    }
    let non_food = Entry::new(
        date(2025, 8, 5),
        "Mayon",
        "Commissary",
        LineItem::new("Cleaning", "Dish Soap").with_quantity(2, "btl"),
    )
    .in_group("Non Food");
    service.save_entry(&non_food).await.unwrap();

    let range = DateRange::new(date(2025, 8, 5), date(2025, 8, 7));
    let all_groups = service
        .list_entries(&EntryScope::between(range, "Mayon", "Commissary"))
        .await
        .unwrap();
    assert_eq!(all_groups.len(), 4);

    let raw_only = service
        .list_entries(&EntryScope::between(range, "Mayon", "Commissary").group("Raw Materials"))
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = raw_only.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date(2025, 8, 5), date(2025, 8, 6), date(2025, 8, 7)]);

    let other_branch = service
        .list_entries(&EntryScope::between(range, "One Balete", "Commissary"))
        .await
        .unwrap();
    assert!(other_branch.is_empty());
}

#[tokio::test]
async fn test_labels_are_normalized() {
    let service = service().await;
    let mut entry = onion(4, 3);
    entry.branch = "  Mayon ".to_string();
    service.save_entry(&entry).await.unwrap();
    service.save_entry(&onion(4, 7)).await.unwrap();

    let entries = service
        .list_entries(&EntryScope::on(date(2025, 8, 4), "Mayon", "Commissary"))
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].line.quantity.value(), 7.0);
}
