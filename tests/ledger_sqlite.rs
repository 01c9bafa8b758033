//! SQLite ledger integration tests.
//!
//! Run with: cargo test --test ledger_sqlite
//!
//! Uses in-memory databases, no external dependencies required.

use std::sync::Arc;
use std::time::Duration;

use badge_ledger::config::{Config, StorageConfig};
use badge_ledger::model::MAX_QUANTITY;
use badge_ledger::storage::{connect_pool, SqliteLedger};
use badge_ledger::{ErrorKind, LedgerError, NewPrint, PrintLedger, PrintType, RosterEntry};

async fn memory_ledger() -> SqliteLedger {
    let pool = connect_pool(&Config::for_test().storage)
        .await
        .expect("Failed to open in-memory SQLite");
    let ledger = SqliteLedger::new(pool);
    ledger.init().await.expect("Failed to create schema");
    ledger
}

async fn install_trigger(ledger: &SqliteLedger, sql: &str) {
    sqlx::raw_sql(sql)
        .execute(ledger.pool())
        .await
        .expect("Failed to install trigger");
}

fn wine(item_id: i64, name: &str, number: i64, quantity: i64) -> NewPrint {
    NewPrint::new(PrintType::Wine, item_id, name, number, quantity)
}

#[tokio::test]
async fn test_seeded_company_becomes_printed() {
    let ledger = memory_ledger().await;
    ledger
        .seed_roster(&[RosterEntry::new(42, "Acme Wines", 3)])
        .await
        .unwrap();

    let before = ledger.badge_status().await.unwrap();
    assert_eq!(before.len(), 1);
    assert!(!before[0].is_printed);
    assert_eq!(before[0].quantity, 0);
    assert!(before[0].printed_at.is_none());

    ledger
        .record_print(NewPrint::new(PrintType::Badge, 42, "Acme Wines", 42, 3))
        .await
        .unwrap();

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].company_number, 42);
    assert!(status[0].is_printed);
    assert_eq!(status[0].quantity, 3);
    assert!(status[0].printed_at.is_some());

    let history = ledger.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, PrintType::Badge);
    assert_eq!(history[0].quantity, 3);
    assert_eq!(status[0].printed_at, Some(history[0].timestamp));
}

#[tokio::test]
async fn test_repeated_badge_prints_accumulate() {
    let ledger = memory_ledger().await;

    let first = ledger.record_print(NewPrint::badge(7, "Globex", 2)).await.unwrap();
    let second = ledger.record_print(NewPrint::badge(7, "Globex", 5)).await.unwrap();
    assert_ne!(first.id, second.id);

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert!(status[0].is_printed);
    assert_eq!(status[0].quantity, 7);
    assert_eq!(status[0].printed_at, Some(second.timestamp));

    let history = ledger.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);
}

#[tokio::test]
async fn test_quantity_matches_badge_history_sum() {
    let ledger = memory_ledger().await;
    let quantities = [1, 4, 2, 9, 1, 3];

    for (i, q) in quantities.iter().enumerate() {
        ledger.record_print(NewPrint::badge(11, "Initech", *q)).await.unwrap();
        // Noise on another company and another label type.
        ledger.record_print(NewPrint::badge(12, "Umbrella", 1)).await.unwrap();
        ledger
            .record_print(wine(i as i64, "Chablis", 11, 6))
            .await
            .unwrap();
    }

    let status = ledger.badge_status().await.unwrap();
    let initech = status.iter().find(|s| s.company_number == 11).unwrap();
    assert!(initech.is_printed);
    assert_eq!(initech.quantity, quantities.iter().sum::<i64>());

    let from_history: i64 = ledger
        .history()
        .await
        .unwrap()
        .iter()
        .filter(|e| e.kind == PrintType::Badge && e.item_number == 11)
        .map(|e| e.quantity)
        .sum();
    assert_eq!(initech.quantity, from_history);
}

#[tokio::test]
async fn test_first_print_creates_row_lazily() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(99, "Walk-in Ltd", 1)).await.unwrap();

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].company_name, "Walk-in Ltd");
    assert_eq!(status[0].quantity, 1);
}

#[tokio::test]
async fn test_reprint_refreshes_company_name() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(5, "Acme", 1)).await.unwrap();
    ledger.record_print(NewPrint::badge(5, "Acme Wines SA", 1)).await.unwrap();

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status[0].company_name, "Acme Wines SA");
    assert_eq!(status[0].quantity, 2);
}

#[tokio::test]
async fn test_non_badge_prints_leave_status_alone() {
    let ledger = memory_ledger().await;
    ledger.record_print(wine(3, "Riesling", 8, 12)).await.unwrap();
    ledger
        .record_print(NewPrint::employee(1, "Jane Doe", "Host", 1))
        .await
        .unwrap();

    assert!(ledger.badge_status().await.unwrap().is_empty());

    let history = ledger.history().await.unwrap();
    assert_eq!(history.len(), 2);
    let employee = history.iter().find(|e| e.kind == PrintType::Employee).unwrap();
    assert_eq!(employee.item_number, 0);
    assert_eq!(employee.item_name, "Jane Doe – Host");
}

#[tokio::test]
async fn test_status_ordered_by_company_number() {
    let ledger = memory_ledger().await;
    for n in [30, 4, 17] {
        ledger
            .record_print(NewPrint::badge(n, format!("Company {n}"), 1))
            .await
            .unwrap();
    }

    let numbers: Vec<i64> = ledger
        .badge_status()
        .await
        .unwrap()
        .iter()
        .map(|s| s.company_number)
        .collect();
    assert_eq!(numbers, vec![4, 17, 30]);
}

#[tokio::test]
async fn test_history_most_recent_first_and_monotonic() {
    let ledger = memory_ledger().await;
    let mut recorded = Vec::new();
    for i in 1..=5 {
        recorded.push(ledger.record_print(wine(i, "Merlot", i, 1)).await.unwrap());
    }

    for pair in recorded.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
        assert!(pair[0].id < pair[1].id);
    }

    let ids: Vec<i64> = ledger.history().await.unwrap().iter().map(|e| e.id).collect();
    let mut expected: Vec<i64> = recorded.iter().map(|e| e.id).collect();
    expected.reverse();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_search_matches_name_and_number() {
    let ledger = memory_ledger().await;
    ledger
        .seed_roster(&[
            RosterEntry::new(3, "Domaine Leflaive", 2),
            RosterEntry::new(13, "Acme Wines", 4),
            RosterEntry::new(21, "Bodega ACME", 1),
            RosterEntry::new(130, "100% Organic", 1),
        ])
        .await
        .unwrap();

    let by_name: Vec<i64> = ledger
        .search_badges("acme")
        .await
        .unwrap()
        .iter()
        .map(|s| s.company_number)
        .collect();
    assert_eq!(by_name, vec![13, 21]);

    let by_number: Vec<i64> = ledger
        .search_badges("13")
        .await
        .unwrap()
        .iter()
        .map(|s| s.company_number)
        .collect();
    assert_eq!(by_number, vec![13, 130]);

    let literal: Vec<i64> = ledger
        .search_badges("0%")
        .await
        .unwrap()
        .iter()
        .map(|s| s.company_number)
        .collect();
    assert_eq!(literal, vec![130]);

    assert!(ledger.search_badges("zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_badges_zeroes_in_place() {
    let ledger = memory_ledger().await;
    ledger
        .seed_roster(&[RosterEntry::new(1, "Acme", 2), RosterEntry::new(2, "Globex", 3)])
        .await
        .unwrap();
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    ledger.record_print(NewPrint::badge(9, "Walk-in", 1)).await.unwrap();
    ledger.record_print(wine(5, "Chablis", 12, 6)).await.unwrap();

    ledger.reset_badges().await.unwrap();

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 3);
    for row in &status {
        assert!(!row.is_printed);
        assert_eq!(row.quantity, 0);
        assert!(row.printed_at.is_none());
    }
    assert_eq!(status[0].company_name, "Acme");
    assert_eq!(status[2].company_name, "Walk-in");

    let history = ledger.history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, PrintType::Wine);

    // Printing after a reset starts counting from zero.
    ledger.record_print(NewPrint::badge(1, "Acme", 1)).await.unwrap();
    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status[0].quantity, 1);
    assert!(status[0].is_printed);
}

#[tokio::test]
async fn test_clear_history_keeps_badge_status() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    ledger.record_print(wine(5, "Chablis", 12, 6)).await.unwrap();

    ledger.clear_history().await.unwrap();

    assert!(ledger.history().await.unwrap().is_empty());
    let status = ledger.badge_status().await.unwrap();
    assert!(status[0].is_printed);
    assert_eq!(status[0].quantity, 2);
}

#[tokio::test]
async fn test_reset_all_clears_everything_but_identity() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    ledger.record_print(wine(5, "Chablis", 12, 6)).await.unwrap();

    ledger.reset_all().await.unwrap();

    assert!(ledger.history().await.unwrap().is_empty());
    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert!(!status[0].is_printed);
    assert_eq!(status[0].quantity, 0);
}

#[tokio::test]
async fn test_seed_never_clears_printed_status() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 4)).await.unwrap();

    let written = ledger
        .seed_roster(&[RosterEntry::new(1, "Acme Wines", 4), RosterEntry::new(2, "Globex", 1)])
        .await
        .unwrap();
    assert_eq!(written, 2);

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 2);
    assert_eq!(status[0].company_name, "Acme Wines");
    assert!(status[0].is_printed);
    assert_eq!(status[0].quantity, 4);
    assert!(!status[1].is_printed);

    assert_eq!(ledger.seed_roster(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_print_is_rejected_before_storage() {
    let ledger = memory_ledger().await;

    let result = ledger.record_print(NewPrint::badge(1, "Acme", 0)).await;
    let err = result.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(ledger.history().await.unwrap().is_empty());
    assert!(ledger.badge_status().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_badge_insert_rolls_back_history() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    let history_before = ledger.history().await.unwrap();
    let status_before = ledger.badge_status().await.unwrap();

    install_trigger(
        &ledger,
        "CREATE TRIGGER fail_badge_insert BEFORE INSERT ON badge_status \
         BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;",
    )
    .await;

    let err = ledger
        .record_print(NewPrint::badge(2, "Globex", 3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(ledger.history().await.unwrap(), history_before);
    assert_eq!(ledger.badge_status().await.unwrap(), status_before);
}

#[tokio::test]
async fn test_failed_badge_update_rolls_back_history() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    let history_before = ledger.history().await.unwrap();
    let status_before = ledger.badge_status().await.unwrap();

    install_trigger(
        &ledger,
        "CREATE TRIGGER fail_badge_update BEFORE UPDATE ON badge_status \
         BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;",
    )
    .await;

    let result = ledger.record_print(NewPrint::badge(1, "Acme", 5)).await;
    assert!(matches!(result, Err(LedgerError::Database(_))));

    assert_eq!(ledger.history().await.unwrap(), history_before);
    assert_eq!(ledger.badge_status().await.unwrap(), status_before);

    // The ledger stays usable after a rollback.
    ledger.record_print(wine(1, "Chablis", 3, 1)).await.unwrap();
    assert_eq!(ledger.history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_reset_leaves_both_tables_unchanged() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", 2)).await.unwrap();
    ledger.record_print(wine(5, "Chablis", 12, 6)).await.unwrap();
    let history_before = ledger.history().await.unwrap();
    let status_before = ledger.badge_status().await.unwrap();

    install_trigger(
        &ledger,
        "CREATE TRIGGER fail_history_delete BEFORE DELETE ON print_history \
         BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END;",
    )
    .await;

    let err = ledger.reset_badges().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(ledger.history().await.unwrap(), history_before);
    assert_eq!(ledger.badge_status().await.unwrap(), status_before);
    assert!(status_before[0].is_printed);
}

#[tokio::test]
async fn test_file_backed_ledger_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        path: dir.path().join("nested/ledger.db").to_string_lossy().into_owned(),
        ..StorageConfig::default()
    };

    {
        let ledger = badge_ledger::storage::init_storage(&config).await.unwrap();
        ledger.record_print(NewPrint::badge(8, "Hooli", 2)).await.unwrap();
    }

    let ledger = badge_ledger::storage::init_storage(&config).await.unwrap();
    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].quantity, 2);
    assert_eq!(ledger.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_oversized_quantity_is_rejected() {
    let ledger = memory_ledger().await;
    ledger.record_print(NewPrint::badge(1, "Acme", MAX_QUANTITY)).await.unwrap();

    let err = ledger
        .record_print(NewPrint::badge(1, "Acme", i64::MAX))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status[0].quantity, MAX_QUANTITY);
    assert_eq!(ledger.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_quantity_overflow_rolls_back() {
    let ledger = memory_ledger().await;
    sqlx::raw_sql(
        "INSERT INTO badge_status (company_number, company_name, is_printed, quantity) \
         VALUES (1, 'Acme', 1, 9223372036854775807)",
    )
    .execute(ledger.pool())
    .await
    .unwrap();
    let status_before = ledger.badge_status().await.unwrap();

    let err = ledger
        .record_print(NewPrint::badge(1, "Acme", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    // Status stays decodable and the event was not kept.
    assert_eq!(ledger.badge_status().await.unwrap(), status_before);
    assert_eq!(ledger.search_badges("acme").await.unwrap().len(), 1);
    assert!(ledger.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_write_leaves_ledger_usable() {
    let ledger = memory_ledger().await;

    // Drop record_print futures at assorted points between BEGIN and COMMIT.
    for i in 0..200u64 {
        let _ = tokio::time::timeout(
            Duration::from_micros(10 + i * 5),
            ledger.record_print(NewPrint::badge(1, "Acme", 2)),
        )
        .await;
    }

    let event = tokio::time::timeout(
        Duration::from_secs(5),
        ledger.record_print(NewPrint::badge(2, "Globex", 1)),
    )
    .await
    .expect("write blocked by an abandoned transaction")
    .unwrap();
    assert_eq!(event.quantity, 1);

    // Whatever committed, history and status agree.
    let history = ledger.history().await.unwrap();
    let acme_history: i64 = history
        .iter()
        .filter(|e| e.item_number == 1)
        .map(|e| e.quantity)
        .sum();
    let acme_status = ledger
        .badge_status()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.company_number == 1)
        .map(|s| s.quantity)
        .unwrap_or(0);
    assert_eq!(acme_status, acme_history);

    ledger.reset_all().await.unwrap();
    assert!(ledger.history().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_are_serialized() {
    const WRITERS: i64 = 40;
    const QUANTITY: i64 = 2;

    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        path: dir.path().join("ledger.db").to_string_lossy().into_owned(),
        max_connections: 4,
        ..StorageConfig::default()
    };
    let ledger: Arc<dyn PrintLedger> = badge_ledger::storage::init_storage(&config).await.unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger.record_print(NewPrint::badge(7, "Initech", QUANTITY)).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let status = ledger.badge_status().await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].quantity, WRITERS * QUANTITY);
    assert_eq!(ledger.history().await.unwrap().len(), WRITERS as usize);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let ledger = memory_ledger().await;
    ledger
        .seed_roster(&[
            RosterEntry::new(4, "CHÂTEAU MARGAUX", 6),
            RosterEntry::new(5, "Weingut Müller", 2),
        ])
        .await
        .unwrap();

    let found = ledger.search_badges("château").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].company_number, 4);

    let found = ledger.search_badges("MÜLLER").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].company_number, 5);
}
