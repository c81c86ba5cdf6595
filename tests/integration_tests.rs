//! Integration tests for reconciliation-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::{
    CategoryRules, FieldMapping, MemoryStorage, PeriodKey, PeriodStart, RawRow, RawValue,
    ReconcileError, Reconciler, Side,
};

fn dec(s: &str) -> BigDecimal {
    s.parse().unwrap()
}

fn text(s: &str) -> RawValue {
    RawValue::Text(s.to_string())
}

fn book_row(date: &str, concept: &str, amount: &str) -> RawRow {
    RawRow::new()
        .with("Fecha", text(date))
        .with("Concepto", text(concept))
        .with("Importe", text(amount))
}

fn bank_row(date: &str, description: &str, credit: Option<f64>, debit: Option<f64>) -> RawRow {
    RawRow::new()
        .with("Date", text(date))
        .with("Description", text(description))
        .with(
            "Credit",
            credit.map(RawValue::Number).unwrap_or(RawValue::Empty),
        )
        .with(
            "Debit",
            debit.map(RawValue::Number).unwrap_or(RawValue::Empty),
        )
}

fn book_mapping() -> FieldMapping {
    FieldMapping::new("Fecha", "Concepto", "Importe")
}

fn bank_mapping() -> FieldMapping {
    FieldMapping::new("Date", "Description", "Credit").with_contra("Debit")
}

fn noon(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let storage = MemoryStorage::new();
    let mut reconciler = Reconciler::new(storage, "acme");
    let rules = CategoryRules::bank_expense_defaults();

    reconciler
        .bootstrap(
            dec("10000.00"),
            dec("10000.00"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .await
        .unwrap();

    // --- March ---
    reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 3).unwrap(),
            reported_closing_book: dec("10600.00"),
            reported_closing_bank: dec("10288.00"),
            without_book: false,
        })
        .await
        .unwrap();

    let book_rows = vec![
        book_row("2024-03-10", "Invoice 1001", "500,00"),
        book_row("2024-03-15", "Supplier payment", "-200,00"),
        book_row("2024-03-28", "Deposit in transit", "300,00"),
    ];
    let outcome = reconciler
        .import_rows(Side::Book, &book_rows, &book_mapping(), &rules)
        .await
        .unwrap();
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.skipped_dates, 0);

    let bank_rows = vec![
        bank_row("2024-03-12", "TRANSFER IN", Some(500.0), None),
        bank_row("2024-03-15", "CHECK 88", None, Some(200.0)),
        bank_row("2024-03-30", "COMISION MANT", None, Some(12.0)),
    ];
    reconciler
        .import_rows(Side::Bank, &bank_rows, &bank_mapping(), &rules)
        .await
        .unwrap();

    let report = reconciler.auto_match(3).await.unwrap();
    assert_eq!(report.matched, 2);
    assert_eq!(report.remaining_book, 1);
    assert_eq!(report.remaining_bank, 1);

    let summary = reconciler.summary().await.unwrap();
    assert_eq!(summary.integrity_discrepancy_book, dec("0.00"));
    assert_eq!(summary.integrity_discrepancy_bank, dec("0.00"));
    assert_eq!(summary.pending_book.len(), 1);
    assert_eq!(summary.pending_book[0].description, "Deposit in transit");
    assert_eq!(summary.pending_bank.len(), 1);
    assert_eq!(summary.suggested_adjustments.len(), 1);
    assert_eq!(summary.suggested_adjustments[0].category, "Maintenance");
    assert_eq!(summary.suggested_adjustments[0].total, dec("-12.00"));
    assert_eq!(summary.book_theoretical, dec("10288.00"));
    assert_eq!(summary.final_difference, dec("0.00"));
    assert!(summary.can_close());

    let closed = reconciler.close(noon(2024, 4, 1)).await.unwrap();
    assert_eq!(closed.period_key, PeriodKey::new(2024, 3).unwrap());

    // --- April: carry-forward and mop-up ---
    let err = reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 6).unwrap(),
            reported_closing_book: dec("0"),
            reported_closing_bank: dec("0"),
            without_book: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::PeriodOutOfSequence { .. }));

    reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 4).unwrap(),
            reported_closing_book: dec("10588.00"),
            reported_closing_bank: dec("10588.00"),
            without_book: false,
        })
        .await
        .unwrap();

    let open = reconciler.open_period().await.unwrap().unwrap();
    assert_eq!(open.opening_book, dec("10288.00"));
    assert_eq!(open.opening_bank, dec("10288.00"));
    // Inherited pendings: the deposit on the book side, the fee on the bank
    // side, with their categories intact and flags gone.
    assert_eq!(open.book_entries.len(), 1);
    assert_eq!(open.bank_entries.len(), 1);
    assert_eq!(
        open.bank_entries[0].category.as_deref(),
        Some("Maintenance")
    );

    reconciler
        .import_rows(
            Side::Book,
            &[book_row("05/04/2024", "Bank service charge", "-12,00")],
            &book_mapping(),
            &rules,
        )
        .await
        .unwrap();
    reconciler
        .import_rows(
            Side::Bank,
            &[bank_row("2024-04-02", "DEPOSIT", Some(300.0), None)],
            &bank_mapping(),
            &rules,
        )
        .await
        .unwrap();

    // The carried deposit finds its bank counterpart five days out.
    let report = reconciler.auto_match(5).await.unwrap();
    assert_eq!(report.matched, 1);

    // The carried bank fee is disqualified from auto-matching, so it is
    // resolved manually against the book posting.
    let open = reconciler.open_period().await.unwrap().unwrap();
    let book_fee = open
        .book_entries
        .iter()
        .find(|e| e.description == "Bank service charge")
        .unwrap()
        .id;
    let bank_fee = open
        .bank_entries
        .iter()
        .find(|e| e.description == "COMISION MANT")
        .unwrap()
        .id;
    let group = reconciler
        .manual_match(&[book_fee], &[bank_fee])
        .await
        .unwrap();
    assert_eq!(group.sum_book, dec("-12.00"));

    let summary = reconciler.summary().await.unwrap();
    assert!(summary.pending_book.is_empty());
    assert!(summary.pending_bank.is_empty());
    // The reported balances sit 12.00 above the engine's adjusted basis
    // because the fee was both carried in the opening and posted anew; the
    // integrity signal reports it without blocking the close.
    assert_eq!(summary.integrity_discrepancy_book, dec("12.00"));
    assert_eq!(summary.integrity_discrepancy_bank, dec("12.00"));
    assert_eq!(summary.final_difference, dec("0.00"));

    reconciler.close(noon(2024, 5, 2)).await.unwrap();
    let history = reconciler.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].period_key, PeriodKey::new(2024, 4).unwrap());
    assert!(reconciler.open_period().await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_manual_match_changes_nothing() {
    let storage = MemoryStorage::new();
    let mut reconciler = Reconciler::new(storage, "acme");
    let rules = CategoryRules::empty();

    reconciler
        .bootstrap(
            dec("0"),
            dec("0"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .await
        .unwrap();
    reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 1).unwrap(),
            reported_closing_book: dec("300.00"),
            reported_closing_bank: dec("299.99"),
            without_book: false,
        })
        .await
        .unwrap();
    reconciler
        .import_rows(
            Side::Book,
            &[book_row("2024-01-10", "Invoice", "300,00")],
            &book_mapping(),
            &rules,
        )
        .await
        .unwrap();
    reconciler
        .import_rows(
            Side::Bank,
            &[bank_row("2024-01-10", "Transfer", Some(299.99), None)],
            &bank_mapping(),
            &rules,
        )
        .await
        .unwrap();

    let before = reconciler.summary().await.unwrap();
    let open = reconciler.open_period().await.unwrap().unwrap();
    let book_id = open.book_entries[0].id;
    let bank_id = open.bank_entries[0].id;

    let err = reconciler
        .manual_match(&[book_id], &[bank_id])
        .await
        .unwrap_err();
    match err {
        ReconcileError::UnbalancedSelection {
            sum_book,
            sum_bank,
            difference,
        } => {
            assert_eq!(sum_book, dec("300.00"));
            assert_eq!(sum_bank, dec("299.99"));
            assert_eq!(difference, dec("0.01"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let after = reconciler.summary().await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_state_survives_serialization() {
    let mut storage = MemoryStorage::new();
    let mut reconciler = Reconciler::new(storage.clone(), "acme");
    let rules = CategoryRules::bank_expense_defaults();

    reconciler
        .bootstrap(
            dec("100.00"),
            dec("100.00"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .await
        .unwrap();
    reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 1).unwrap(),
            reported_closing_book: dec("150.00"),
            reported_closing_bank: dec("150.00"),
            without_book: false,
        })
        .await
        .unwrap();
    reconciler
        .import_rows(
            Side::Book,
            &[book_row("2024-01-05", "Sale", "50,00")],
            &book_mapping(),
            &rules,
        )
        .await
        .unwrap();
    reconciler
        .import_rows(
            Side::Bank,
            &[bank_row("2024-01-06", "TRANSFER", Some(50.0), None)],
            &bank_mapping(),
            &rules,
        )
        .await
        .unwrap();
    reconciler.auto_match(3).await.unwrap();

    use reconciliation_core::ReconciliationStorage;
    let state = storage.get_state("acme").await.unwrap().unwrap();
    let json = serde_json::to_string(&state).unwrap();
    let restored: reconciliation_core::ReconciliationState =
        serde_json::from_str(&json).unwrap();
    assert_eq!(state, restored);

    // A reconciler over the restored state picks up where it left off.
    storage.save_state(&restored).await.unwrap();
    let summary = reconciler.summary().await.unwrap();
    assert_eq!(summary.matched.len(), 1);
    assert!(summary.can_close());
}

#[tokio::test]
async fn test_without_book_period() {
    let storage = MemoryStorage::new();
    let mut reconciler = Reconciler::new(storage, "acme");
    let rules = CategoryRules::empty();

    reconciler
        .bootstrap(
            dec("500.00"),
            dec("500.00"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .await
        .unwrap();
    reconciler
        .start_period(PeriodStart {
            key: PeriodKey::new(2024, 1).unwrap(),
            reported_closing_book: dec("0"),
            reported_closing_bank: dec("700.00"),
            without_book: true,
        })
        .await
        .unwrap();

    let err = reconciler
        .import_rows(
            Side::Book,
            &[book_row("2024-01-05", "Sale", "50,00")],
            &book_mapping(),
            &rules,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::BookImportDisabled));

    reconciler
        .import_rows(
            Side::Bank,
            &[bank_row("2024-01-06", "TRANSFER", Some(200.0), None)],
            &bank_mapping(),
            &rules,
        )
        .await
        .unwrap();

    let summary = reconciler.summary().await.unwrap();
    assert_eq!(summary.opening_book, dec("0"));
    assert_eq!(summary.theoretical_closing_bank, dec("700.00"));
    assert_eq!(summary.pending_bank.len(), 1);
}
