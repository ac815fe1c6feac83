//! Integration tests for transfers: atomic legs, snapshots, void cascade and
//! the delete guards.

mod common;

use chrono::Datelike;
use common::{account, connect, noon, unique_date};
use fintrack_core::currency::RateUpsert;
use fintrack_core::ledger::{LedgerError, TRANSFER_IN_NAME, TRANSFER_OUT_NAME};
use fintrack_core::reports::{AccountBalanceRow, ReportOptions, ReportPeriod};
use fintrack_core::transfer::TransferIntent;
use fintrack_db::entities::{categories, transactions, transfers};
use fintrack_db::repositories::{CreateTransferInput, UpdateTransactionInput};
use fintrack_db::{
    CategoryRepository, FxRateRepository, ReportRepository, TransactionRepository,
    TransferRepository,
};
use fintrack_shared::types::{AccountId, CategoryId, CurrencyCode, TransactionId, TransferId, UserId};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Statement};

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn brl() -> CurrencyCode {
    CurrencyCode::new("BRL").unwrap()
}

#[tokio::test]
async fn test_cross_currency_transfer_by_destination_amount() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let date = unique_date();
    let src = account(&db, user, "Dollars", "USD").await;
    let dst = account(&db, user, "Reais", "BRL").await;

    FxRateRepository::new(db.clone())
        .upsert(RateUpsert {
            date,
            base: usd(),
            quote: brl(),
            rate: dec!(5.00),
            source: "bcb".to_string(),
        })
        .await
        .unwrap();

    let created = TransferRepository::new(db.clone())
        .create(
            user,
            CreateTransferInput {
                src_account_id: AccountId::from_uuid(src.id),
                dst_account_id: AccountId::from_uuid(dst.id),
                src_amount: dec!(100.00),
                occurred_at: noon(date),
                intent: TransferIntent::ByDestinationAmount(dec!(520.00)),
            },
        )
        .await
        .unwrap();

    let transfer = &created.transfer;
    assert_eq!(transfer.src_amount_minor, 10_000);
    assert_eq!(transfer.dst_amount_minor, 52_000);
    assert_eq!(transfer.rate_value, dec!(5.2));
    assert_eq!(transfer.ref_rate_value, Some(dec!(5.00)));
    assert_eq!(transfer.ref_rate_date, Some(date));
    assert_eq!(transfer.ref_rate_source.as_deref(), Some("bcb"));

    assert_eq!(created.src_transaction.transfer_id, Some(transfer.id));
    assert_eq!(created.dst_transaction.transfer_id, Some(transfer.id));
    assert_eq!(created.src_transaction.amount_minor, 10_000);
    assert_eq!(created.dst_transaction.amount_minor, 52_000);

    let out_cat = categories::Entity::find_by_id(created.src_transaction.category_id.unwrap())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(out_cat.name, TRANSFER_OUT_NAME);
    let in_cat = categories::Entity::find_by_id(created.dst_transaction.category_id.unwrap())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(in_cat.name, TRANSFER_IN_NAME);
}

#[tokio::test]
async fn test_reference_mode_without_rate_writes_nothing() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let src = account(&db, user, "Dollars", "USD").await;
    let dst = account(&db, user, "Reais", "BRL").await;

    let err = TransferRepository::new(db.clone())
        .create(
            user,
            CreateTransferInput {
                src_account_id: AccountId::from_uuid(src.id),
                dst_account_id: AccountId::from_uuid(dst.id),
                src_amount: dec!(10.00),
                occurred_at: noon(unique_date()),
                intent: TransferIntent::ByReferenceRate,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ledger(),
        Some(LedgerError::ReferenceRateMissing { .. })
    ));

    let rows = transfers::Entity::find()
        .filter(transfers::Column::UserId.eq(user.into_inner()))
        .all(&db)
        .await
        .unwrap();
    assert!(rows.is_empty());
    let legs = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user.into_inner()))
        .all(&db)
        .await
        .unwrap();
    assert!(legs.is_empty());
}

#[tokio::test]
async fn test_same_currency_transfer_snapshots_identity() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let src = account(&db, user, "Checking", "EUR").await;
    let dst = account(&db, user, "Savings", "EUR").await;

    let created = TransferRepository::new(db.clone())
        .create(
            user,
            CreateTransferInput {
                src_account_id: AccountId::from_uuid(src.id),
                dst_account_id: AccountId::from_uuid(dst.id),
                src_amount: dec!(42.10),
                occurred_at: noon(unique_date()),
                intent: TransferIntent::ByReferenceRate,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.transfer.dst_amount_minor, 4210);
    assert_eq!(created.transfer.ref_rate_value, Some(dec!(1)));
    assert_eq!(created.transfer.ref_rate_source.as_deref(), Some("identity"));
}

#[tokio::test]
async fn test_void_cascades_and_legs_are_locked() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let src = account(&db, user, "A", "USD").await;
    let dst = account(&db, user, "B", "USD").await;
    let repo = TransferRepository::new(db.clone());
    let date = unique_date();

    let created = repo
        .create(
            user,
            CreateTransferInput {
                src_account_id: AccountId::from_uuid(src.id),
                dst_account_id: AccountId::from_uuid(dst.id),
                src_amount: dec!(7),
                occurred_at: noon(date),
                intent: TransferIntent::ByExplicitRate(dec!(1)),
            },
        )
        .await
        .unwrap();
    let transfer_id = TransferId::from_uuid(created.transfer.id);
    let leg_id = TransactionId::from_uuid(created.src_transaction.id);

    let tx_repo = TransactionRepository::new(db.clone());
    let err = tx_repo
        .update(
            user,
            leg_id,
            UpdateTransactionInput {
                description: Some("edited".to_string()),
                ..UpdateTransactionInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::TransferLinked(_))));
    let err = tx_repo.update_amount(user, leg_id, dec!(9)).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::TransferLinked(_))));
    let err = tx_repo.delete(user, leg_id).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::TransferLinked(_))));
    let err = tx_repo.void(user, leg_id).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::TransferLinked(_))));

    let reports = ReportRepository::new(db.clone());
    let period = ReportPeriod::new(date.year(), date.month()).unwrap();
    let balances = |rows: &[AccountBalanceRow]| rows.iter().map(|r| r.balance).collect::<Vec<_>>();

    let before = reports
        .balance_by_account(user, period, &ReportOptions::default())
        .await
        .unwrap();
    assert_eq!(balances(&before), vec![dec!(-7.00), dec!(7.00)]);

    let voided = repo.void(user, transfer_id).await.unwrap();
    assert!(voided.voided);
    let again = repo.void(user, transfer_id).await.unwrap();
    assert_eq!(voided.updated_at, again.updated_at);

    let legs = repo.find_legs(user, transfer_id).await.unwrap();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|l| l.voided));
    assert_eq!(legs[0].account_id, src.id);

    let after = reports
        .balance_by_account(user, period, &ReportOptions::default())
        .await
        .unwrap();
    assert_eq!(balances(&after), vec![dec!(0), dec!(0)]);

    // The database refuses deletes even outside the repository
    let result = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            format!("DELETE FROM transfers WHERE id = '{}'", created.transfer.id),
        ))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_system_category_self_heals_after_deactivation() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let src = account(&db, user, "A", "USD").await;
    let dst = account(&db, user, "B", "USD").await;
    let repo = TransferRepository::new(db.clone());
    let input = CreateTransferInput {
        src_account_id: AccountId::from_uuid(src.id),
        dst_account_id: AccountId::from_uuid(dst.id),
        src_amount: dec!(1),
        occurred_at: noon(unique_date()),
        intent: TransferIntent::ByDestinationAmount(dec!(1)),
    };

    let first = repo.create(user, input.clone()).await.unwrap();
    let in_id = first.dst_transaction.category_id.unwrap();

    // Simulate a category flipped inactive behind the API's back
    db.execute(Statement::from_string(
        db.get_database_backend(),
        format!("UPDATE categories SET active = false WHERE id = '{in_id}'"),
    ))
    .await
    .unwrap();

    let second = repo.create(user, input).await.unwrap();
    assert_eq!(second.dst_transaction.category_id, Some(in_id));

    let cat = CategoryRepository::new(db.clone())
        .get(user, CategoryId::from_uuid(in_id))
        .await
        .unwrap();
    assert!(cat.active);
}

#[tokio::test]
async fn test_closed_account_cannot_transfer() {
    let Some(db) = connect().await else { return };
    let user = UserId::new();
    let src = account(&db, user, "A", "USD").await;
    let dst = account(&db, user, "B", "USD").await;
    fintrack_db::AccountRepository::new(db.clone())
        .close(user, AccountId::from_uuid(dst.id))
        .await
        .unwrap();

    let err = TransferRepository::new(db.clone())
        .create(
            user,
            CreateTransferInput {
                src_account_id: AccountId::from_uuid(src.id),
                dst_account_id: AccountId::from_uuid(dst.id),
                src_amount: dec!(1),
                occurred_at: noon(unique_date()),
                intent: TransferIntent::ByReferenceRate,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::AccountClosed(_))));
}

#[tokio::test]
async fn test_concurrent_first_transfers_share_system_categories() {
    let Some(db) = connect().await else { return };

    for _ in 0..5 {
        let user = UserId::new();
        let src = account(&db, user, "A", "USD").await;
        let dst = account(&db, user, "B", "BRL").await;
        let input = CreateTransferInput {
            src_account_id: AccountId::from_uuid(src.id),
            dst_account_id: AccountId::from_uuid(dst.id),
            src_amount: dec!(3),
            occurred_at: noon(unique_date()),
            intent: TransferIntent::ByDestinationAmount(dec!(15)),
        };
        let first_repo = TransferRepository::new(db.clone());
        let second_repo = TransferRepository::new(db.clone());

        let (first, second) = tokio::join!(
            first_repo.create(user, input.clone()),
            second_repo.create(user, input)
        );
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(
            first.src_transaction.category_id,
            second.src_transaction.category_id
        );
        assert_eq!(
            first.dst_transaction.category_id,
            second.dst_transaction.category_id
        );

        let system = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user.into_inner()))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(system.len(), 2);
    }
}
