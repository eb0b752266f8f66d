//! Sale Transaction Engine tests.

mod common;

use chrono::Duration;
use uuid::Uuid;

use common::*;
use duka_core::{AlertType, NewSale, PaymentMethod, ProductUpdate, SaleLine, SaleStatus};
use duka_db::{Database, DbConfig};
use duka_engine::{Engine, EngineConfig, EngineError, ErrorCode, SaleOrigin};

// =============================================================================
// Committing Sales
// =============================================================================

#[tokio::test]
async fn test_sale_decrements_stock_and_raises_low_stock_alert() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000001").await;
    let shop = shop(&engine, &owner, "Duka la Juma").await;
    let sukari = product(&engine, &owner, &shop, "Sukari", 1_500, 20, 10).await;

    // Bring stock down to 5 without going through the ledger
    engine
        .catalog()
        .update_product(
            &owner,
            &sukari.id,
            ProductUpdate {
                quantity: Some(5),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap().is_empty());

    let receipt = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&sukari.id, 3, 1_500)]))
        .await
        .unwrap();

    assert_eq!(receipt.total_cents, 4_500);
    assert!(receipt.sale_number.starts_with("SALE-260310-"));
    assert_eq!(quantity_of(&engine, &sukari.id).await, 2);

    let alerts = engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].product_id.as_deref(), Some(sukari.id.as_str()));
    assert_eq!(alerts[0].alert_type, AlertType::LowStock);

    let (sale, items) = engine.sales().get_sale(&owner, &receipt.sale_id).await.unwrap();
    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.created_at, start_time());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].subtotal_cents, 4_500);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_everything_untouched() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000002").await;
    let shop = shop(&engine, &owner, "Duka la Asha").await;
    let mchele = product(&engine, &owner, &shop, "Mchele", 2_800, 2, 0).await;

    let err = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&mchele.id, 5, 2_800)]))
        .await
        .unwrap_err();

    match &err {
        EngineError::InsufficientStock {
            product_id,
            available,
            requested,
            ..
        } => {
            assert_eq!(product_id, &mchele.id);
            assert_eq!(*available, 2);
            assert_eq!(*requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert_eq!(quantity_of(&engine, &mchele.id).await, 2);
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_line_rolls_back_earlier_lines() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000003").await;
    let shop = shop(&engine, &owner, "Duka la Baraka").await;
    let unga = product(&engine, &owner, &shop, "Unga", 1_800, 10, 0).await;
    let chai = product(&engine, &owner, &shop, "Majani ya Chai", 900, 1, 0).await;

    let err = engine
        .sales()
        .create_sale(
            &owner,
            NewSale::new(
                &shop.id,
                vec![SaleLine::new(&unga.id, 2, 1_800), SaleLine::new(&chai.id, 5, 900)],
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientStock { .. }));
    assert_eq!(quantity_of(&engine, &unga.id).await, 10);
    assert_eq!(quantity_of(&engine, &chai.id).await, 1);
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_repeated_lines_are_checked_against_their_sum() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000004").await;
    let shop = shop(&engine, &owner, "Duka la Saidi").await;
    let soda = product(&engine, &owner, &shop, "Soda", 700, 4, 0).await;

    let err = engine
        .sales()
        .create_sale(
            &owner,
            NewSale::new(&shop.id, vec![SaleLine::new(&soda.id, 3, 700), SaleLine::new(&soda.id, 2, 700)]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientStock { requested: 5, .. }));
    assert_eq!(quantity_of(&engine, &soda.id).await, 4);
}

#[tokio::test]
async fn test_total_is_derived_from_lines_not_client() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000005").await;
    let shop = shop(&engine, &owner, "Duka la Mwanaidi").await;
    let mafuta = product(&engine, &owner, &shop, "Mafuta ya Kupikia", 4_500, 10, 2).await;

    let mut request = NewSale::new(&shop.id, vec![SaleLine::new(&mafuta.id, 2, 4_500)]);
    request.client_total_cents = Some(1);
    request.payment_method = PaymentMethod::Mpesa;
    request.customer_phone = Some("0712345678".to_string());

    let receipt = engine.sales().create_sale(&owner, request).await.unwrap();
    assert_eq!(receipt.total_cents, 9_000);

    let (sale, _) = engine.sales().get_sale(&owner, &receipt.sale_id).await.unwrap();
    assert_eq!(sale.total_cents, 9_000);
    assert_eq!(sale.payment_method, PaymentMethod::Mpesa);
    assert_eq!(sale.customer_phone.as_deref(), Some("0712345678"));
}

#[tokio::test]
async fn test_invalid_carts_are_rejected() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000006").await;
    let shop = shop(&engine, &owner, "Duka la Neema").await;
    let maziwa = product(&engine, &owner, &shop, "Maziwa", 1_200, 10, 0).await;

    let empty = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![]))
        .await
        .unwrap_err();
    assert_eq!(empty.code(), ErrorCode::ValidationError);

    let zero = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&maziwa.id, 0, 1_200)]))
        .await
        .unwrap_err();
    assert_eq!(zero.code(), ErrorCode::ValidationError);

    let negative_price = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&maziwa.id, 1, -5)]))
        .await
        .unwrap_err();
    assert_eq!(negative_price.code(), ErrorCode::ValidationError);

    assert_eq!(quantity_of(&engine, &maziwa.id).await, 10);
}

#[tokio::test]
async fn test_foreign_shop_and_product_are_not_found() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000007").await;
    let other = vendor(&engine, "+255711000008").await;
    let mine = shop(&engine, &owner, "Duka Langu").await;
    let theirs = shop(&engine, &other, "Duka Lao").await;
    let their_product = product(&engine, &other, &theirs, "Sabuni", 1_000, 10, 0).await;

    let err = engine
        .sales()
        .create_sale(&owner, NewSale::new(&theirs.id, vec![SaleLine::new(&their_product.id, 1, 1_000)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Shop"));

    // A product of another shop sold through my shop
    let err = engine
        .sales()
        .create_sale(&owner, NewSale::new(&mine.id, vec![SaleLine::new(&their_product.id, 1, 1_000)]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Product"));
    assert_eq!(quantity_of(&engine, &their_product.id).await, 10);
}

#[tokio::test]
async fn test_deactivated_product_cannot_be_sold() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000009").await;
    let shop = shop(&engine, &owner, "Duka la Zamani").await;
    let product = product(&engine, &owner, &shop, "Kiberiti", 100, 50, 0).await;

    engine.catalog().deactivate_product(&owner, &product.id).await.unwrap();

    let err = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&product.id, 1, 100)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_unknown_product_wins_over_short_stock() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000021").await;
    let shop = shop(&engine, &owner, "Duka la Pili").await;
    let sukari = product(&engine, &owner, &shop, "Sukari", 1_000, 1, 0).await;

    // "zzzz-missing" sorts after every generated id, so the short line is staged first
    let err = engine
        .sales()
        .create_sale(
            &owner,
            NewSale::new(
                &shop.id,
                vec![SaleLine::new(&sukari.id, 5, 1_000), SaleLine::new("zzzz-missing", 1, 100)],
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { ref id, .. } if id == "zzzz-missing"));
    assert_eq!(quantity_of(&engine, &sukari.id).await, 1);
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_inactive_product_wins_over_short_stock() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255711000022").await;
    let shop = shop(&engine, &owner, "Duka la Tatu").await;
    let sukari = product(&engine, &owner, &shop, "Sukari", 1_000, 1, 0).await;
    let chumvi = product(&engine, &owner, &shop, "Chumvi", 300, 50, 0).await;
    engine.catalog().deactivate_product(&owner, &chumvi.id).await.unwrap();

    let err = engine
        .sales()
        .create_sale(
            &owner,
            NewSale::new(
                &shop.id,
                vec![SaleLine::new(&sukari.id, 5, 1_000), SaleLine::new(&chumvi.id, 1, 300)],
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(quantity_of(&engine, &sukari.id).await, 1);
    assert_eq!(quantity_of(&engine, &chumvi.id).await, 50);
}

// =============================================================================
// Sale Numbers
// =============================================================================

#[tokio::test]
async fn test_sale_number_collision_retries_with_fresh_number() {
    let (engine, _clock) = engine().await;
    let numbers = ScriptedSaleNumbers::new(&["SALE-A", "SALE-A", "SALE-B"]);
    let engine = engine.with_references(numbers);
    let owner = vendor(&engine, "+255711000010").await;
    let shop = shop(&engine, &owner, "Duka la Hamisi").await;
    let sabuni = product(&engine, &owner, &shop, "Sabuni", 1_000, 10, 0).await;

    let first = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&sabuni.id, 1, 1_000)]))
        .await
        .unwrap();
    let second = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&sabuni.id, 2, 1_000)]))
        .await
        .unwrap();

    assert_eq!(first.sale_number, "SALE-A");
    assert_eq!(second.sale_number, "SALE-B");
    // The colliding attempt's decrement was rolled back
    assert_eq!(quantity_of(&engine, &sabuni.id).await, 7);
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_sale_number_exhaustion_is_conflict() {
    let (engine, _clock) = engine().await;
    let mut config = EngineConfig::default();
    config.numbering.max_attempts = 3;
    let engine = engine
        .with_references(ScriptedSaleNumbers::new(&["SALE-STUCK"]))
        .with_config(config);
    let owner = vendor(&engine, "+255711000011").await;
    let shop = shop(&engine, &owner, "Duka la Rehema").await;
    let chumvi = product(&engine, &owner, &shop, "Chumvi", 500, 10, 0).await;

    engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&chumvi.id, 1, 500)]))
        .await
        .unwrap();

    let err = engine
        .sales()
        .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&chumvi.id, 1, 500)]))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(quantity_of(&engine, &chumvi.id).await, 9);
}

// =============================================================================
// Replay Origin
// =============================================================================

#[tokio::test]
async fn test_replayed_key_commits_once() {
    let (engine, clock) = engine().await;
    let owner = vendor(&engine, "+255711000012").await;
    let shop = shop(&engine, &owner, "Duka la Pili").await;
    let maji = product(&engine, &owner, &shop, "Maji", 600, 10, 0).await;

    let recorded_at = start_time() - Duration::hours(3);
    clock.advance(Duration::hours(1));
    let origin = SaleOrigin::Replay {
        created_at: recorded_at,
        client_ref: Some("offline-7f2c".to_string()),
    };
    let request = NewSale::new(&shop.id, vec![SaleLine::new(&maji.id, 4, 600)]);

    let first = engine
        .sales()
        .commit_sale(&owner, request.clone(), origin.clone())
        .await
        .unwrap();
    let second = engine.sales().commit_sale(&owner, request, origin).await.unwrap();

    assert!(!first.is_existing());
    assert!(second.is_existing());
    assert_eq!(first.receipt(), second.receipt());
    assert_eq!(quantity_of(&engine, &maji.id).await, 6);

    let (sale, _) = engine.sales().get_sale(&owner, &first.receipt().sale_id).await.unwrap();
    assert_eq!(sale.created_at, recorded_at);
    assert_eq!(sale.client_ref.as_deref(), Some("offline-7f2c"));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_sales_are_scoped_to_owner() {
    let (engine, clock) = engine().await;
    let owner = vendor(&engine, "+255711000013").await;
    let other = vendor(&engine, "+255711000014").await;
    let admin = admin(&engine).await;
    let mine = shop(&engine, &owner, "Duka A").await;
    let theirs = shop(&engine, &other, "Duka B").await;
    let p1 = product(&engine, &owner, &mine, "Sukari", 1_500, 10, 0).await;
    let p2 = product(&engine, &other, &theirs, "Sukari", 1_500, 10, 0).await;

    let mine_receipt = engine
        .sales()
        .create_sale(&owner, NewSale::new(&mine.id, vec![SaleLine::new(&p1.id, 1, 1_500)]))
        .await
        .unwrap();
    clock.advance(Duration::minutes(5));
    engine
        .sales()
        .create_sale(&other, NewSale::new(&theirs.id, vec![SaleLine::new(&p2.id, 1, 1_500)]))
        .await
        .unwrap();

    assert_eq!(engine.sales().list_sales(&owner, None).await.unwrap().len(), 1);
    assert_eq!(engine.sales().list_sales(&admin, None).await.unwrap().len(), 2);
    assert_eq!(engine.sales().list_sales(&admin, Some(1)).await.unwrap().len(), 1);

    let err = engine.sales().get_sale(&other, &mine_receipt.sale_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(engine.sales().get_sale(&admin, &mine_receipt.sale_id).await.is_ok());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sales_never_oversell() {
    let path = std::env::temp_dir().join(format!("duka-concurrency-{}.db", Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(6)).await.unwrap();
    let engine = Engine::new(db);

    let owner = vendor(&engine, "+255711000015").await;
    let shop = shop(&engine, &owner, "Duka la Soko").await;
    let mkate = product(&engine, &owner, &shop, "Mkate", 1_000, 10, 0).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = engine.clone();
        let owner = owner.clone();
        let request = NewSale::new(&shop.id, vec![SaleLine::new(&mkate.id, 1, 1_000)]);
        handles.push(tokio::spawn(async move {
            engine.sales().create_sale(&owner, request).await
        }));
    }

    let mut committed = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(EngineError::InsufficientStock { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(committed, 10);
    assert_eq!(refused, 10);
    assert_eq!(quantity_of(&engine, &mkate.id).await, 0);
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 10);

    engine.db().close().await;
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
