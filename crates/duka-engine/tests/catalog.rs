//! Shops, products and the alert generator.

mod common;

use common::*;
use duka_core::{NewProduct, NewSale, ProductUpdate, SaleLine};
use duka_engine::{EngineError, ErrorCode};

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_add_product_applies_defaults() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000001").await;
    let shop = shop(&engine, &owner, "Duka la Mama").await;

    let product = engine
        .catalog()
        .add_product(
            &owner,
            NewProduct {
                shop_id: shop.id.clone(),
                name: "  Maharage  ".to_string(),
                price_cents: 3_000,
                quantity: 40,
                ..NewProduct::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(product.name, "Maharage");
    assert_eq!(product.unit, "pcs");
    assert_eq!(product.reorder_level, 10);
    assert!(product.sku.as_deref().unwrap().starts_with("PRD-260310-"));
    assert_eq!(product.version, 1);
    assert!(engine.alerts().list_alerts(&owner.user_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_product_created_low_raises_alert_immediately() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000002").await;
    let shop = shop(&engine, &owner, "Duka la Pembeni").await;

    let product = product(&engine, &owner, &shop, "Nyanya", 200, 3, 10).await;

    let alerts = engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].product_id.as_deref(), Some(product.id.as_str()));
    assert!(alerts[0].message.contains("Nyanya"));
}

#[tokio::test]
async fn test_add_product_rejects_bad_input() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000003").await;
    let other = vendor(&engine, "+255722000004").await;
    let shop = shop(&engine, &owner, "Duka la Kona").await;

    let negative_price = engine
        .catalog()
        .add_product(
            &owner,
            NewProduct {
                shop_id: shop.id.clone(),
                name: "Mayai".to_string(),
                price_cents: -1,
                ..NewProduct::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(negative_price.code(), ErrorCode::ValidationError);

    let foreign = engine
        .catalog()
        .add_product(
            &other,
            NewProduct {
                shop_id: shop.id.clone(),
                name: "Mayai".to_string(),
                price_cents: 300,
                ..NewProduct::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(foreign.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_update_product_keeps_quantity_non_negative() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000005").await;
    let shop = shop(&engine, &owner, "Duka la Mtaa").await;
    let product = product(&engine, &owner, &shop, "Sukari", 1_500, 12, 5).await;

    let updated = engine
        .catalog()
        .update_product(
            &owner,
            &product.id,
            ProductUpdate {
                price_cents: Some(1_600),
                quantity: Some(30),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price_cents, 1_600);
    assert_eq!(updated.quantity, 30);
    assert_eq!(updated.name, "Sukari");

    let err = engine
        .catalog()
        .update_product(
            &owner,
            &product.id,
            ProductUpdate {
                quantity: Some(-1),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(quantity_of(&engine, &product.id).await, 30);
}

#[tokio::test]
async fn test_restock_goes_through_ledger() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000006").await;
    let shop = shop(&engine, &owner, "Duka la Stoo").await;
    let product = product(&engine, &owner, &shop, "Unga", 1_800, 4, 5).await;

    let entry = engine.catalog().restock(&owner, &product.id, 16).await.unwrap();
    assert_eq!(entry.delta, 16);
    assert_eq!(entry.new_quantity, 20);
    assert!(!entry.low_stock);
    assert_eq!(quantity_of(&engine, &product.id).await, 20);

    let err = engine.catalog().restock(&owner, &product.id, 0).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_product_listing_is_role_scoped() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000007").await;
    let other = vendor(&engine, "+255722000008").await;
    let admin = admin(&engine).await;
    let mine = shop(&engine, &owner, "Duka Moja").await;
    let theirs = shop(&engine, &other, "Duka Mbili").await;
    product(&engine, &owner, &mine, "Chai", 900, 20, 0).await;
    let hidden = product(&engine, &owner, &mine, "Kahawa", 1_100, 20, 0).await;
    product(&engine, &other, &theirs, "Mchele", 2_800, 20, 0).await;

    engine.catalog().deactivate_product(&owner, &hidden.id).await.unwrap();

    let own = engine.catalog().list_products(&owner, None).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].name, "Chai");

    let by_shop = engine.catalog().list_products(&owner, Some(&mine.id)).await.unwrap();
    assert_eq!(by_shop.len(), 1);

    let err = engine
        .catalog()
        .list_products(&owner, Some(&theirs.id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    assert_eq!(engine.catalog().list_products(&admin, None).await.unwrap().len(), 2);
    assert_eq!(engine.catalog().list_shops(&owner).await.unwrap().len(), 1);
    assert_eq!(engine.catalog().list_shops(&admin).await.unwrap().len(), 2);

    let err = engine.catalog().get_product(&other, &hidden.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "Product"));
}

// =============================================================================
// Shop Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_shop_cascades() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000009").await;
    let shop = shop(&engine, &owner, "Duka la Kufunga").await;
    let keep = shop_fixture_for_other_owner(&engine).await;
    let sabuni = product(&engine, &owner, &shop, "Sabuni", 1_000, 10, 2).await;
    let dawa = product(&engine, &owner, &shop, "Dawa ya Meno", 2_500, 1, 5).await;

    engine
        .sales()
        .create_sale(
            &owner,
            NewSale::new(&shop.id, vec![SaleLine::new(&sabuni.id, 2, 1_000), SaleLine::new(&dawa.id, 1, 2_500)]),
        )
        .await
        .unwrap();

    let deletion = engine.catalog().delete_shop(&owner, &shop.id).await.unwrap();
    assert_eq!(deletion.products, 2);
    assert_eq!(deletion.sales, 1);
    assert_eq!(deletion.sale_items, 2);
    assert_eq!(deletion.alerts, 1);

    assert!(engine.db().products().get_by_id(&sabuni.id).await.unwrap().is_none());
    assert_eq!(engine.db().sales().count_for_shop(&shop.id).await.unwrap(), 0);
    assert_eq!(engine.catalog().get_shop(&owner, &shop.id).await.unwrap_err().code(), ErrorCode::NotFound);
    assert_eq!(quantity_of(&engine, &keep).await, 10);
}

async fn shop_fixture_for_other_owner(engine: &duka_engine::Engine) -> String {
    let other = vendor(engine, "+255722000010").await;
    let shop = shop(engine, &other, "Duka Jirani").await;
    product(engine, &other, &shop, "Sabuni", 1_000, 10, 2).await.id
}

// =============================================================================
// Alerts
// =============================================================================

#[tokio::test]
async fn test_scan_low_stock_is_idempotent_until_read() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000011").await;
    let shop = shop(&engine, &owner, "Duka la Tahadhari").await;
    let low = product(&engine, &owner, &shop, "Mafuta", 4_500, 20, 5).await;
    product(&engine, &owner, &shop, "Chumvi", 500, 50, 5).await;

    engine
        .catalog()
        .update_product(
            &owner,
            &low.id,
            ProductUpdate {
                quantity: Some(2),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(engine.alerts().scan_low_stock(&owner.user_id).await.unwrap(), 1);
    assert_eq!(engine.alerts().scan_low_stock(&owner.user_id).await.unwrap(), 0);
    assert_eq!(engine.alerts().unread_count(&owner.user_id).await.unwrap(), 1);

    let alert = engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap().remove(0);
    engine.alerts().mark_read(&owner.user_id, &alert.id).await.unwrap();
    assert_eq!(engine.alerts().unread_count(&owner.user_id).await.unwrap(), 0);

    // Still low once the alert is read
    assert_eq!(engine.alerts().scan_low_stock(&owner.user_id).await.unwrap(), 1);
    assert_eq!(engine.alerts().list_alerts(&owner.user_id, false).await.unwrap().len(), 2);
    assert_eq!(engine.alerts().list_alerts(&owner.user_id, true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sale_does_not_duplicate_unread_alert() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000012").await;
    let shop = shop(&engine, &owner, "Duka la Rudia").await;
    let product = product(&engine, &owner, &shop, "Biskuti", 300, 8, 10).await;

    for _ in 0..3 {
        engine
            .sales()
            .create_sale(&owner, NewSale::new(&shop.id, vec![SaleLine::new(&product.id, 1, 300)]))
            .await
            .unwrap();
    }

    assert_eq!(quantity_of(&engine, &product.id).await, 5);
    assert_eq!(engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_foreign_alert_cannot_be_marked_read() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000013").await;
    let other = vendor(&engine, "+255722000014").await;
    let shop = shop(&engine, &owner, "Duka la Siri").await;
    product(&engine, &owner, &shop, "Pipi", 50, 1, 10).await;

    let alert = engine.alerts().list_low_stock_alerts(&owner.user_id).await.unwrap().remove(0);

    let err = engine.alerts().mark_read(&other.user_id, &alert.id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(engine.alerts().unread_count(&owner.user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_scan_ignores_deleted_shops_and_inactive_products() {
    let (engine, _clock) = engine().await;
    let owner = vendor(&engine, "+255722000015").await;
    let shop = shop(&engine, &owner, "Duka la Muda").await;
    let product = product(&engine, &owner, &shop, "Sigara", 100, 20, 10).await;

    engine
        .catalog()
        .update_product(
            &owner,
            &product.id,
            ProductUpdate {
                quantity: Some(1),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    engine.catalog().deactivate_product(&owner, &product.id).await.unwrap();

    assert_eq!(engine.alerts().scan_low_stock(&owner.user_id).await.unwrap(), 0);
}
