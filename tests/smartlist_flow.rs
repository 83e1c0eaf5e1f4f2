mod common;

use axum_storefront_api::{
    dto::smartlists::{
        AddListItemRequest, CreateSmartListRequest, RemoveListItemRequest, UpdateListItemRequest,
    },
    error::AppError,
    resolver::ProductKey,
    services::{order_service, smartlist_service},
};
use rust_decimal::Decimal;

// Smart lists are non-reserving: no mutation on this path may ever move
// product stock, including the order-all conversion.
#[tokio::test]
async fn smartlist_lifecycle_and_order_all() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let user = common::create_user(&state, "Mama Nkechi Stores", "nkechi@example.com").await?;
    let coke = common::create_product(&state, "Coke 50cl", "coke-50cl", "12.50", 50).await?;
    let milk = common::create_product(&state, "Peak Milk Tin", "peak-milk-tin", "8.00", 20).await?;

    // Get-or-create by (user, name): the second call returns the same list.
    let (created, resp) = smartlist_service::create_smartlist(
        &state,
        &user,
        CreateSmartListRequest { name: None },
    )
    .await?;
    assert!(created);
    let list = resp.data.unwrap();
    assert_eq!(list.name, "Default List");

    let (created_again, resp) = smartlist_service::create_smartlist(
        &state,
        &user,
        CreateSmartListRequest {
            name: Some("Default List".into()),
        },
    )
    .await?;
    assert!(!created_again);
    assert_eq!(resp.data.unwrap().id, list.id);

    // Repeated adds accumulate into one line; stock is never touched.
    smartlist_service::add_item(
        &state,
        &user,
        list.id,
        AddListItemRequest {
            product_id: ProductKey::Text("coke-50cl".into()),
            quantity: 1,
        },
    )
    .await?;
    let item = smartlist_service::add_item(
        &state,
        &user,
        list.id,
        AddListItemRequest {
            product_id: ProductKey::Id(coke.id),
            quantity: 2,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(item.quantity, 3);
    assert_eq!(common::product_stock(&state, coke.id).await?, 50);

    smartlist_service::add_item(
        &state,
        &user,
        list.id,
        AddListItemRequest {
            // Case-insensitive slug resolution.
            product_id: ProductKey::Text("PEAK-MILK-TIN".into()),
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(common::product_stock(&state, milk.id).await?, 20);

    let detail = smartlist_service::get_smartlist(&state, &user, list.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.items.len(), 2);

    // Absolute quantity update, validated as >= 1.
    let milk_item = detail
        .items
        .iter()
        .find(|i| i.product.as_ref().map(|p| p.id) == Some(milk.id))
        .unwrap();
    let updated = smartlist_service::update_item(
        &state,
        &user,
        list.id,
        UpdateListItemRequest {
            item_id: milk_item.id,
            quantity: 4,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.quantity, 4);

    let err = smartlist_service::update_item(
        &state,
        &user,
        list.id,
        UpdateListItemRequest {
            item_id: milk_item.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Lists are scoped to their owner: everyone else gets a 404.
    let stranger = common::create_user(&state, "Other Shop", "other@example.com").await?;
    let err = smartlist_service::get_smartlist(&state, &stranger, list.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Order-all freezes the items into an order and empties the list, but
    // the list itself survives and stock stays where it was.
    let order = order_service::order_all(&state, &user, list.id)
        .await?
        .data
        .unwrap();
    assert_eq!(order.order.source, "smartlist");
    assert_eq!(order.order.status, "pending");
    assert_eq!(order.order.progress, 1);
    // 3 x 12.50 + 4 x 8.00
    assert_eq!(order.order.total, "69.50".parse::<Decimal>()?);
    assert_eq!(order.items.len(), 2);
    assert_eq!(common::product_stock(&state, coke.id).await?, 50);
    assert_eq!(common::product_stock(&state, milk.id).await?, 20);

    let detail = smartlist_service::get_smartlist(&state, &user, list.id)
        .await?
        .data
        .unwrap();
    assert!(detail.items.is_empty(), "order-all empties the list");

    // Ordering the emptied list is a 400.
    let err = order_service::order_all(&state, &user, list.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCollection(_)));

    // Item removal 404s once the line is gone.
    let err = smartlist_service::remove_item(
        &state,
        &user,
        list.id,
        RemoveListItemRequest {
            item_id: milk_item.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Deleting the list cascades its remains.
    smartlist_service::delete_smartlist(&state, &user, list.id).await?;
    let err = smartlist_service::get_smartlist(&state, &user, list.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}
