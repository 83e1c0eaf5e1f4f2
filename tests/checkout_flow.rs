mod common;

use axum_storefront_api::{
    dto::cart::{AddToCartRequest, RemoveFromCartRequest, UpdateCartItemRequest},
    dto::products::UpdateProductRequest,
    error::AppError,
    middleware::auth::AuthUser,
    resolver::ProductKey,
    routes::params::OrderListQuery,
    services::{cart_service, order_service, product_service},
};
use rust_decimal::Decimal;

fn default_order_query() -> OrderListQuery {
    OrderListQuery {
        page: None,
        per_page: None,
        status: None,
        sort_order: None,
    }
}

// Integration flow: reserve stock into the cart, settle quantity diffs,
// check out, and verify the frozen order survives later catalog changes.
// Runs as one sequential flow because every run resets the database.
#[tokio::test]
async fn cart_reservation_and_checkout_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let user = common::create_user(&state, "Chiamo Foods", "user@example.com").await?;
    let product = common::create_product(&state, "Coke 50cl", "coke-50cl", "12.50", 10).await?;

    // Add 3: stock 10 -> 7, balance reported.
    let resp = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: ProductKey::Text("coke-50cl".into()),
            quantity: 3,
        },
    )
    .await?;
    let mutation = resp.data.unwrap();
    assert_eq!(mutation.item.quantity, 3);
    assert_eq!(mutation.stock_balance, Some(7));
    assert_eq!(common::product_stock(&state, product.id).await?, 7);

    // Adding the same product accumulates into one line.
    let resp = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: ProductKey::Id(product.id),
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(resp.data.unwrap().item.quantity, 5);
    assert_eq!(common::product_stock(&state, product.id).await?, 5);

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_price, "62.50".parse::<Decimal>()?);

    // Asking for more than the shelf holds fails and changes nothing.
    let scarce = common::create_product(&state, "Peak Milk Tin", "peak-milk-tin", "8.00", 3).await?;
    let err = cart_service::add_to_cart(
        &state,
        &user,
        AddToCartRequest {
            product_id: ProductKey::Id(scarce.id),
            quantity: 5,
        },
    )
    .await
    .unwrap_err();
    match err {
        AppError::InsufficientStock { remaining, .. } => assert_eq!(remaining, 3),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(common::product_stock(&state, scarce.id).await?, 3);
    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1, "failed add must not create a line");

    // Shrinking the line restocks the difference.
    let resp = cart_service::update_cart_item(
        &state,
        &user,
        UpdateCartItemRequest {
            product_id: ProductKey::Id(product.id),
            quantity: 2,
        },
    )
    .await?;
    let mutation = resp.data.unwrap();
    assert_eq!(mutation.item.quantity, 2);
    assert_eq!(mutation.stock_balance, Some(8));
    assert_eq!(common::product_stock(&state, product.id).await?, 8);

    // Growing past the remaining stock fails atomically.
    let err = cart_service::update_cart_item(
        &state,
        &user,
        UpdateCartItemRequest {
            product_id: ProductKey::Id(product.id),
            quantity: 100,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(common::product_stock(&state, product.id).await?, 8);

    // Checkout freezes the cart into an order without touching stock again.
    let receipt = order_service::checkout(&state, &user).await?.data.unwrap();
    let parts: Vec<&str> = receipt.order_id.splitn(3, '-').collect();
    assert_eq!(parts[0], "ORD");
    assert!(parts[1].len() == 4 && parts[1].chars().all(|c| c.is_ascii_digit()));
    assert!(parts[2].starts_with('C'), "code initial comes from the business name");
    assert_eq!(parts[2].len(), 8);
    assert_eq!(receipt.status, "pending");
    assert_eq!(receipt.progress, 1);
    assert_eq!(receipt.source, "cart");
    assert_eq!(common::product_stock(&state, product.id).await?, 8);

    let cart = cart_service::get_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty(), "checkout clears the cart");

    // Checking out the now-empty cart is a 400.
    let err = order_service::checkout(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyCollection(_)));

    let orders = order_service::list_orders(&state, &user, default_order_query())
        .await?
        .data
        .unwrap();
    assert_eq!(orders.items.len(), 1);
    let placed = &orders.items[0];
    assert_eq!(placed.order.order_id, receipt.order_id);
    assert_eq!(placed.order.total, "25.00".parse::<Decimal>()?);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].quantity, 2);
    assert_eq!(placed.items[0].price, "12.50".parse::<Decimal>()?);

    // Order totals and item prices are snapshots: a later price change
    // must not reach back into history.
    let admin = common::create_user(&state, "Storefront HQ", "admin@example.com").await?;
    let admin = AuthUser {
        user_id: admin.user_id,
        role: "admin".into(),
    };
    product_service::update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            price: Some("99.00".parse()?),
            stock: None,
            image: None,
            category_id: None,
        },
    )
    .await?;

    let fetched = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.order.total, "25.00".parse::<Decimal>()?);
    assert_eq!(fetched.items[0].price, "12.50".parse::<Decimal>()?);

    // Summary sums the frozen totals.
    let summary = order_service::summary(&state, &user).await?.data.unwrap();
    assert_eq!(summary.total_orders, 1);
    assert_eq!(summary.total_spent, "25.00".parse::<Decimal>()?);

    // --- Sentinel display quirk -------------------------------------------
    // A balance landing exactly on the configured sentinel is suppressed.
    let sentinel_user = common::create_user(&state, "Acme Traders", "acme@example.com").await?;
    let gala = common::create_product(&state, "Gala Roll", "gala-roll", "3.25", 303).await?;

    let resp = cart_service::add_to_cart(
        &state,
        &sentinel_user,
        AddToCartRequest {
            product_id: ProductKey::Id(gala.id),
            quantity: 3,
        },
    )
    .await?;
    assert_eq!(resp.data.unwrap().stock_balance, None);
    assert_eq!(common::product_stock(&state, gala.id).await?, 300);

    // One more add moves off the sentinel and the balance reappears.
    let resp = cart_service::add_to_cart(
        &state,
        &sentinel_user,
        AddToCartRequest {
            product_id: ProductKey::Id(gala.id),
            quantity: 1,
        },
    )
    .await?;
    assert_eq!(resp.data.unwrap().stock_balance, Some(299));

    // --- Remove/clear keep the reservation --------------------------------
    let buyer = common::create_user(&state, "Chuks & Sons", "chuks@example.com").await?;
    let juice = common::create_product(&state, "Five Alive 1L", "five-alive-1l", "9.90", 20).await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: ProductKey::Id(juice.id),
            quantity: 4,
        },
    )
    .await?;
    assert_eq!(common::product_stock(&state, juice.id).await?, 16);

    // Compatibility behavior: removing a line keeps the deduction.
    cart_service::remove_from_cart(
        &state,
        &buyer,
        RemoveFromCartRequest {
            product_id: ProductKey::Id(juice.id),
        },
    )
    .await?;
    assert_eq!(common::product_stock(&state, juice.id).await?, 16);

    // Same for clear.
    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: ProductKey::Id(juice.id),
            quantity: 2,
        },
    )
    .await?;
    let cleared = cart_service::clear_cart(&state, &buyer).await?.data.unwrap();
    assert_eq!(cleared.removed, 1);
    assert_eq!(common::product_stock(&state, juice.id).await?, 14);

    // Removing an absent line is a 404.
    let err = cart_service::remove_from_cart(
        &state,
        &buyer,
        RemoveFromCartRequest {
            product_id: ProductKey::Id(juice.id),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}
