// Shared across the flow test binaries; not every binary uses every helper.
#![allow(dead_code)]

use axum_storefront_api::{
    cache::CatalogCache,
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    entity::{products, users},
    middleware::auth::AuthUser,
    resolver::MatchPolicy,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// Returns None (and the caller should skip) when no database is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, cart_items, carts, smart_list_items, smart_lists, notifications, products, categories, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url,
        redis_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        media_base_url: "http://127.0.0.1:3000/media".into(),
        stock_display_sentinel: Some(300),
        resolver_match_policy: MatchPolicy::LowestId,
    };

    Ok(Some(AppState {
        pool,
        orm,
        cache: CatalogCache::disabled(),
        config,
    }))
}

pub async fn create_user(
    state: &AppState,
    business_name: &str,
    email: &str,
) -> anyhow::Result<AuthUser> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_name: Set(business_name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    slug: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        price: Set(price.parse()?),
        stock: Set(stock),
        image: NotSet,
        category_id: NotSet,
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn product_stock(state: &AppState, id: i64) -> anyhow::Result<i32> {
    use sea_orm::EntityTrait;
    let product = products::Entity::find_by_id(id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}
