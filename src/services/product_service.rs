use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    cache::{CATEGORY_LIST_KEY, PRODUCT_LIST_KEY},
    dto::products::{
        CategoryList, CreateCategoryRequest, CreateProductRequest, ProductList,
        UpdateProductRequest,
    },
    entity::{
        categories::{self, Column as CategoryCol, Entity as Categories},
        products::{self, Column as ProductCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product, ProductBrief, absolute_media_url},
    resolver::{MatchPolicy, ProductKey, resolve_product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    slug,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    // The plain catalog listing is the hot path; it is served read-through
    // from the cache and rebuilt on any catalog write.
    let cacheable = query.is_default();
    if cacheable {
        if let Some(data) = state.cache.get::<ProductList>(PRODUCT_LIST_KEY).await {
            return Ok(ApiResponse::success("Products", data, None));
        }
    }

    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProductCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProductCol::Slug).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(ProductCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(ProductCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => ProductCol::CreatedAt,
        ProductSortBy::Price => ProductCol::Price,
        ProductSortBy::Name => ProductCol::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items: Vec<Product> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let data = ProductList { items };
    if cacheable {
        state.cache.put(PRODUCT_LIST_KEY, &data).await;
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity)
        .ok_or_else(|| AppError::not_found("Product not found."))?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < rust_decimal::Decimal::ZERO {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::BadRequest("Stock must not be negative".into()));
    }

    let slug = unique_slug(&state.orm, &payload.name).await?;
    let active = products::ActiveModel {
        id: NotSet,
        name: Set(payload.name),
        slug: Set(slug),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image: Set(payload.image),
        category_id: Set(payload.category_id),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;
    state.cache.invalidate(PRODUCT_LIST_KEY).await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found."))?;

    // Slug stays what it was at creation; only catalog attributes move.
    let mut active: products::ActiveModel = existing.into();
    if let Some(price) = payload.price {
        if price < rust_decimal::Decimal::ZERO {
            return Err(AppError::BadRequest("Price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("Stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }

    let product = active.update(&state.orm).await?;
    state.cache.invalidate(PRODUCT_LIST_KEY).await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product not found."));
    }
    state.cache.invalidate(PRODUCT_LIST_KEY).await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    if let Some(data) = state.cache.get::<CategoryList>(CATEGORY_LIST_KEY).await {
        return Ok(ApiResponse::success("Categories", data, None));
    }

    let items: Vec<Category> = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Category {
            id: model.id,
            name: model.name,
        })
        .collect();

    let data = CategoryList { items };
    state.cache.put(CATEGORY_LIST_KEY, &data).await;
    Ok(ApiResponse::success("Categories", data, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }

    let category = categories::ActiveModel {
        id: NotSet,
        name: Set(payload.name.trim().to_string()),
    }
    .insert(&state.orm)
    .await?;
    state.cache.invalidate(CATEGORY_LIST_KEY).await;

    Ok(ApiResponse::success(
        "Category created",
        Category {
            id: category.id,
            name: category.name,
        },
        Some(Meta::empty()),
    ))
}

/// Resolve a loosely-typed identifier or fail the request with the 404 the
/// storefront expects.
pub(crate) async fn resolve_or_not_found<C: ConnectionTrait>(
    conn: &C,
    key: &ProductKey,
    policy: MatchPolicy,
) -> Result<ProductModel, AppError> {
    resolve_product(conn, key, policy)
        .await?
        .ok_or_else(|| AppError::not_found("No Product matches the given query."))
}

/// First free slug for `name`: the base slug, then `base-1`, `base-2`, ...
async fn unique_slug<C: ConnectionTrait>(conn: &C, name: &str) -> Result<String, AppError> {
    let base = slug::slugify(name);
    let mut candidate = base.clone();
    let mut counter = 1u32;
    while Products::find()
        .filter(ProductCol::Slug.eq(candidate.as_str()))
        .one(conn)
        .await?
        .is_some()
    {
        candidate = slug::with_suffix(&base, counter);
        counter += 1;
    }
    Ok(candidate)
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        price: model.price,
        stock: model.stock,
        image: model.image,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn product_brief(model: &ProductModel, media_base: &str) -> ProductBrief {
    ProductBrief {
        id: model.id,
        name: model.name.clone(),
        price: model.price,
        image: model
            .image
            .as_deref()
            .map(|path| absolute_media_url(media_base, path)),
    }
}
