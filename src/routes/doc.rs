use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartDetail, CartLine, CartMutation, ClearedCart},
        notifications::NotificationList,
        orders::{CheckoutReceipt, OrderList, OrderSummary, OrderWithItems, UpdateOrderRequest},
        products::{CategoryList, CreateCategoryRequest, CreateProductRequest, ProductList, UpdateProductRequest},
        smartlists::{AddListItemRequest, CreateSmartListRequest, SmartListDetail, SmartListItemDto, SmartListList},
    },
    models::{Category, Notification, Order, OrderItem, Product, ProductBrief, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, notifications, orders, params, products, smartlists},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::list_categories,
        products::create_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::update_cart_item,
        cart::clear_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        orders::summary,
        smartlists::list_smartlists,
        smartlists::create_smartlist,
        smartlists::get_smartlist,
        smartlists::delete_smartlist,
        smartlists::add_item,
        smartlists::update_item,
        smartlists::remove_item,
        smartlists::order_all,
        notifications::list_notifications,
        notifications::mark_read
    ),
    components(
        schemas(
            User,
            Product,
            ProductBrief,
            Category,
            Order,
            OrderItem,
            Notification,
            AddToCartRequest,
            CartDetail,
            CartLine,
            CartMutation,
            ClearedCart,
            CheckoutReceipt,
            OrderList,
            OrderSummary,
            OrderWithItems,
            UpdateOrderRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryList,
            CreateCategoryRequest,
            CreateSmartListRequest,
            AddListItemRequest,
            SmartListDetail,
            SmartListItemDto,
            SmartListList,
            NotificationList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartDetail>,
            ApiResponse<CartMutation>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutReceipt>,
            ApiResponse<SmartListDetail>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints (stock-reserving)"),
        (name = "Smart Lists", description = "Saved shopping lists (non-reserving)"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Notifications", description = "Order lifecycle notifications"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
