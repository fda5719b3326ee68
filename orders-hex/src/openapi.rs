//! OpenAPI document for the HTTP API.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use orders_types::domain::{OrderNote, OrderStatus, PaymentStatus};
use orders_types::dto::{
    CreateOrderRequest, CreatePaymentMethodRequest, MessageResponse, OrderView,
    PaymentMethodView, RefundRequest, UpdateOrderStatusRequest,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Store a payment method for the caller
#[utoipa::path(
    post,
    path = "/payment-methods",
    tag = "payment-methods",
    request_body = CreatePaymentMethodRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment method stored", body = PaymentMethodView),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn create_payment_method() {}

/// List the caller's active payment methods
#[utoipa::path(
    get,
    path = "/payment-methods",
    tag = "payment-methods",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active payment methods", body = Vec<PaymentMethodView>),
        (status = 401, description = "Unauthorized")
    )
)]
async fn list_payment_methods() {}

/// Deactivate a payment method
#[utoipa::path(
    delete,
    path = "/payment-methods/{id}",
    tag = "payment-methods",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Payment method ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment method deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Payment method not found"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn delete_payment_method() {}

/// Place an order
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    request_body = CreateOrderRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Order created", body = OrderView),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Product or payment method not found"),
        (status = 409, description = "Insufficient stock"),
        (status = 503, description = "Inventory service unavailable"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn create_order() {}

/// List the caller's orders, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders of the caller", body = Vec<OrderView>),
        (status = 401, description = "Unauthorized")
    )
)]
async fn list_orders() {}

/// Get an order by ID
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Order details", body = OrderView),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order not found"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn get_order() {}

/// Overwrite the status of an order (admin only)
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tag = "orders",
    request_body = UpdateOrderStatusRequest,
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Status updated", body = OrderView),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Order not found"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn update_order_status() {}

/// Charge a pending order
#[utoipa::path(
    post,
    path = "/orders/{id}/process-payment",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Payment completed", body = OrderView),
        (status = 402, description = "Payment failed"),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Order is not payable"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn process_payment() {}

/// Refund a paid order (admin only)
#[utoipa::path(
    post,
    path = "/orders/{id}/refund",
    tag = "orders",
    request_body = RefundRequest,
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Order ID (UUID)")
    ),
    responses(
        (status = 200, description = "Refund processed", body = OrderView),
        (status = 403, description = "Caller is not an administrator"),
        (status = 409, description = "Order is not paid"),
        (status = 422, description = "Refund amount exceeds order total"),
        (status = 401, description = "Unauthorized")
    )
)]
async fn refund_order() {}

/// OpenAPI documentation for the Orders API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orders Service API",
        version = "1.0.0",
        description = "Order placement, payment processing, refunds and stored payment methods.\n\n## Authentication\n\nEvery endpoint except `/health` requires a bearer token issued by the user service:\n\n```\nAuthorization: Bearer <token>\n```\n\nMonetary amounts are integers in minor units (cents).",
        license(name = "MIT"),
    ),
    paths(
        health,
        create_payment_method,
        list_payment_methods,
        delete_payment_method,
        create_order,
        list_orders,
        get_order,
        update_order_status,
        process_payment,
        refund_order,
    ),
    components(
        schemas(
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            RefundRequest,
            OrderView,
            OrderNote,
            OrderStatus,
            PaymentStatus,
            CreatePaymentMethodRequest,
            PaymentMethodView,
            MessageResponse,
        )
    ),

    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "orders", description = "Order lifecycle operations"),
        (name = "payment-methods", description = "Stored payment method management"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for Bearer token authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
