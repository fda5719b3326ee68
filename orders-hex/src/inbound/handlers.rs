//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use orders_types::{
    AppError, AuthenticatedUser, Authenticator, CreateOrderRequest, CreatePaymentMethodRequest,
    InventoryClient, MessageResponse, OrderId, OrderStore, OrderView, PaymentMethodId,
    PaymentMethodView, RefundRequest, UpdateOrderStatusRequest,
};

use crate::OrderService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<R: OrderStore, I: InventoryClient> {
    pub service: OrderService<R, I>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("{} not found", msg)),
            AppError::InsufficientStock {
                available,
                requested,
            } => (
                StatusCode::CONFLICT,
                format!(
                    "Insufficient stock: available {}, requested {}",
                    available, requested
                ),
            ),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidAmount { requested, total } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Refund amount {} exceeds order total {}",
                    requested, total
                ),
            ),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::PaymentFailed(msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_order_id(id: &str) -> Result<OrderId, AppError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid order ID".into()))
}

fn parse_payment_method_id(id: &str) -> Result<PaymentMethodId, AppError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid payment method ID".into()))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment Methods
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn create_payment_method<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreatePaymentMethodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let method = state.service.create_payment_method(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(PaymentMethodView::from(method))))
}

/// List the caller's active payment methods.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_payment_methods<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let methods = state.service.list_payment_methods(user.id).await?;
    let views: Vec<PaymentMethodView> = methods.into_iter().map(Into::into).collect();
    Ok(Json(views))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id, payment_method_id = %id))]
pub async fn delete_payment_method<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let method_id = parse_payment_method_id(&id)?;
    state.service.delete_payment_method(method_id, user.id).await?;
    Ok(Json(MessageResponse {
        message: "Payment method deleted successfully".into(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// Place an order for the caller.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn create_order<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.service.create_order(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// List the caller's orders, newest first.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_orders<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state.service.list_orders(user.id).await?;
    let views: Vec<OrderView> = orders.into_iter().map(Into::into).collect();
    Ok(Json(views))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id, order_id = %id))]
pub async fn get_order<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.service.get_order(order_id, user.id).await?;
    Ok(Json(OrderView::from(order)))
}

/// Administrative status override.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id, order_id = %id))]
pub async fn update_order_status<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .service
        .update_order_status(order_id, req.status, req.note, &user)
        .await?;
    Ok(Json(OrderView::from(order)))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id, order_id = %id))]
pub async fn process_payment<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.service.process_payment(order_id, user.id).await?;
    Ok(Json(OrderView::from(order)))
}

/// Refund a paid order (admin only).
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id, order_id = %id, amount = ?req.amount))]
pub async fn refund_order<R: OrderStore, I: InventoryClient>(
    State(state): State<Arc<AppState<R, I>>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .service
        .refund_order(order_id, req.amount, &req.reason, &user)
        .await?;
    Ok(Json(OrderView::from(order)))
}
