use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiResult,
    middleware::{AuthUser, ValidatedJson},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/togglePaymentStatus", post(toggle_payment_status))
        .route("/refundPayment", post(refund_payment))
        .route("/payments/{payment_id}", get(get_payment))
}

// --- Request structs ---
#[derive(Debug, Deserialize, Validate)]
struct PaymentIdRequest {
    #[serde(rename = "paymentID")]
    #[validate(required(message = "paymentID is required"), range(min = 1, message = "paymentID must be > 0"))]
    payment_id: Option<i64>,
}

impl PaymentIdRequest {
    // validate() has already run; required() guarantees Some
    fn id(&self) -> i64 {
        self.payment_id.unwrap_or_default()
    }
}

// --- HTTP Handlers ---

/// POST /api/togglePaymentStatus
async fn toggle_payment_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<PaymentIdRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = state
        .bookings
        .toggle_payment_status(req.id(), user.owner_scope())
        .await?;

    Ok(Json(json!({
        "message": "Payment status toggled successfully",
        "paymentStatus": status,
    })))
}

/// POST /api/refundPayment
async fn refund_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<PaymentIdRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = state
        .bookings
        .refund_payment(req.id(), user.owner_scope())
        .await?;

    Ok(Json(json!({
        "message": "Payment refunded successfully",
        "paymentStatus": status,
    })))
}

/// GET /api/payments/{payment_id}
async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(payment_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let payment = state.bookings.payment(payment_id, user.owner_scope()).await?;
    Ok(Json(payment))
}
