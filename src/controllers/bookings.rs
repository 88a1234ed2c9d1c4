use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{ApiResult, ServiceError},
    middleware::{AuthUser, ValidatedJson},
    models::PaymentMethod,
    services::booking::NewBooking,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/book", post(create_booking))
        .route("/bookingDetails/{booking_id}", get(get_booking_details))
        .route("/bookings/{booking_id}/cancel", patch(cancel_booking))
        .route("/users/{user_id}/bookings", get(get_user_bookings))
}

/* ---------- BOOKINGS ---------- */

// POST /api/book
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[serde(rename = "userID")]
    user_id: Option<i32>,
    #[serde(rename = "showtimeID")]
    #[validate(range(min = 1, message = "showtimeID must be > 0"))]
    showtime_id: i64,
    #[serde(rename = "seatIDs", default)]
    #[validate(length(min = 1, message = "No seats selected."))]
    seat_ids: Vec<i64>,
    #[serde(rename = "paymentMethod", default)]
    payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    success: bool,
    #[serde(rename = "bookingID")]
    booking_id: i64,
    #[serde(rename = "paymentID")]
    payment_id: i64,
    #[serde(rename = "seatsBooked")]
    seats_booked: i32,
    amount: f64,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_user()?;

    // The token decides who books; a body userID may only repeat it
    if let Some(body_user) = req.user_id {
        if body_user != user.user_id {
            return Err(ServiceError::Forbidden("userID does not match the session".to_string()));
        }
    }

    let receipt = state
        .bookings
        .create_booking(NewBooking {
            user_id: user.user_id,
            showtime_id: req.showtime_id,
            seat_ids: req.seat_ids,
            payment_method: req.payment_method.unwrap_or_default(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            success: true,
            booking_id: receipt.booking_id,
            payment_id: receipt.payment_id,
            seats_booked: receipt.seats_booked,
            amount: receipt.amount,
        }),
    ))
}

// GET /api/bookingDetails/{booking_id}
async fn get_booking_details(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let details = state.bookings.booking_details(booking_id, user.owner_scope()).await?;
    Ok(Json(details))
}

// PATCH /api/bookings/{booking_id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let status = state.bookings.cancel_booking(booking_id, user.owner_scope()).await?;
    Ok(Json(serde_json::json!({
        "message": "Booking cancelled successfully",
        "bookingStatus": status,
    })))
}

// GET /api/users/{user_id}/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(user_id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    if !user.can_access_user(user_id) {
        return Err(ServiceError::Forbidden("Cannot read another user's bookings".to_string()));
    }
    let bookings = state.bookings.user_bookings(user_id).await?;
    Ok(Json(bookings))
}
