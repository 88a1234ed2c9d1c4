use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{ApiResult, ServiceError},
    middleware::{AuthUser, ValidatedJson},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tickets/prices", get(get_ticket_prices))
        .route("/showtimesForBooking", get(get_showtimes_for_booking))
        .route("/screens", post(create_screen))
        .route("/screens/{screen_id}/seats", get(get_seat_layout))
        .route("/movies/by-theatre/{theatre_id}", get(get_movies_by_theatre))
}

// GET /api/tickets/prices
async fn get_ticket_prices(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.ticket_prices().await?))
}

// GET /api/showtimesForBooking
async fn get_showtimes_for_booking(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.showtimes_for_booking().await?))
}

// GET /api/screens/{screen_id}/seats
async fn get_seat_layout(
    State(state): State<Arc<AppState>>,
    Path(screen_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.seat_layout(screen_id).await?))
}

// GET /api/movies/by-theatre/{theatre_id}
async fn get_movies_by_theatre(
    State(state): State<Arc<AppState>>,
    Path(theatre_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.movies_by_theatre(theatre_id).await?))
}

// POST /api/screens
#[derive(Debug, Deserialize, Validate)]
struct CreateScreenRequest {
    #[serde(rename = "theatreID")]
    #[validate(range(min = 1, message = "theatreID and screenName are required."))]
    theatre_id: i64,
    #[serde(rename = "screenName", default)]
    #[validate(length(min = 1, max = 50, message = "theatreID and screenName are required."))]
    screen_name: String,
}

async fn create_screen(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateScreenRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let name = req.screen_name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("theatreID and screenName are required.".to_string()));
    }

    let screen_id = state.catalog.create_screen(req.theatre_id, name).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Screen added with 100 seats.",
            "screenID": screen_id,
        })),
    ))
}
