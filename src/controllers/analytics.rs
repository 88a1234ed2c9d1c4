//! analytics.rs
//!
//! Admin reporting over bookings and the payment ledger.
//!
//! - Booking counts and the list of active bookings with their payment state.
//! - Paid payments, and popularity of payment methods among them.
//! - Revenue from paid payments over a booking-date range.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use sqlx::FromRow;

use crate::{
    error::{ApiResult, ServiceError},
    middleware::AuthUser,
    models::{Payment, PaymentMethod, PaymentStatus},
    AppState,
};

/// Routes of the reporting surface. All of them are admin-only.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/totalBookings", get(get_total_bookings))
        .route("/allBookingDetails", get(get_all_booking_details))
        .route("/successfulPayments", get(get_successful_payments))
        .route("/paymentMethodPopularity", get(get_payment_method_popularity))
        .route("/totalRevenue", get(get_total_revenue))
}

// --- Bookings ---

/// GET /api/totalBookings
async fn get_total_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(&state.db.pool)
        .await?;

    Ok(Json(serde_json::json!({ "totalBookings": total })))
}

#[derive(Debug, Serialize, FromRow)]
struct ActiveBookingRow {
    #[serde(rename = "bookingID")]
    booking_id: i64,
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "paymentID")]
    payment_id: i64,
    #[serde(rename = "movieTitle")]
    movie_title: String,
    #[serde(rename = "bookingTime")]
    booking_time: DateTime<Utc>,
    #[serde(rename = "seatsBooked")]
    seats_booked: i32,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentMethod")]
    payment_method: PaymentMethod,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentStatus")]
    payment_status: PaymentStatus,
}

/// GET /api/allBookingDetails
///
/// Active (Booked) bookings of every user with their payment, newest first.
async fn get_all_booking_details(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let rows = sqlx::query_as::<_, ActiveBookingRow>(
        r#"
        SELECT b.id AS booking_id,
               u.user_name,
               p.id AS payment_id,
               m.title AS movie_title,
               b.booking_time,
               b.seats_booked,
               p.method AS payment_method,
               p.status AS payment_status
        FROM bookings b
        JOIN users u ON u.id = b.user_id
        JOIN showtimes st ON st.id = b.showtime_id
        JOIN movies m ON m.id = st.movie_id
        JOIN payments p ON p.booking_id = b.id
        WHERE b.status = 'Booked'
        ORDER BY b.booking_time DESC, b.id DESC
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

// --- Payments ---

/// GET /api/successfulPayments
async fn get_successful_payments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, booking_id, amount::FLOAT8 AS amount, method, status, created_at, updated_at
         FROM payments
         WHERE status = 'Paid'
         ORDER BY id",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(payments))
}

#[derive(Debug, Serialize, FromRow)]
struct MethodPopularityRow {
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentMethod")]
    payment_method: PaymentMethod,
    #[serde(rename = "totalTransactions")]
    total_transactions: i64,
    #[serde(rename = "totalAmount")]
    total_amount: f64,
}

/// GET /api/paymentMethodPopularity
async fn get_payment_method_popularity(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let rows = sqlx::query_as::<_, MethodPopularityRow>(
        r#"
        SELECT method AS payment_method,
               COUNT(id) AS total_transactions,
               COALESCE(SUM(amount), 0)::FLOAT8 AS total_amount
        FROM payments
        WHERE status = 'Paid'
        GROUP BY method
        ORDER BY total_transactions DESC, method
        "#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(rows))
}

// --- Revenue ---

#[derive(Debug, Deserialize)]
struct RevenueQuery {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
}

/// Parses the inclusive `[startDate, endDate]` range of a revenue query.
fn parse_date_range(query: &RevenueQuery) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let (Some(start), Some(end)) = (query.start_date.as_deref(), query.end_date.as_deref()) else {
        return Err(ServiceError::Validation("Both startDate and endDate are required.".to_string()));
    };

    let parse = |value: &str| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
            ServiceError::Validation(format!("'{}' is not a YYYY-MM-DD date", value))
        })
    };
    let (start, end) = (parse(start)?, parse(end)?);

    if end < start {
        return Err(ServiceError::Validation("endDate must not be before startDate".to_string()));
    }
    Ok((start, end))
}

/// GET /api/totalRevenue?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD
async fn get_total_revenue(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    let (start, end) = parse_date_range(&query)?;

    let total: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(p.amount), 0)::FLOAT8
        FROM payments p
        JOIN bookings b ON b.id = p.booking_id
        WHERE p.status = 'Paid'
          AND b.booking_time::DATE BETWEEN $1 AND $2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(&state.db.pool)
    .await?;

    tracing::info!("Revenue {}..{}: {:.2}", start, end, total);

    Ok(Json(serde_json::json!({
        "startDate": start,
        "endDate": end,
        "totalRevenue": format!("{:.2}", total),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> RevenueQuery {
        RevenueQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn date_range_requires_both_ends() {
        assert!(matches!(parse_date_range(&query(Some("2025-01-01"), None)), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_date_range(&query(None, None)), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn date_range_rejects_bad_and_reversed_dates() {
        assert!(parse_date_range(&query(Some("01/02/2025"), Some("2025-02-01"))).is_err());
        assert!(parse_date_range(&query(Some("2025-03-01"), Some("2025-02-01"))).is_err());

        let (start, end) = parse_date_range(&query(Some("2025-02-01"), Some("2025-02-01"))).unwrap();
        assert_eq!(start, end);
    }
}
