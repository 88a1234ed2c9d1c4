//! booking.rs
//!
//! Booking Transaction Manager.
//!
//! 1.  **create_booking**: one database transaction that writes the booking,
//!     one `seat_reservations` row per seat and the `Pending` payment row.
//!     Every read it depends on (showtime price, seat layout, seats already
//!     held) happens inside the same transaction before the first write.
//! 2.  **Payment transitions**: toggle and refund. The current status is read,
//!     the next one is computed by [`PaymentStatus::apply`] and written back
//!     with a compare-and-set, so a concurrent change makes the call fail
//!     instead of being overwritten.
//! 3.  **Booking cancellation** and the read views (receipt, history).

use serde::Serialize;
use sqlx::{PgConnection, Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    config::FeatureFlags,
    database::Database,
    error::ServiceError,
    models::{
        BookingDetails, BookingStatus, Payment, PaymentAction, PaymentMethod, PaymentStatus,
        UserBooking,
    },
    services::catalog::{self, BookingTarget},
};

const REFUND_REJECTED: &str = "Payment not found, not paid, or already refunded";
const TOGGLE_REJECTED: &str = "Payment not found or its status cannot be toggled";

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i32,
    pub showtime_id: i64,
    pub seat_ids: Vec<i64>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    #[serde(rename = "bookingID")]
    pub booking_id: i64,
    #[serde(rename = "paymentID")]
    pub payment_id: i64,
    #[serde(rename = "seatsBooked")]
    pub seats_booked: i32,
    pub amount: f64,
}

#[derive(Clone)]
pub struct BookingManager {
    db: Database,
    features: FeatureFlags,
}

impl BookingManager {
    pub fn new(db: Database, features: FeatureFlags) -> Self {
        Self { db, features }
    }

    /// Books `seat_ids` for a showtime and opens its payment ledger row.
    ///
    /// Nothing is written unless every seat belongs to the showtime's screen and
    /// the showtime has a ticket price. Any failure after the first insert rolls
    /// the whole booking back.
    pub async fn create_booking(&self, req: NewBooking) -> Result<BookingReceipt, ServiceError> {
        catalog::validate_seat_selection(&req.seat_ids)?;

        let mut tx = self.db.pool.begin().await?;

        let target = catalog::resolve_booking_target(&mut tx, req.showtime_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Showtime not found or has no ticket price".to_string()))?;

        let foreign = catalog::seats_outside_screen(&mut tx, target.screen_id, &req.seat_ids).await?;
        if !foreign.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Seats {:?} do not belong to the screen of showtime {}",
                foreign, req.showtime_id
            )));
        }

        if self.features.prevent_double_booking {
            // Serializes bookings per showtime until this transaction ends
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(req.showtime_id)
                .execute(&mut *tx)
                .await?;

            let taken = seats_already_held(&mut tx, req.showtime_id, &req.seat_ids).await?;
            if !taken.is_empty() {
                warn!("Showtime {}: seats {:?} already held", req.showtime_id, taken);
                return Err(ServiceError::SeatsTaken(taken));
            }
        }

        match insert_booking_rows(&mut tx, &req, &target).await {
            Ok(receipt) => {
                tx.commit().await.map_err(ServiceError::Transaction)?;
                info!(
                    "Booking {} created: user={}, showtime={}, seats={}, payment={} ({})",
                    receipt.booking_id,
                    req.user_id,
                    req.showtime_id,
                    receipt.seats_booked,
                    receipt.payment_id,
                    req.payment_method
                );
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("rollback after failed booking insert also failed: {}", rollback_err);
                }
                Err(ServiceError::Transaction(e))
            }
        }
    }

    /// Pending <-> Paid. With `legacy_payment_toggle` on, anything that is not
    /// Pending goes back to Pending.
    pub async fn toggle_payment_status(
        &self,
        payment_id: i64,
        owner: Option<i32>,
    ) -> Result<PaymentStatus, ServiceError> {
        let action = if self.features.legacy_payment_toggle {
            PaymentAction::LegacyToggle
        } else {
            PaymentAction::Toggle
        };
        self.transition_payment(payment_id, owner, action, TOGGLE_REJECTED).await
    }

    /// Paid -> Refunded. Any other starting status is rejected and left as is.
    pub async fn refund_payment(
        &self,
        payment_id: i64,
        owner: Option<i32>,
    ) -> Result<PaymentStatus, ServiceError> {
        self.transition_payment(payment_id, owner, PaymentAction::Refund, REFUND_REJECTED).await
    }

    async fn transition_payment(
        &self,
        payment_id: i64,
        owner: Option<i32>,
        action: PaymentAction,
        rejected: &str,
    ) -> Result<PaymentStatus, ServiceError> {
        let current: Option<String> = sqlx::query_scalar(
            "SELECT p.status
             FROM payments p
             JOIN bookings b ON b.id = p.booking_id
             WHERE p.id = $1 AND ($2::INT IS NULL OR b.user_id = $2)",
        )
        .bind(payment_id)
        .bind(owner)
        .fetch_optional(&self.db.pool)
        .await?;

        let current: PaymentStatus = current
            .ok_or_else(|| ServiceError::NotFound(rejected.to_string()))?
            .parse()
            .map_err(|e| ServiceError::Internal(sqlx::Error::Decode(Box::new(e))))?;

        let next = current
            .apply(action)
            .ok_or_else(|| ServiceError::InvalidState(rejected.to_string()))?;

        let updated = sqlx::query(
            "UPDATE payments SET status = $1, updated_at = NOW()
             WHERE id = $2 AND status = $3",
        )
        .bind(next.as_str())
        .bind(payment_id)
        .bind(current.as_str())
        .execute(&self.db.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            // Someone else moved it between our read and write
            return Err(ServiceError::InvalidState(rejected.to_string()));
        }

        info!("Payment {}: {} -> {} ({:?})", payment_id, current, next, action);
        Ok(next)
    }

    /// Booked -> Cancelled. The payment row is left alone; a paid payment of a
    /// cancelled booking is what the client offers a refund for.
    pub async fn cancel_booking(
        &self,
        booking_id: i64,
        owner: Option<i32>,
    ) -> Result<BookingStatus, ServiceError> {
        const REJECTED: &str = "Booking not found or already closed";

        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM bookings WHERE id = $1 AND ($2::INT IS NULL OR user_id = $2)",
        )
        .bind(booking_id)
        .bind(owner)
        .fetch_optional(&self.db.pool)
        .await?;

        let current: BookingStatus = current
            .ok_or_else(|| ServiceError::NotFound(REJECTED.to_string()))?
            .parse()
            .map_err(|e| ServiceError::Internal(sqlx::Error::Decode(Box::new(e))))?;

        let next = current
            .cancel()
            .ok_or_else(|| ServiceError::InvalidState(REJECTED.to_string()))?;

        let updated = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(booking_id)
            .bind(current.as_str())
            .execute(&self.db.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(ServiceError::InvalidState(REJECTED.to_string()));
        }

        info!("Booking {} cancelled", booking_id);
        Ok(next)
    }

    pub async fn booking_details(
        &self,
        booking_id: i64,
        owner: Option<i32>,
    ) -> Result<BookingDetails, ServiceError> {
        sqlx::query_as::<_, BookingDetails>(
            r#"
            SELECT b.id AS booking_id,
                   b.user_id,
                   m.title AS movie_title,
                   t.name AS theatre_name,
                   sc.name AS screen_name,
                   st.show_date,
                   b.seats_booked,
                   ARRAY(
                       SELECT l.seat_row || l.seat_number::TEXT
                       FROM seat_reservations sr
                       JOIN seat_layout l ON l.id = sr.seat_id
                       WHERE sr.booking_id = b.id
                       ORDER BY l.seat_row, l.seat_number
                   ) AS seats,
                   b.status AS booking_status,
                   p.id AS payment_id,
                   p.method AS payment_method,
                   p.status AS payment_status,
                   p.amount::FLOAT8 AS amount
            FROM bookings b
            JOIN showtimes st ON st.id = b.showtime_id
            JOIN screens sc ON sc.id = st.screen_id
            JOIN theatres t ON t.id = sc.theatre_id
            JOIN movies m ON m.id = st.movie_id
            JOIN payments p ON p.booking_id = b.id
            WHERE b.id = $1 AND ($2::INT IS NULL OR b.user_id = $2)
            "#,
        )
        .bind(booking_id)
        .bind(owner)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))
    }

    pub async fn user_bookings(&self, user_id: i32) -> Result<Vec<UserBooking>, ServiceError> {
        let rows = sqlx::query_as::<_, UserBooking>(
            r#"
            SELECT b.id AS booking_id,
                   b.showtime_id,
                   b.seats_booked,
                   b.status AS booking_status,
                   b.booking_time,
                   m.title AS movie_title,
                   t.name AS theatre_name,
                   sc.name AS screen_name,
                   p.id AS payment_id,
                   p.method AS payment_method,
                   p.status AS payment_status,
                   p.amount::FLOAT8 AS amount
            FROM bookings b
            JOIN showtimes st ON st.id = b.showtime_id
            JOIN movies m ON m.id = st.movie_id
            JOIN screens sc ON sc.id = st.screen_id
            JOIN theatres t ON t.id = sc.theatre_id
            JOIN payments p ON p.booking_id = b.id
            WHERE b.user_id = $1
            ORDER BY b.booking_time DESC, b.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(rows)
    }

    pub async fn payment(&self, payment_id: i64, owner: Option<i32>) -> Result<Payment, ServiceError> {
        sqlx::query_as::<_, Payment>(
            "SELECT p.id, p.booking_id, p.amount::FLOAT8 AS amount, p.method, p.status,
                    p.created_at, p.updated_at
             FROM payments p
             JOIN bookings b ON b.id = p.booking_id
             WHERE p.id = $1 AND ($2::INT IS NULL OR b.user_id = $2)",
        )
        .bind(payment_id)
        .bind(owner)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Payment not found".to_string()))
    }
}

/// Seats from `seat_ids` already reserved by a non-cancelled booking of the showtime.
async fn seats_already_held(
    conn: &mut PgConnection,
    showtime_id: i64,
    seat_ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT sr.seat_id
         FROM seat_reservations sr
         JOIN bookings b ON b.id = sr.booking_id
         WHERE b.showtime_id = $1
           AND b.status <> 'Cancelled'
           AND sr.seat_id = ANY($2)
         ORDER BY sr.seat_id",
    )
    .bind(showtime_id)
    .bind(seat_ids)
    .fetch_all(&mut *conn)
    .await
}

// The three writes of a booking. Caller owns commit/rollback.
async fn insert_booking_rows(
    tx: &mut Transaction<'_, Postgres>,
    req: &NewBooking,
    target: &BookingTarget,
) -> Result<BookingReceipt, sqlx::Error> {
    let seats_booked = req.seat_ids.len() as i32;

    let booking_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO bookings (user_id, showtime_id, seats_booked, status)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(req.user_id)
    .bind(target.showtime_id)
    .bind(seats_booked)
    .bind(BookingStatus::Booked.as_str())
    .fetch_one(&mut **tx)
    .await?;

    let reserved = sqlx::query(
        "INSERT INTO seat_reservations (booking_id, seat_id)
         SELECT $1, seat_id FROM UNNEST($2::BIGINT[]) AS seat_id",
    )
    .bind(booking_id)
    .bind(&req.seat_ids)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if reserved != req.seat_ids.len() as u64 {
        return Err(sqlx::Error::Protocol(format!(
            "reserved {} of {} seats for booking {}",
            reserved,
            req.seat_ids.len(),
            booking_id
        )));
    }

    // Amount is computed in SQL to keep NUMERIC precision
    let (payment_id, amount): (i64, f64) = sqlx::query_as(
        "INSERT INTO payments (booking_id, amount, method, status)
         SELECT $1, t.price * $2, $3, $4
         FROM tickets t
         WHERE t.showtime_id = $5
         RETURNING id, amount::FLOAT8",
    )
    .bind(booking_id)
    .bind(seats_booked)
    .bind(req.payment_method.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(target.showtime_id)
    .fetch_one(&mut **tx)
    .await?;

    tracing::debug!(
        "booking {}: {} seats at {:.2} each, payment {} amount {:.2}",
        booking_id,
        seats_booked,
        target.price,
        payment_id,
        amount
    );

    Ok(BookingReceipt { booking_id, payment_id, seats_booked, amount })
}
