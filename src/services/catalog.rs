//! catalog.rs
//!
//! Read side of the catalog (prices, showtimes, seat layouts) plus the two
//! lookups the booking transaction runs inside its own transaction: resolving
//! a showtime to its screen and price, and checking that seat ids belong to
//! that screen.

use sqlx::PgConnection;
use std::collections::HashSet;
use tracing::info;

use crate::{
    database::Database,
    error::ServiceError,
    models::{Movie, Seat, ShowtimeForBooking, TicketPrice},
};

/// Rows per screen, lettered from 'A'.
pub const LAYOUT_ROWS: u8 = 20;
pub const LAYOUT_SEATS_PER_ROW: i32 = 5;

/// Screen and per-seat price a showtime resolves to.
#[derive(Debug, Clone, Copy)]
pub struct BookingTarget {
    pub showtime_id: i64,
    pub screen_id: i64,
    pub price: f64,
}

/// The fixed seat grid every new screen gets: A1..A5, B1..B5, ... T5.
pub fn seat_grid() -> Vec<(String, i32)> {
    (0..LAYOUT_ROWS)
        .flat_map(|r| {
            let row = char::from(b'A' + r).to_string();
            (1..=LAYOUT_SEATS_PER_ROW).map(move |n| (row.clone(), n))
        })
        .collect()
}

/// Shape checks on a seat selection that need no database.
pub fn validate_seat_selection(seat_ids: &[i64]) -> Result<(), ServiceError> {
    if seat_ids.is_empty() {
        return Err(ServiceError::Validation("No seats selected.".to_string()));
    }
    if let Some(bad) = seat_ids.iter().find(|id| **id <= 0) {
        return Err(ServiceError::Validation(format!("Invalid seat id {}", bad)));
    }
    let mut seen = HashSet::with_capacity(seat_ids.len());
    if let Some(dup) = seat_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(ServiceError::Validation(format!("Seat {} selected more than once", dup)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn ticket_prices(&self) -> Result<Vec<TicketPrice>, ServiceError> {
        let prices = sqlx::query_as::<_, TicketPrice>(
            "SELECT id AS ticket_id, showtime_id, price::FLOAT8 AS price, available_tickets
             FROM tickets
             ORDER BY showtime_id",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(prices)
    }

    pub async fn showtimes_for_booking(&self) -> Result<Vec<ShowtimeForBooking>, ServiceError> {
        let showtimes = sqlx::query_as::<_, ShowtimeForBooking>(
            "SELECT st.id, st.movie_id, st.screen_id, sc.theatre_id, st.show_date,
                    st.start_time, st.end_time, st.available_seats
             FROM showtimes st
             JOIN screens sc ON sc.id = st.screen_id
             ORDER BY st.show_date, st.start_time",
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(showtimes)
    }

    pub async fn seat_layout(&self, screen_id: i64) -> Result<Vec<Seat>, ServiceError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM screens WHERE id = $1)")
            .bind(screen_id)
            .fetch_one(&self.db.pool)
            .await?;
        if !exists {
            return Err(ServiceError::NotFound("Screen not found".to_string()));
        }

        let seats = sqlx::query_as::<_, Seat>(
            "SELECT id, screen_id, seat_row, seat_number
             FROM seat_layout
             WHERE screen_id = $1
             ORDER BY seat_row, seat_number",
        )
        .bind(screen_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(seats)
    }

    pub async fn movies_by_theatre(&self, theatre_id: i64) -> Result<Vec<Movie>, ServiceError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT DISTINCT m.id, m.title, m.release_date, m.genre, m.duration,
                    m.description, m.image_url
             FROM movies m
             JOIN showtimes st ON st.movie_id = m.id
             JOIN screens sc ON sc.id = st.screen_id
             WHERE sc.theatre_id = $1
             ORDER BY m.title",
        )
        .bind(theatre_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(movies)
    }

    /// Creates a screen and its seat layout in one transaction.
    pub async fn create_screen(&self, theatre_id: i64, name: &str) -> Result<i64, ServiceError> {
        let mut tx = self.db.pool.begin().await?;

        let theatre_exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM theatres WHERE id = $1)")
            .bind(theatre_id)
            .fetch_one(&mut *tx)
            .await?;
        if !theatre_exists {
            return Err(ServiceError::NotFound("Theatre not found".to_string()));
        }

        let (rows, numbers): (Vec<String>, Vec<i32>) = seat_grid().into_iter().unzip();

        let screen_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO screens (theatre_id, name, total_seats) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(theatre_id)
        .bind(name)
        .bind(rows.len() as i32)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO seat_layout (screen_id, seat_row, seat_number)
             SELECT $1, r, n FROM UNNEST($2::VARCHAR[], $3::INT[]) AS l(r, n)",
        )
        .bind(screen_id)
        .bind(&rows)
        .bind(&numbers)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Screen {} created for theatre {} with {} seats", screen_id, theatre_id, rows.len());
        Ok(screen_id)
    }
}

/// Resolves a showtime to its screen and ticket price. `None` when the showtime
/// does not exist or has no ticket priced for it.
pub(crate) async fn resolve_booking_target(
    conn: &mut PgConnection,
    showtime_id: i64,
) -> Result<Option<BookingTarget>, sqlx::Error> {
    let row: Option<(i64, f64)> = sqlx::query_as(
        "SELECT st.screen_id, t.price::FLOAT8
         FROM showtimes st
         JOIN tickets t ON t.showtime_id = st.id
         WHERE st.id = $1",
    )
    .bind(showtime_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(screen_id, price)| BookingTarget { showtime_id, screen_id, price }))
}

/// Seat ids from `seat_ids` that are not part of the screen's layout.
pub(crate) async fn seats_outside_screen(
    conn: &mut PgConnection,
    screen_id: i64,
    seat_ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT s.id
         FROM UNNEST($2::BIGINT[]) AS s(id)
         WHERE NOT EXISTS (
             SELECT 1 FROM seat_layout l WHERE l.id = s.id AND l.screen_id = $1
         )
         ORDER BY s.id",
    )
    .bind(screen_id)
    .bind(seat_ids)
    .fetch_all(&mut *conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_twenty_rows_of_five() {
        let grid = seat_grid();
        assert_eq!(grid.len(), 100);
        assert_eq!(grid.first(), Some(&("A".to_string(), 1)));
        assert_eq!(grid.last(), Some(&("T".to_string(), 5)));
        let unique: HashSet<_> = grid.iter().collect();
        assert_eq!(unique.len(), grid.len());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = validate_seat_selection(&[]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "No seats selected."));
    }

    #[test]
    fn duplicate_and_non_positive_ids_are_rejected() {
        assert!(matches!(validate_seat_selection(&[5, 6, 5]), Err(ServiceError::Validation(_))));
        assert!(matches!(validate_seat_selection(&[0]), Err(ServiceError::Validation(_))));
        assert!(validate_seat_selection(&[5, 6]).is_ok());
    }
}
