use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::payment::{PaymentMethod, PaymentStatus, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Booked,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "Booked",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }

    // Only a live booking can be cancelled
    pub fn cancel(self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Booked => Some(BookingStatus::Cancelled),
            BookingStatus::Cancelled | BookingStatus::Completed => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Booked" => Ok(BookingStatus::Booked),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Completed" => Ok(BookingStatus::Completed),
            other => Err(UnknownVariant { kind: "booking status", value: other.to_string() }),
        }
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Receipt view of one booking: where, what, and how it is being paid.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookingDetails {
    #[serde(rename = "bookingID")]
    pub booking_id: i64,
    #[serde(rename = "userID")]
    pub user_id: i32,
    #[serde(rename = "movieTitle")]
    pub movie_title: String,
    #[serde(rename = "theatreName")]
    pub theatre_name: String,
    #[serde(rename = "screenName")]
    pub screen_name: String,
    #[serde(rename = "showDate")]
    pub show_date: NaiveDate,
    #[serde(rename = "seatsBooked")]
    pub seats_booked: i32,
    pub seats: Vec<String>,
    #[sqlx(try_from = "String")]
    #[serde(rename = "bookingStatus")]
    pub booking_status: BookingStatus,
    #[serde(rename = "paymentID")]
    pub payment_id: i64,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    pub amount: f64,
}

// Row of a user's booking history
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBooking {
    #[serde(rename = "bookingID")]
    pub booking_id: i64,
    #[serde(rename = "showtimeID")]
    pub showtime_id: i64,
    #[serde(rename = "seatsBooked")]
    pub seats_booked: i32,
    #[sqlx(try_from = "String")]
    #[serde(rename = "bookingStatus")]
    pub booking_status: BookingStatus,
    #[serde(rename = "bookingTime")]
    pub booking_time: DateTime<Utc>,
    #[serde(rename = "movieTitle")]
    pub movie_title: String,
    #[serde(rename = "theatreName")]
    pub theatre_name: String,
    #[serde(rename = "screenName")]
    pub screen_name: String,
    #[serde(rename = "paymentID")]
    pub payment_id: i64,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[sqlx(try_from = "String")]
    #[serde(rename = "paymentStatus")]
    pub payment_status: PaymentStatus,
    pub amount: f64,
}
