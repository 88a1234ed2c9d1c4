use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A showtime together with the theatre its screen belongs to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowtimeForBooking {
    #[serde(rename = "showtimeID")]
    pub id: i64,
    #[serde(rename = "movieID")]
    pub movie_id: i64,
    #[serde(rename = "screenID")]
    pub screen_id: i64,
    #[serde(rename = "theatreID")]
    pub theatre_id: i64,
    #[serde(rename = "showDate")]
    pub show_date: NaiveDate,
    #[serde(rename = "showStartTime")]
    pub start_time: NaiveTime,
    #[serde(rename = "showEndTime")]
    pub end_time: NaiveTime,
    #[serde(rename = "availableSeats")]
    pub available_seats: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketPrice {
    #[serde(rename = "ticketID")]
    pub ticket_id: i64,
    #[serde(rename = "showtimeID")]
    pub showtime_id: i64,
    pub price: f64,
    #[serde(rename = "availableTickets")]
    pub available_tickets: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movieID")]
    pub id: i64,
    pub title: String,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub duration: Option<i32>,
    pub description: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}
