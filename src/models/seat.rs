use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    #[serde(rename = "seatID")]
    pub id: i64,
    #[serde(rename = "screenID")]
    pub screen_id: i64,
    #[serde(rename = "seatRow")]
    pub seat_row: String,
    #[serde(rename = "seatNumber")]
    pub seat_number: i32,
}

