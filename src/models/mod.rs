pub mod booking;
pub mod payment;
pub mod seat;
pub mod showtime;

pub use booking::{BookingDetails, BookingStatus, UserBooking};
pub use payment::{Payment, PaymentAction, PaymentMethod, PaymentStatus};
pub use seat::Seat;
pub use showtime::{Movie, ShowtimeForBooking, TicketPrice};
