pub mod analytics;
pub mod bookings;
pub mod catalog;
pub mod payment;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(bookings::routes())
        .merge(payment::routes())
        .merge(catalog::routes())
        .merge(analytics::routes())
}
