use axum::{routing::get, Router};

use crate::state::AppState;

pub mod bookings;
pub mod health;
pub mod invoices;
pub mod reports;

pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(bookings::router())
        .merge(invoices::router())
        .merge(reports::router())
}
