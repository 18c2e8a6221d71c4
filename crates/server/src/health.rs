use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use treadline_store::{BookingStore, PriceBook};

#[derive(Clone)]
pub struct HealthState {
    pub price_book: Arc<PriceBook>,
    pub bookings: Arc<dyn BookingStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub price_book: HealthCheck,
    pub booking_store: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let price_book = price_book_check(&state.price_book);
    let booking_store = booking_store_check(state.bookings.as_ref()).await;
    let ready = price_book.status == "ready" && booking_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "treadline-server runtime initialized".to_string(),
        },
        price_book,
        booking_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn price_book_check(price_book: &PriceBook) -> HealthCheck {
    let count = price_book.len();
    if count > 0 {
        HealthCheck { status: "ready", detail: format!("{count} products loaded") }
    } else {
        HealthCheck { status: "degraded", detail: "price book is empty".to_string() }
    }
}

async fn booking_store_check(bookings: &dyn BookingStore) -> HealthCheck {
    match bookings.list_appointments().await {
        Ok(rows) => {
            HealthCheck { status: "ready", detail: format!("{} booking rows visible", rows.len()) }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("booking store query failed: {error}") }
        }
    }
}
