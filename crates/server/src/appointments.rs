//! Appointment booking routes.
//!
//! Endpoints:
//! - `POST /api/v1/appointments`              — book a slot (409 + suggestions on conflict)
//! - `GET  /api/v1/appointments/availability` — free slots for a date/service

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use treadline_core::domain::appointment::{Appointment, AppointmentId, ServiceType};
use treadline_core::errors::{ApplicationError, DomainError, InterfaceError};
use treadline_core::schedule::{find_conflict, fits_business_hours, free_slots, suggest_slots, Interval};
use treadline_notify::Notifier;
use treadline_store::BookingStore;

use crate::respond::{correlation_id, error_response};

#[derive(Clone)]
pub struct AppointmentsState {
    pub bookings: Arc<dyn BookingStore>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub customer_name: String,
    pub contact: String,
    pub service: String,
    pub date: String,
    pub start: String,
    pub vehicle: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub service: String,
    pub date: String,
    pub start: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct ConflictResponse {
    pub error: String,
    pub correlation_id: String,
    /// Up to five free same-day slots, chronological, `HH:MM`.
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub date: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub service: String,
    pub slots: Vec<String>,
}

pub fn router(state: AppointmentsState) -> Router {
    Router::new()
        .route("/api/v1/appointments", post(book_appointment))
        .route("/api/v1/appointments/availability", get(availability))
        .with_state(state)
}

struct ValidatedBooking {
    customer_name: String,
    contact: String,
    service: ServiceType,
    date: NaiveDate,
    start: NaiveTime,
    vehicle: Option<String>,
}

fn validate_request(request: &BookRequest, now: NaiveDateTime) -> Result<ValidatedBooking, DomainError> {
    let customer_name = request.customer_name.trim();
    if customer_name.is_empty() {
        return Err(DomainError::InvariantViolation("customer_name is required".to_string()));
    }
    let contact = request.contact.trim();
    if contact.is_empty() {
        return Err(DomainError::InvariantViolation("contact is required".to_string()));
    }

    let service: ServiceType = request.service.parse()?;
    let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::InvalidAppointmentTime(format!(
            "date `{}` must be YYYY-MM-DD",
            request.date
        ))
    })?;
    let start = NaiveTime::parse_from_str(request.start.trim(), "%H:%M").map_err(|_| {
        DomainError::InvalidAppointmentTime(format!("start `{}` must be HH:MM", request.start))
    })?;

    if !fits_business_hours(start, service) {
        return Err(DomainError::InvalidAppointmentTime(
            "the appointment does not fit inside business hours 09:00-18:00".to_string(),
        ));
    }
    if date.and_time(start) < now {
        return Err(DomainError::InvalidAppointmentTime(
            "the requested time is in the past".to_string(),
        ));
    }

    Ok(ValidatedBooking {
        customer_name: customer_name.to_string(),
        contact: contact.to_string(),
        service,
        date,
        start,
        vehicle: request.vehicle.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string),
    })
}

async fn book_appointment(
    State(state): State<AppointmentsState>,
    Json(request): Json<BookRequest>,
) -> Response {
    let correlation_id = correlation_id();

    let validated = match validate_request(&request, Local::now().naive_local()) {
        Ok(validated) => validated,
        Err(error) => {
            return error_response(
                ApplicationError::from(error).into_interface(correlation_id),
            )
            .into_response()
        }
    };

    let existing = match state.bookings.list_appointments().await {
        Ok(existing) => existing,
        Err(error) => {
            warn!(
                event_name = "appointments.store_unavailable",
                correlation_id = %correlation_id,
                error = %error,
                "could not fetch existing bookings"
            );
            return error_response(
                ApplicationError::Storage(error.to_string()).into_interface(correlation_id),
            )
            .into_response();
        }
    };

    let requested = Interval::for_service(validated.date, validated.start, validated.service);
    let taken: Vec<Interval> = existing.iter().map(Interval::for_appointment).collect();

    if find_conflict(&requested, &taken).is_some() {
        let suggestions = suggest_slots(validated.date, validated.service, &existing)
            .iter()
            .map(|slot| slot.format("%H:%M").to_string())
            .collect();
        info!(
            event_name = "appointments.conflict",
            correlation_id = %correlation_id,
            date = %validated.date,
            start = %validated.start,
            "requested slot conflicts with an existing booking"
        );
        let conflict = InterfaceError::Conflict {
            message: "requested slot overlaps an existing booking".to_string(),
            correlation_id: correlation_id.clone(),
        };
        return (
            StatusCode::CONFLICT,
            Json(ConflictResponse {
                error: conflict.user_message().to_string(),
                correlation_id,
                suggestions,
            }),
        )
            .into_response();
    }

    let appointment = Appointment {
        id: AppointmentId(format!("apt-{}", Uuid::new_v4())),
        customer_name: validated.customer_name,
        contact: validated.contact,
        service: validated.service,
        date: validated.date,
        start: validated.start,
        vehicle: validated.vehicle,
    };

    if let Err(error) = state.bookings.append_appointment(&appointment).await {
        warn!(
            event_name = "appointments.append_failed",
            correlation_id = %correlation_id,
            error = %error,
            "could not persist the booking row"
        );
        return error_response(
            ApplicationError::Storage(error.to_string()).into_interface(correlation_id),
        )
        .into_response();
    }

    // Best-effort: a lost confirmation never unwinds a stored booking.
    if let Err(error) = state.notifier.send_confirmation(&appointment).await {
        warn!(
            event_name = "appointments.notify_failed",
            correlation_id = %correlation_id,
            channel = state.notifier.channel_name(),
            error = %error,
            "confirmation dispatch failed"
        );
    }

    info!(
        event_name = "appointments.booked",
        correlation_id = %correlation_id,
        appointment_id = %appointment.id.0,
        service = appointment.service.as_str(),
        date = %appointment.date,
        start = %appointment.start,
        "appointment booked"
    );

    (
        StatusCode::CREATED,
        Json(BookResponse {
            id: appointment.id.0,
            service: appointment.service.as_str().to_string(),
            date: appointment.date.format("%Y-%m-%d").to_string(),
            start: appointment.start.format("%H:%M").to_string(),
            duration_minutes: appointment.service.duration_minutes(),
        }),
    )
        .into_response()
}

async fn availability(
    State(state): State<AppointmentsState>,
    Query(params): Query<AvailabilityParams>,
) -> Response {
    let correlation_id = correlation_id();

    let service: ServiceType = match params.service.parse() {
        Ok(service) => service,
        Err(error) => {
            return error_response(
                ApplicationError::from(error).into_interface(correlation_id),
            )
            .into_response()
        }
    };
    let date = match NaiveDate::parse_from_str(params.date.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            let error = DomainError::InvalidAppointmentTime(format!(
                "date `{}` must be YYYY-MM-DD",
                params.date
            ));
            return error_response(
                ApplicationError::from(error).into_interface(correlation_id),
            )
            .into_response();
        }
    };

    let existing = match state.bookings.list_appointments().await {
        Ok(existing) => existing,
        Err(error) => {
            return error_response(
                ApplicationError::Storage(error.to_string()).into_interface(correlation_id),
            )
            .into_response()
        }
    };

    let slots = free_slots(date, service, &existing)
        .iter()
        .map(|slot| slot.format("%H:%M").to_string())
        .collect();

    (
        StatusCode::OK,
        Json(AvailabilityResponse {
            date: params.date.trim().to_string(),
            service: service.as_str().to_string(),
            slots,
        }),
    )
        .into_response()
}
