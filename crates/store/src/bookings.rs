//! The booking row store: a remote spreadsheet used as a makeshift datastore.
//!
//! The trait exposes exactly the two capabilities the workflow needs — read
//! all rows, append a row. `SheetsBookingStore` talks to the Google Sheets
//! values API; `InMemoryBookingStore` backs the tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use treadline_core::config::SheetsConfig;
use treadline_core::domain::appointment::{Appointment, AppointmentId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("row store request failed: {0}")]
    Http(String),
    #[error("row store rejected the request with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError>;
    async fn append_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;
}

/// Column layout of the booking worksheet, one appointment per row:
/// id | customer_name | contact | service | date | start | vehicle
const ROW_RANGE: &str = "A2:G";
const APPEND_RANGE: &str = "A:G";

pub struct SheetsBookingStore {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    api_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsBookingStore {
    pub fn from_config(config: &SheetsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            worksheet: config.worksheet.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// A1 notation requires the worksheet name single-quoted when it carries
    /// spaces or punctuation; embedded quotes are doubled. Quoting is always
    /// legal, so every name is quoted. Remaining reserved characters in the
    /// path are percent-encoded by the client's URL parser.
    fn quoted_worksheet(&self) -> String {
        format!("'{}'", self.worksheet.replace('\'', "''"))
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}!{}",
            self.base_url,
            self.spreadsheet_id,
            self.quoted_worksheet(),
            range
        )
    }
}

#[async_trait]
impl BookingStore for SheetsBookingStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let response = self
            .client
            .get(self.values_url(ROW_RANGE))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }

        let payload: ValuesResponse =
            response.json().await.map_err(|error| StoreError::Decode(error.to_string()))?;

        let mut appointments = Vec::with_capacity(payload.values.len());
        for (index, row) in payload.values.iter().enumerate() {
            match decode_row(row) {
                Ok(appointment) => appointments.push(appointment),
                Err(error) => {
                    // Hand-edited sheets accumulate junk rows; skip, don't fail.
                    warn!(
                        event_name = "bookings.row_skipped",
                        row = index + 2,
                        error = %error,
                        "skipping malformed booking row"
                    );
                }
            }
        }
        Ok(appointments)
    }

    async fn append_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let url = format!("{}:append?valueInputOption=RAW", self.values_url(APPEND_RANGE));
        let body = json!({ "values": [encode_row(appointment)] });

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status: status.as_u16(), body });
        }
        Ok(())
    }
}

pub fn encode_row(appointment: &Appointment) -> Vec<String> {
    vec![
        appointment.id.0.clone(),
        appointment.customer_name.clone(),
        appointment.contact.clone(),
        appointment.service.as_str().to_string(),
        appointment.date.format("%Y-%m-%d").to_string(),
        appointment.start.format("%H:%M").to_string(),
        appointment.vehicle.clone().unwrap_or_default(),
    ]
}

pub fn decode_row(row: &[String]) -> Result<Appointment, StoreError> {
    let field = |index: usize, name: &str| -> Result<&str, StoreError> {
        row.get(index)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| StoreError::Decode(format!("missing column `{name}`")))
    };

    let service = field(3, "service")?
        .parse()
        .map_err(|error| StoreError::Decode(format!("service: {error}")))?;
    let date = NaiveDate::parse_from_str(field(4, "date")?.trim(), "%Y-%m-%d")
        .map_err(|error| StoreError::Decode(format!("date: {error}")))?;
    let start = parse_time(field(5, "start")?.trim())?;

    Ok(Appointment {
        id: AppointmentId(field(0, "id")?.trim().to_string()),
        customer_name: field(1, "customer_name")?.trim().to_string(),
        contact: field(2, "contact")?.trim().to_string(),
        service,
        date,
        start,
        vehicle: row
            .get(6)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string),
    })
}

fn parse_time(value: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|error| StoreError::Decode(format!("start: {error}")))
}

/// Test double with the same replace/append behavior as the remote sheet.
#[derive(Default)]
pub struct InMemoryBookingStore {
    rows: Mutex<Vec<Appointment>>,
    fail: Mutex<bool>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Appointment>) -> Self {
        Self { rows: Mutex::new(rows), fail: Mutex::new(false) }
    }

    /// Make every call fail, for exercising degraded paths.
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap_or_else(PoisonError::into_inner) = failing;
    }

    fn check_failing(&self) -> Result<(), StoreError> {
        if *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            Err(StoreError::Http("simulated row store outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.check_failing()?;
        Ok(self.rows.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn append_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.check_failing()?;
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).push(appointment.clone());
        Ok(())
    }
}
