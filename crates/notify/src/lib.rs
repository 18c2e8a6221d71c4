//! Confirmation dispatch for booked appointments.
//!
//! The notification channel is a pluggable capability selected by
//! configuration, not a family of parallel services: `whatsapp` sends a
//! template message through the Cloud API, `email` renders an HTML body and
//! hands it to an HTTP mail relay, `noop` swallows the message (useful in
//! development and tests). Delivery is best-effort; the booking itself never
//! depends on it.

pub mod email;
pub mod whatsapp;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use treadline_core::config::{NotifyChannel, NotifyConfig};
use treadline_core::domain::appointment::Appointment;

pub use email::EmailNotifier;
pub use whatsapp::WhatsAppNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(String),
    #[error("notification channel rejected the message with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("template rendering failed: {0}")]
    Template(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), NotifyError>;
    fn channel_name(&self) -> &'static str;
}

#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        debug!(
            event_name = "notify.noop.dropped",
            appointment_id = %appointment.id.0,
            "noop channel dropped confirmation"
        );
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "noop"
    }
}

/// Build the channel the configuration selects.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.channel {
        NotifyChannel::Whatsapp => Ok(Arc::new(WhatsAppNotifier::from_config(&config.whatsapp))),
        NotifyChannel::Email => Ok(Arc::new(EmailNotifier::from_config(&config.email)?)),
        NotifyChannel::Noop => Ok(Arc::new(NoopNotifier)),
    }
}
