//! Templated email through an HTTP mail relay.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tera::{Context, Tera};

use treadline_core::config::EmailConfig;
use treadline_core::domain::appointment::Appointment;

use crate::{Notifier, NotifyError};

const TEMPLATE_NAME: &str = "appointment_confirmation.html";

pub struct EmailNotifier {
    client: reqwest::Client,
    templates: Tera,
    relay_url: String,
    api_key: SecretString,
    from: String,
}

impl EmailNotifier {
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let mut templates = Tera::default();
        templates
            .add_raw_template(
                TEMPLATE_NAME,
                include_str!("../templates/appointment_confirmation.html"),
            )
            .map_err(|error| NotifyError::Template(error.to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            templates,
            relay_url: config.relay_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }

    fn render_body(&self, appointment: &Appointment) -> Result<String, NotifyError> {
        self.templates
            .render(TEMPLATE_NAME, &template_context(appointment))
            .map_err(|error| NotifyError::Template(error.to_string()))
    }
}

pub fn template_context(appointment: &Appointment) -> Context {
    let mut context = Context::new();
    context.insert("customer_name", &appointment.customer_name);
    context.insert("service", appointment.service.as_str());
    context.insert("date", &appointment.date.format("%Y-%m-%d").to_string());
    context.insert("start", &appointment.start.format("%H:%M").to_string());
    context.insert("vehicle", &appointment.vehicle);
    context
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        let html = self.render_body(appointment)?;
        let body = json!({
            "from": self.from,
            "to": appointment.contact,
            "subject": "Appointment confirmed",
            "html": html,
        });

        let response = self
            .client
            .post(&self.relay_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status: status.as_u16(), body });
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "email"
    }
}
