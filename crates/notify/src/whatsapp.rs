//! WhatsApp Cloud API template sender.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use treadline_core::config::WhatsAppConfig;
use treadline_core::domain::appointment::Appointment;

use crate::{Notifier, NotifyError};

const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v19.0";
const TEMPLATE_LANGUAGE: &str = "es_MX";

pub struct WhatsAppNotifier {
    client: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    access_token: SecretString,
    template: String,
}

impl WhatsAppNotifier {
    pub fn from_config(config: &WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_GRAPH_URL.to_string(),
            phone_number_id: config.phone_number_id.clone(),
            access_token: config.access_token.clone(),
            template: config.template.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base_url, self.phone_number_id)
    }
}

/// The template carries four body parameters, in order: customer name,
/// service, date, start time.
pub fn template_payload(template: &str, appointment: &Appointment) -> Value {
    let parameter = |text: String| json!({ "type": "text", "text": text });

    json!({
        "messaging_product": "whatsapp",
        "to": appointment.contact,
        "type": "template",
        "template": {
            "name": template,
            "language": { "code": TEMPLATE_LANGUAGE },
            "components": [{
                "type": "body",
                "parameters": [
                    parameter(appointment.customer_name.clone()),
                    parameter(appointment.service.as_str().to_string()),
                    parameter(appointment.date.format("%Y-%m-%d").to_string()),
                    parameter(appointment.start.format("%H:%M").to_string()),
                ],
            }],
        },
    })
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send_confirmation(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(self.access_token.expose_secret())
            .json(&template_payload(&self.template, appointment))
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
        "whatsapp"
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::template_payload;
    use treadline_core::domain::appointment::{Appointment, AppointmentId, ServiceType};

    #[test]
    fn payload_carries_the_template_and_ordered_parameters() {
        let appointment = Appointment {
            id: AppointmentId("apt-7".to_string()),
            customer_name: "Luis Rojas".to_string(),
            contact: "+5215598765432".to_string(),
            service: ServiceType::Alignment,
            date: NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date"),
            start: NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"),
            vehicle: None,
        };

        let payload = template_payload("appointment_confirmation", &appointment);

        assert_eq!(payload["to"], "+5215598765432");
        assert_eq!(payload["template"]["name"], "appointment_confirmation");

        let parameters = payload["template"]["components"][0]["parameters"]
            .as_array()
            .expect("parameters should be an array");
        let texts: Vec<_> = parameters.iter().map(|p| p["text"].as_str().unwrap_or("")).collect();
        assert_eq!(texts, vec!["Luis Rojas", "alignment", "2026-04-01", "12:00"]);
    }
}
