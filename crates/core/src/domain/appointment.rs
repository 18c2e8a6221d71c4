use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Alignment,
    TireChange,
    Rotation,
    Balancing,
    Repair,
    Inspection,
}

impl ServiceType {
    /// Alignment blocks a full hour; everything else books a half-hour slot.
    pub fn duration_minutes(self) -> i64 {
        match self {
            Self::Alignment => 60,
            _ => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alignment => "alignment",
            Self::TireChange => "tire_change",
            Self::Rotation => "rotation",
            Self::Balancing => "balancing",
            Self::Repair => "repair",
            Self::Inspection => "inspection",
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "alignment" => Ok(Self::Alignment),
            "tire_change" | "tire change" => Ok(Self::TireChange),
            "rotation" => Ok(Self::Rotation),
            "balancing" => Ok(Self::Balancing),
            "repair" => Ok(Self::Repair),
            "inspection" => Ok(Self::Inspection),
            other => Err(DomainError::UnknownServiceType(other.to_string())),
        }
    }
}

/// A confirmed booking, reconstructed from a row of the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub customer_name: String,
    pub contact: String,
    pub service: ServiceType,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub vehicle: Option<String>,
}
