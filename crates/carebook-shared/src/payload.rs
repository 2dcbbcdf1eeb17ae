use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

use crate::appointment::AppointmentStatus;

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct CreateAppointmentParams {
  pub user_id:           String,
  pub patient_id:        String,
  pub primary_physician: String,
  pub schedule:          DateTime<Utc>,
  pub reason:            String,
  pub status:            AppointmentStatus,
  pub note:              Option<String>
}

/// Partial appointment carried by an
/// update. The variant is the mode tag
/// and decides the resulting status.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(
  tag = "type",
  rename_all = "lowercase"
)]
pub enum AppointmentUpdate {
  Schedule {
    primary_physician: String,
    schedule:          DateTime<Utc>
  },
  Cancel {
    cancellation_reason: String
  }
}

impl AppointmentUpdate {
  pub fn status(
    &self
  ) -> AppointmentStatus {
    match self {
      | Self::Schedule { .. } => {
        AppointmentStatus::Scheduled
      }
      | Self::Cancel { .. } => {
        AppointmentStatus::Cancelled
      }
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      | Self::Schedule { .. } => {
        "schedule"
      }
      | Self::Cancel { .. } => "cancel"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct UpdateAppointmentParams {
  pub user_id:        String,
  pub appointment_id: Uuid,
  pub update:         AppointmentUpdate
}

#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct AppointmentsListArgs {
  pub patient_id: Option<String>,
  pub status:     Option<AppointmentStatus>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct AppointmentIdArg {
  pub id: Uuid
}

/// Identity the desktop shell books
/// appointments for.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SessionDto {
  pub user_id:    String,
  pub patient_id: String
}

/// Frontend interaction breadcrumb
/// forwarded into the backend log.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct UiLogArg {
  pub event:  String,
  pub detail: String
}
