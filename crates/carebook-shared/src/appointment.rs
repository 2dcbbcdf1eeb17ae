use std::fmt;
use std::str::FromStr;

use chrono::{
  DateTime,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

/// Placeholder stored when a new appointment is booked without a reason.
pub const DEFAULT_REASON: &str =
  "No Reason Provided";

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
  Pending,
  Scheduled,
  Cancelled
}

impl AppointmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Pending => "pending",
      | Self::Scheduled => "scheduled",
      | Self::Cancelled => "cancelled"
    }
  }

  /// Statuses reachable from `self`.
  /// `Scheduled -> Scheduled` is a
  /// reschedule; `Cancelled` is
  /// terminal.
  pub fn next_statuses(
    self
  ) -> &'static [AppointmentStatus] {
    match self {
      | Self::Pending => &[
        Self::Scheduled,
        Self::Cancelled
      ],
      | Self::Scheduled => &[
        Self::Scheduled,
        Self::Cancelled
      ],
      | Self::Cancelled => &[]
    }
  }

  pub fn can_transition_to(
    self,
    next: AppointmentStatus
  ) -> bool {
    self.next_statuses().contains(&next)
  }
}

impl fmt::Display for AppointmentStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AppointmentStatus {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "pending" => Ok(Self::Pending),
      | "scheduled" => {
        Ok(Self::Scheduled)
      }
      | "cancelled" | "canceled" => {
        Ok(Self::Cancelled)
      }
      | other => {
        Err(format!(
          "unknown appointment status: \
           {other}"
        ))
      }
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
pub struct Appointment {
  pub id:                  Uuid,
  pub user_id:             String,
  pub patient_id:          String,
  pub primary_physician:   String,
  pub schedule:            DateTime<Utc>,
  #[serde(default)]
  pub reason:              String,
  #[serde(default)]
  pub note:                Option<String>,
  pub status:              AppointmentStatus,
  #[serde(default)]
  pub cancellation_reason: Option<String>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>
}

impl Appointment {
  pub fn is_cancelled(&self) -> bool {
    self.status
      == AppointmentStatus::Cancelled
  }
}

#[cfg(test)]
mod tests {
  use super::AppointmentStatus;

  #[test]
  fn cancelled_is_terminal() {
    assert!(
      AppointmentStatus::Cancelled
        .next_statuses()
        .is_empty()
    );
    assert!(
      !AppointmentStatus::Cancelled
        .can_transition_to(
          AppointmentStatus::Scheduled
        )
    );
  }

  #[test]
  fn scheduled_can_be_rescheduled() {
    assert!(
      AppointmentStatus::Scheduled
        .can_transition_to(
          AppointmentStatus::Scheduled
        )
    );
    assert!(
      !AppointmentStatus::Scheduled
        .can_transition_to(
          AppointmentStatus::Pending
        )
    );
  }

  #[test]
  fn parses_both_cancel_spellings() {
    assert_eq!(
      "Canceled"
        .parse::<AppointmentStatus>(),
      Ok(AppointmentStatus::Cancelled)
    );
    assert_eq!(
      "cancelled"
        .parse::<AppointmentStatus>(),
      Ok(AppointmentStatus::Cancelled)
    );
    assert!(
      "done"
        .parse::<AppointmentStatus>()
        .is_err()
    );
  }

  #[test]
  fn status_serializes_lowercase() {
    let raw = serde_json::to_string(
      &AppointmentStatus::Scheduled
    )
    .expect("serialize status");
    assert_eq!(raw, "\"scheduled\"");
  }
}
