//! Seam between the form and whatever
//! persists appointments.

use std::fmt;

use crate::appointment::Appointment;
use crate::payload::{
  CreateAppointmentParams,
  UpdateAppointmentParams
};

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  thiserror::Error,
)]
#[error("{message}")]
pub struct BackendError {
  message: String
}

impl BackendError {
  pub fn new(
    message: impl fmt::Display
  ) -> Self {
    Self {
      message: message.to_string()
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

/// Backend actions called by the form.
///
/// `Ok(None)` means the action ran but
/// produced no appointment; the form
/// treats that as a rejected submit.
#[allow(async_fn_in_trait)]
pub trait AppointmentBackend {
  async fn create_appointment(
    &self,
    params: CreateAppointmentParams
  ) -> Result<
    Option<Appointment>,
    BackendError
  >;

  async fn update_appointment(
    &self,
    params: UpdateAppointmentParams
  ) -> Result<
    Option<Appointment>,
    BackendError
  >;
}
