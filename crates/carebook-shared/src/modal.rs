//! Dialog wrapper around [`AppointmentForm`] for existing appointments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;
use crate::backend::{AppointmentBackend, BackendError};
use crate::form::{AppointmentForm, FormMode, SubmitError, SubmitOutcome, SubmitRequest};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModalMode {
    Schedule,
    Cancel,
}

impl ModalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Cancel => "cancel",
        }
    }

    pub fn form_mode(self) -> FormMode {
        match self {
            Self::Schedule => FormMode::Schedule,
            Self::Cancel => FormMode::Cancel,
        }
    }

    pub fn trigger_tone(self) -> TriggerTone {
        match self {
            Self::Schedule => TriggerTone::Positive,
            Self::Cancel => TriggerTone::Destructive,
        }
    }

    pub fn default_title(self) -> String {
        format!("{} Appointment", capitalize(self.as_str()))
    }

    pub fn default_description(self) -> String {
        format!(
            "Please fill in the following details to {} appointment",
            self.as_str()
        )
    }
}

impl fmt::Display for ModalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schedule" => Ok(Self::Schedule),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown modal mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTone {
    Positive,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerButton {
    pub label: String,
    pub tone: TriggerTone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalProps {
    pub patient_id: String,
    pub user_id: String,
    pub mode: ModalMode,
    pub title: String,
    pub description: String,
    pub appointment: Option<Appointment>,
}

impl ModalProps {
    /// Props with the stock title and description for `mode`.
    pub fn for_mode(
        user_id: impl Into<String>,
        patient_id: impl Into<String>,
        mode: ModalMode,
        appointment: Option<Appointment>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            user_id: user_id.into(),
            mode,
            title: mode.default_title(),
            description: mode.default_description(),
            appointment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentModal {
    mode: ModalMode,
    title: String,
    description: String,
    open: bool,
    form: AppointmentForm,
}

impl AppointmentModal {
    pub fn new(props: ModalProps, now: DateTime<Utc>) -> Self {
        let form = AppointmentForm::new(
            props.user_id,
            props.patient_id,
            props.mode.form_mode(),
            props.appointment,
            now,
        );
        Self {
            mode: props.mode,
            title: props.title,
            description: props.description,
            open: false,
            form,
        }
    }

    pub fn mode(&self) -> ModalMode {
        self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trigger(&self) -> TriggerButton {
        TriggerButton {
            label: self.mode.as_str().to_string(),
            tone: self.mode.trigger_tone(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.set_open(true);
    }

    /// Open-state setter. Closing discards unsaved edits, the same as
    /// unmounting the dialog body.
    pub fn set_open(&mut self, open: bool) {
        if !open && self.open {
            self.form.reset();
        }
        self.open = open;
    }

    pub fn form(&self) -> &AppointmentForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AppointmentForm {
        &mut self.form
    }

    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitError> {
        self.form.begin_submit()
    }

    /// Forwards to the form and closes the dialog when the change was saved.
    pub fn finish_submit(
        &mut self,
        result: Result<Option<Appointment>, BackendError>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let outcome = self.form.finish_submit(result)?;
        if matches!(outcome, SubmitOutcome::Updated { .. }) {
            self.set_open(false);
        }
        Ok(outcome)
    }

    pub async fn submit<B>(&mut self, backend: &B) -> Result<SubmitOutcome, SubmitError>
    where
        B: AppointmentBackend + ?Sized,
    {
        let request = self.begin_submit()?;
        let result = request.dispatch(backend).await;
        self.finish_submit(result)
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use super::{AppointmentModal, ModalMode, ModalProps, TriggerTone};
    use crate::appointment::{Appointment, AppointmentStatus};
    use crate::backend::{AppointmentBackend, BackendError};
    use crate::form::{FormField, SubmitError};
    use crate::payload::{AppointmentUpdate, CreateAppointmentParams, UpdateAppointmentParams};

    struct CancelOnly {
        appointment: Appointment,
        fail: bool,
    }

    impl AppointmentBackend for CancelOnly {
        async fn create_appointment(
            &self,
            _params: CreateAppointmentParams,
        ) -> Result<Option<Appointment>, BackendError> {
            Err(BackendError::new("create is not expected here"))
        }

        async fn update_appointment(
            &self,
            params: UpdateAppointmentParams,
        ) -> Result<Option<Appointment>, BackendError> {
            if self.fail {
                return Err(BackendError::new("service unavailable"));
            }
            let mut appointment = self.appointment.clone();
            appointment.status = params.update.status();
            if let AppointmentUpdate::Cancel {
                cancellation_reason,
            } = params.update
            {
                appointment.cancellation_reason = Some(cancellation_reason);
            }
            Ok(Some(appointment))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 14, 10, 0, 0)
            .single()
            .expect("valid now")
    }

    fn booked() -> Appointment {
        Appointment {
            id: Uuid::from_u128(99),
            user_id: "user-9".to_string(),
            patient_id: "patient-9".to_string(),
            primary_physician: "David Livingston".to_string(),
            schedule: now(),
            reason: "follow-up".to_string(),
            note: None,
            status: AppointmentStatus::Scheduled,
            cancellation_reason: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn cancel_modal() -> AppointmentModal {
        AppointmentModal::new(
            ModalProps::for_mode("user-9", "patient-9", ModalMode::Cancel, Some(booked())),
            now(),
        )
    }

    #[test]
    fn trigger_and_text_follow_mode() {
        let modal = cancel_modal();
        assert_eq!(modal.trigger().label, "cancel");
        assert_eq!(modal.trigger().tone, TriggerTone::Destructive);
        assert_eq!(modal.title(), "Cancel Appointment");
        assert_eq!(
            modal.description(),
            "Please fill in the following details to cancel appointment"
        );
        assert_eq!(
            ModalMode::Schedule.trigger_tone(),
            TriggerTone::Positive
        );
        assert!(!modal.is_open());
    }

    #[tokio::test]
    async fn successful_cancel_closes_the_dialog() {
        let backend = CancelOnly {
            appointment: booked(),
            fail: false,
        };
        let mut modal = cancel_modal();
        modal.open();
        modal
            .form_mut()
            .set_text(FormField::CancellationReason, "recovered");

        let outcome = modal.submit(&backend).await.expect("cancel succeeds");

        assert!(!modal.is_open());
        assert_eq!(outcome.appointment().status, AppointmentStatus::Cancelled);
        assert_eq!(
            outcome.appointment().cancellation_reason.as_deref(),
            Some("recovered")
        );
    }

    #[tokio::test]
    async fn failed_cancel_stays_open_and_populated() {
        let backend = CancelOnly {
            appointment: booked(),
            fail: true,
        };
        let mut modal = cancel_modal();
        modal.open();
        modal
            .form_mut()
            .set_text(FormField::CancellationReason, "recovered");

        let err = modal.submit(&backend).await.expect_err("backend fails");

        assert!(matches!(err, SubmitError::Backend(_)));
        assert!(modal.is_open());
        assert!(!modal.form().is_loading());
        assert_eq!(
            modal.form().text_value(FormField::CancellationReason),
            "recovered"
        );
    }

    #[test]
    fn dismissing_discards_edits() {
        let mut modal = cancel_modal();
        modal.open();
        modal
            .form_mut()
            .set_text(FormField::CancellationReason, "typo");
        modal.set_open(false);
        assert_eq!(
            modal.form().text_value(FormField::CancellationReason),
            ""
        );
    }
}
