//! Appointment form state machine.
//!
//! The form owns the editable field values, picks a validation schema and a
//! payload shape from its [`FormMode`], and tracks the loading flag and the
//! last error around a submit. It renders nothing itself: the Yew frontend and
//! the CLI both drive it.

mod schema;
mod submit;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appointment::{Appointment, AppointmentStatus};

pub use schema::{AppointmentChange, ValidationErrors, validate};
pub use submit::{SubmitError, SubmitOutcome, SubmitRequest, success_route};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Schedule,
    Cancel,
}

impl FormMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Schedule => "schedule",
            Self::Cancel => "cancel",
        }
    }

    /// Status written to the appointment when this mode submits.
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            Self::Create => AppointmentStatus::Pending,
            Self::Schedule => AppointmentStatus::Scheduled,
            Self::Cancel => AppointmentStatus::Cancelled,
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create Appointment",
            Self::Schedule => "Schedule Appointment",
            Self::Cancel => "Cancel Appointment",
        }
    }

    pub fn submit_variant(self) -> ButtonVariant {
        match self {
            Self::Cancel => ButtonVariant::Danger,
            Self::Create | Self::Schedule => ButtonVariant::Primary,
        }
    }

    /// Fields rendered in this mode, in display order.
    pub fn fields(self) -> &'static [FormField] {
        match self {
            Self::Cancel => &[FormField::CancellationReason],
            Self::Create | Self::Schedule => &[
                FormField::PrimaryPhysician,
                FormField::Schedule,
                FormField::Reason,
                FormField::Note,
            ],
        }
    }

    pub fn field_access(self, field: FormField) -> FieldAccess {
        if !self.fields().contains(&field) {
            return FieldAccess::Hidden;
        }
        match (self, field) {
            // the update payload has no room for these
            (Self::Schedule, FormField::Reason | FormField::Note) => FieldAccess::ReadOnly,
            _ => FieldAccess::Editable,
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "schedule" => Ok(Self::Schedule),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown form mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    PrimaryPhysician,
    Schedule,
    Reason,
    Note,
    CancellationReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Select,
    DatePicker,
    Textarea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Hidden,
    ReadOnly,
    Editable,
}

impl FormField {
    pub fn name(self) -> &'static str {
        match self {
            Self::PrimaryPhysician => "primaryPhysician",
            Self::Schedule => "schedule",
            Self::Reason => "reason",
            Self::Note => "note",
            Self::CancellationReason => "cancellationReason",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PrimaryPhysician => "Primary Physician",
            Self::Schedule => "Expected appointment date",
            Self::Reason => "Reason for appointment",
            Self::Note => "Notes",
            Self::CancellationReason => "Reason for cancellation",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::PrimaryPhysician => "Select a physician",
            Self::Schedule => "",
            Self::Reason => "Enter reason for appointment",
            Self::Note => "Notes..",
            Self::CancellationReason => "Enter reason for cancellation",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Self::PrimaryPhysician => FieldKind::Select,
            Self::Schedule => FieldKind::DatePicker,
            Self::Reason | Self::Note | Self::CancellationReason => FieldKind::Textarea,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonVariant {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    pub label: &'static str,
    pub variant: ButtonVariant,
    pub loading: bool,
}

impl SubmitButton {
    pub const LOADING_LABEL: &'static str = "Loading...";

    pub fn text(&self) -> &'static str {
        if self.loading {
            Self::LOADING_LABEL
        } else {
            self.label
        }
    }
}

/// Raw field values as the user edits them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub primary_physician: String,
    pub schedule: Option<DateTime<Utc>>,
    pub reason: String,
    pub note: String,
    pub cancellation_reason: String,
}

impl FormDraft {
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            schedule: Some(now),
            ..Self::default()
        }
    }

    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            primary_physician: appointment.primary_physician.clone(),
            schedule: Some(appointment.schedule),
            reason: appointment.reason.clone(),
            note: appointment.note.clone().unwrap_or_default(),
            cancellation_reason: appointment.cancellation_reason.clone().unwrap_or_default(),
        }
    }

    fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::PrimaryPhysician => Some(&self.primary_physician),
            FormField::Reason => Some(&self.reason),
            FormField::Note => Some(&self.note),
            FormField::CancellationReason => Some(&self.cancellation_reason),
            FormField::Schedule => None,
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::PrimaryPhysician => Some(&mut self.primary_physician),
            FormField::Reason => Some(&mut self.reason),
            FormField::Note => Some(&mut self.note),
            FormField::CancellationReason => Some(&mut self.cancellation_reason),
            FormField::Schedule => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentForm {
    user_id: String,
    patient_id: String,
    mode: FormMode,
    appointment: Option<Appointment>,
    defaults: FormDraft,
    draft: FormDraft,
    loading: bool,
    error: Option<SubmitError>,
}

impl AppointmentForm {
    /// Builds a form whose defaults come from `appointment` when given, or
    /// from blank fields scheduled at `now`.
    pub fn new(
        user_id: impl Into<String>,
        patient_id: impl Into<String>,
        mode: FormMode,
        appointment: Option<Appointment>,
        now: DateTime<Utc>,
    ) -> Self {
        let defaults = match appointment.as_ref() {
            Some(existing) => FormDraft::from_appointment(existing),
            None => FormDraft::blank(now),
        };

        Self {
            user_id: user_id.into(),
            patient_id: patient_id.into(),
            mode,
            appointment,
            draft: defaults.clone(),
            defaults,
            loading: false,
            error: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn appointment(&self) -> Option<&Appointment> {
        self.appointment.as_ref()
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn defaults(&self) -> &FormDraft {
        &self.defaults
    }

    pub fn fields(&self) -> &'static [FormField] {
        self.mode.fields()
    }

    pub fn field_access(&self, field: FormField) -> FieldAccess {
        self.mode.field_access(field)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn submit_button(&self) -> SubmitButton {
        SubmitButton {
            label: self.mode.submit_label(),
            variant: self.mode.submit_variant(),
            loading: self.loading,
        }
    }

    pub fn text_value(&self, field: FormField) -> &str {
        self.draft.text(field).unwrap_or_default()
    }

    pub fn schedule(&self) -> Option<DateTime<Utc>> {
        self.draft.schedule
    }

    /// Sets a text field. Returns `false` when the field is not editable in
    /// the current mode or is not a text field.
    pub fn set_text(&mut self, field: FormField, value: impl Into<String>) -> bool {
        if self.field_access(field) != FieldAccess::Editable {
            return false;
        }
        let Some(slot) = self.draft.text_mut(field) else {
            return false;
        };
        *slot = value.into();
        self.error = None;
        true
    }

    pub fn set_schedule(&mut self, schedule: Option<DateTime<Utc>>) -> bool {
        if self.field_access(FormField::Schedule) != FieldAccess::Editable {
            return false;
        }
        self.draft.schedule = schedule;
        self.error = None;
        true
    }

    pub fn error(&self) -> Option<&SubmitError> {
        self.error.as_ref()
    }

    pub fn field_error(&self, field: FormField) -> Option<&str> {
        match self.error.as_ref() {
            Some(SubmitError::Invalid(errors)) => errors.get(field),
            _ => None,
        }
    }

    /// Message for errors that do not belong to a single field.
    pub fn form_error(&self) -> Option<String> {
        match self.error.as_ref() {
            None | Some(SubmitError::Invalid(_)) => None,
            Some(other) => Some(other.to_string()),
        }
    }

    /// Returns every field to the defaults captured at construction.
    pub fn reset(&mut self) {
        self.draft = self.defaults.clone();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{AppointmentForm, ButtonVariant, FieldAccess, FormField, FormMode};
    use crate::appointment::AppointmentStatus;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn cancel_mode_renders_only_cancellation_reason() {
        assert_eq!(FormMode::Cancel.fields(), &[FormField::CancellationReason]);
        assert_eq!(
            FormMode::Cancel.field_access(FormField::PrimaryPhysician),
            FieldAccess::Hidden
        );
        assert_eq!(
            FormMode::Cancel.field_access(FormField::Schedule),
            FieldAccess::Hidden
        );
    }

    #[test]
    fn non_cancel_modes_render_booking_fields() {
        for mode in [FormMode::Create, FormMode::Schedule] {
            assert_eq!(
                mode.fields(),
                &[
                    FormField::PrimaryPhysician,
                    FormField::Schedule,
                    FormField::Reason,
                    FormField::Note,
                ]
            );
            assert_eq!(
                mode.field_access(FormField::CancellationReason),
                FieldAccess::Hidden
            );
        }
        assert_eq!(
            FormMode::Create.field_access(FormField::Reason),
            FieldAccess::Editable
        );
        assert_eq!(
            FormMode::Schedule.field_access(FormField::Reason),
            FieldAccess::ReadOnly
        );
    }

    #[test]
    fn mode_selects_status_and_button() {
        assert_eq!(FormMode::Create.target_status(), AppointmentStatus::Pending);
        assert_eq!(
            FormMode::Schedule.target_status(),
            AppointmentStatus::Scheduled
        );
        assert_eq!(
            FormMode::Cancel.target_status(),
            AppointmentStatus::Cancelled
        );

        let form = AppointmentForm::new("u", "p", FormMode::Cancel, None, now());
        let button = form.submit_button();
        assert_eq!(button.text(), "Cancel Appointment");
        assert_eq!(button.variant, ButtonVariant::Danger);
        assert_eq!(
            FormMode::Create.submit_variant(),
            ButtonVariant::Primary
        );
    }

    #[test]
    fn blank_form_defaults_schedule_to_now() {
        let form = AppointmentForm::new("u", "p", FormMode::Create, None, now());
        assert_eq!(form.schedule(), Some(now()));
        assert_eq!(form.text_value(FormField::PrimaryPhysician), "");
    }

    #[test]
    fn hidden_fields_reject_edits() {
        let mut form = AppointmentForm::new("u", "p", FormMode::Cancel, None, now());
        assert!(!form.set_text(FormField::PrimaryPhysician, "John Green"));
        assert!(!form.set_schedule(None));
        assert!(form.set_text(FormField::CancellationReason, "travel"));
        assert_eq!(form.text_value(FormField::CancellationReason), "travel");
    }

    #[test]
    fn reset_is_idempotent() {
        let mut form = AppointmentForm::new("u", "p", FormMode::Create, None, now());
        form.set_text(FormField::PrimaryPhysician, "Jane Powell");
        form.set_text(FormField::Note, "bring scans");
        form.reset();
        let once = form.clone();
        form.reset();
        assert_eq!(form, once);
        assert_eq!(form.draft(), form.defaults());
    }

    #[test]
    fn mode_round_trips_through_str() {
        for mode in [FormMode::Create, FormMode::Schedule, FormMode::Cancel] {
            assert_eq!(mode.as_str().parse::<FormMode>(), Ok(mode));
        }
    }
}
