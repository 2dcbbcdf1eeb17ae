use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::schema::{AppointmentChange, ValidationErrors, validate};
use super::{AppointmentForm, FormMode};
use crate::appointment::{Appointment, DEFAULT_REASON};
use crate::backend::{AppointmentBackend, BackendError};
use crate::payload::{AppointmentUpdate, CreateAppointmentParams, UpdateAppointmentParams};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("please fix the highlighted fields: {0}")]
    Invalid(ValidationErrors),
    #[error("there is no existing appointment to {0}")]
    MissingAppointment(FormMode),
    #[error("a patient is required to create an appointment")]
    MissingPatient,
    #[error("could not save the appointment: {0}")]
    Backend(BackendError),
    #[error("the appointment was not saved; please try again")]
    Rejected,
}

impl SubmitError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// Backend call prepared by [`AppointmentForm::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create(CreateAppointmentParams),
    Update(UpdateAppointmentParams),
}

impl SubmitRequest {
    pub async fn dispatch<B>(self, backend: &B) -> Result<Option<Appointment>, BackendError>
    where
        B: AppointmentBackend + ?Sized,
    {
        match self {
            Self::Create(params) => backend.create_appointment(params).await,
            Self::Update(params) => backend.update_appointment(params).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// New appointment; the host navigates to `redirect`.
    Created {
        appointment: Appointment,
        redirect: String,
    },
    /// Existing appointment changed; the host closes its dialog.
    Updated { appointment: Appointment },
}

impl SubmitOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            Self::Created { appointment, .. } | Self::Updated { appointment } => appointment,
        }
    }
}

pub fn success_route(user_id: &str, appointment_id: Uuid) -> String {
    format!("/patients/{user_id}/new-appointment/success?appointmentId={appointment_id}")
}

impl AppointmentForm {
    /// Validates the draft, raises the loading flag and builds the backend
    /// call. On error the loading flag stays down and the error is kept for
    /// display.
    #[tracing::instrument(skip(self), fields(mode = %self.mode))]
    pub fn begin_submit(&mut self) -> Result<SubmitRequest, SubmitError> {
        let change = match validate(self.mode, &self.draft) {
            Ok(change) => change,
            Err(errors) => {
                debug!(invalid_fields = errors.len(), "form failed validation");
                let err = SubmitError::Invalid(errors);
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.loading = true;
        self.error = None;

        match self.build_request(change) {
            Ok(request) => {
                debug!("submit request prepared");
                Ok(request)
            }
            Err(err) => {
                warn!(error = %err, "could not build submit request");
                self.loading = false;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Applies the backend result. Success resets the form; failure keeps
    /// the draft for a retry. The loading flag always drops.
    #[tracing::instrument(skip(self, result), fields(mode = %self.mode))]
    pub fn finish_submit(
        &mut self,
        result: Result<Option<Appointment>, BackendError>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let outcome = match result {
            Ok(Some(appointment)) => {
                self.reset();
                info!(appointment_id = %appointment.id, status = %appointment.status, "appointment saved");
                Ok(match self.mode {
                    FormMode::Create => SubmitOutcome::Created {
                        redirect: success_route(&self.user_id, appointment.id),
                        appointment,
                    },
                    FormMode::Schedule | FormMode::Cancel => SubmitOutcome::Updated { appointment },
                })
            }
            Ok(None) => {
                warn!("backend returned no appointment");
                Err(SubmitError::Rejected)
            }
            Err(err) => {
                error!(error = %err, "appointment submit failed");
                Err(SubmitError::Backend(err))
            }
        };

        if let Err(err) = outcome.as_ref() {
            self.error = Some(err.clone());
        }
        self.loading = false;
        outcome
    }

    pub async fn submit<B>(&mut self, backend: &B) -> Result<SubmitOutcome, SubmitError>
    where
        B: AppointmentBackend + ?Sized,
    {
        let request = self.begin_submit()?;
        let result = request.dispatch(backend).await;
        self.finish_submit(result)
    }

    fn build_request(&self, change: AppointmentChange) -> Result<SubmitRequest, SubmitError> {
        let status = self.mode.target_status();
        let update = match change {
            AppointmentChange::Create {
                primary_physician,
                schedule,
                reason,
                note,
            } => {
                if self.patient_id.trim().is_empty() {
                    return Err(SubmitError::MissingPatient);
                }
                return Ok(SubmitRequest::Create(CreateAppointmentParams {
                    user_id: self.user_id.clone(),
                    patient_id: self.patient_id.clone(),
                    primary_physician,
                    schedule,
                    reason: reason.unwrap_or_else(|| DEFAULT_REASON.to_string()),
                    status,
                    note,
                }));
            }
            AppointmentChange::Schedule {
                primary_physician,
                schedule,
            } => AppointmentUpdate::Schedule {
                primary_physician,
                schedule,
            },
            AppointmentChange::Cancel {
                cancellation_reason,
            } => AppointmentUpdate::Cancel {
                cancellation_reason,
            },
        };

        let appointment = self
            .appointment
            .as_ref()
            .ok_or(SubmitError::MissingAppointment(self.mode))?;

        Ok(SubmitRequest::Update(UpdateAppointmentParams {
            user_id: self.user_id.clone(),
            appointment_id: appointment.id,
            update,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{SubmitError, SubmitOutcome, SubmitRequest};
    use crate::appointment::{Appointment, AppointmentStatus, DEFAULT_REASON};
    use crate::backend::{AppointmentBackend, BackendError};
    use crate::form::{AppointmentForm, FormField, FormMode};
    use crate::payload::{AppointmentUpdate, CreateAppointmentParams, UpdateAppointmentParams};

    #[derive(Default)]
    struct RecordingBackend {
        fail_with: Option<String>,
        return_nothing: bool,
        creates: RefCell<Vec<CreateAppointmentParams>>,
        updates: RefCell<Vec<UpdateAppointmentParams>>,
        existing: Option<Appointment>,
    }

    impl AppointmentBackend for RecordingBackend {
        async fn create_appointment(
            &self,
            params: CreateAppointmentParams,
        ) -> Result<Option<Appointment>, BackendError> {
            self.creates.borrow_mut().push(params.clone());
            if let Some(message) = self.fail_with.as_ref() {
                return Err(BackendError::new(message));
            }
            if self.return_nothing {
                return Ok(None);
            }
            Ok(Some(Appointment {
                id: Uuid::from_u128(7),
                user_id: params.user_id,
                patient_id: params.patient_id,
                primary_physician: params.primary_physician,
                schedule: params.schedule,
                reason: params.reason,
                note: params.note,
                status: params.status,
                cancellation_reason: None,
                created_at: now(),
                updated_at: now(),
            }))
        }

        async fn update_appointment(
            &self,
            params: UpdateAppointmentParams,
        ) -> Result<Option<Appointment>, BackendError> {
            self.updates.borrow_mut().push(params.clone());
            if let Some(message) = self.fail_with.as_ref() {
                return Err(BackendError::new(message));
            }
            let Some(mut appointment) = self.existing.clone() else {
                return Ok(None);
            };
            appointment.status = params.update.status();
            match params.update {
                AppointmentUpdate::Schedule {
                    primary_physician,
                    schedule,
                } => {
                    appointment.primary_physician = primary_physician;
                    appointment.schedule = schedule;
                }
                AppointmentUpdate::Cancel {
                    cancellation_reason,
                } => appointment.cancellation_reason = Some(cancellation_reason),
            }
            Ok(Some(appointment))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0)
            .single()
            .expect("valid now")
    }

    fn existing() -> Appointment {
        Appointment {
            id: Uuid::from_u128(42),
            user_id: "user-1".to_string(),
            patient_id: "patient-1".to_string(),
            primary_physician: "Leila Cameron".to_string(),
            schedule: now() + Duration::days(3),
            reason: "annual check-up".to_string(),
            note: Some("fasting".to_string()),
            status: AppointmentStatus::Pending,
            cancellation_reason: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn create_defaults_reason_and_redirects() {
        let backend = RecordingBackend::default();
        let mut form = AppointmentForm::new("user-1", "patient-1", FormMode::Create, None, now());
        form.set_text(FormField::PrimaryPhysician, "John Green");

        let outcome = form.submit(&backend).await.expect("create succeeds");

        let creates = backend.creates.borrow();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].status, AppointmentStatus::Pending);
        assert_eq!(creates[0].reason, DEFAULT_REASON);
        assert_eq!(creates[0].schedule, now());
        match outcome {
            SubmitOutcome::Created { redirect, .. } => assert_eq!(
                redirect,
                format!(
                    "/patients/user-1/new-appointment/success?appointmentId={}",
                    Uuid::from_u128(7)
                )
            ),
            other => panic!("expected create outcome, got {other:?}"),
        }
        assert!(!form.is_loading());
        assert_eq!(form.text_value(FormField::PrimaryPhysician), "");
    }

    #[tokio::test]
    async fn schedule_keeps_identifier_and_sets_status() {
        let backend = RecordingBackend {
            existing: Some(existing()),
            ..RecordingBackend::default()
        };
        let mut form = AppointmentForm::new(
            "user-1",
            "patient-1",
            FormMode::Schedule,
            Some(existing()),
            now(),
        );
        let moved = now() + Duration::days(5);
        form.set_schedule(Some(moved));

        let outcome = form.submit(&backend).await.expect("schedule succeeds");

        let updates = backend.updates.borrow();
        assert_eq!(updates[0].appointment_id, existing().id);
        assert_eq!(
            updates[0].update,
            AppointmentUpdate::Schedule {
                primary_physician: "Leila Cameron".to_string(),
                schedule: moved,
            }
        );
        let saved = outcome.appointment();
        assert_eq!(saved.id, existing().id);
        assert_eq!(saved.status, AppointmentStatus::Scheduled);
        assert!(matches!(outcome, SubmitOutcome::Updated { .. }));
    }

    #[tokio::test]
    async fn cancel_sends_only_the_reason() {
        let backend = RecordingBackend {
            existing: Some(existing()),
            ..RecordingBackend::default()
        };
        let mut form =
            AppointmentForm::new("user-1", "patient-1", FormMode::Cancel, Some(existing()), now());
        form.set_text(FormField::CancellationReason, "doctor unavailable");

        let outcome = form.submit(&backend).await.expect("cancel succeeds");

        assert_eq!(
            backend.updates.borrow()[0].update,
            AppointmentUpdate::Cancel {
                cancellation_reason: "doctor unavailable".to_string(),
            }
        );
        assert_eq!(outcome.appointment().status, AppointmentStatus::Cancelled);
        assert_eq!(
            outcome.appointment().cancellation_reason.as_deref(),
            Some("doctor unavailable")
        );
    }

    #[tokio::test]
    async fn backend_failure_keeps_draft_and_clears_loading() {
        let backend = RecordingBackend {
            fail_with: Some("connection refused".to_string()),
            ..RecordingBackend::default()
        };
        let mut form = AppointmentForm::new("user-1", "patient-1", FormMode::Create, None, now());
        form.set_text(FormField::PrimaryPhysician, "Jasmine Lee");
        form.set_text(FormField::Reason, "rash");

        let err = form.submit(&backend).await.expect_err("backend fails");

        assert_eq!(
            err,
            SubmitError::Backend(BackendError::new("connection refused"))
        );
        assert!(!form.is_loading());
        assert_eq!(form.text_value(FormField::PrimaryPhysician), "Jasmine Lee");
        assert_eq!(form.text_value(FormField::Reason), "rash");
        assert_eq!(
            form.form_error().as_deref(),
            Some("could not save the appointment: connection refused")
        );
    }

    #[tokio::test]
    async fn empty_backend_result_is_a_rejection() {
        let backend = RecordingBackend {
            return_nothing: true,
            ..RecordingBackend::default()
        };
        let mut form = AppointmentForm::new("user-1", "patient-1", FormMode::Create, None, now());
        form.set_text(FormField::PrimaryPhysician, "Jasmine Lee");

        let err = form.submit(&backend).await.expect_err("rejected");
        assert_eq!(err, SubmitError::Rejected);
        assert_eq!(form.text_value(FormField::PrimaryPhysician), "Jasmine Lee");
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_backend() {
        let backend = RecordingBackend::default();
        let mut form = AppointmentForm::new("user-1", "patient-1", FormMode::Create, None, now());

        let err = form.submit(&backend).await.expect_err("invalid");

        assert!(err.is_validation());
        assert!(backend.creates.borrow().is_empty());
        assert!(!form.is_loading());
        assert_eq!(
            form.field_error(FormField::PrimaryPhysician),
            Some("Select at least one doctor")
        );
        assert_eq!(form.form_error(), None);

        form.set_text(FormField::PrimaryPhysician, "Alex Ramirez");
        assert!(form.error().is_none());
    }

    #[test]
    fn loading_flag_spans_the_backend_call() {
        let mut form =
            AppointmentForm::new("user-1", "patient-1", FormMode::Cancel, Some(existing()), now());
        form.set_text(FormField::CancellationReason, "conflict");

        let request = form.begin_submit().expect("valid cancel");
        assert!(form.is_loading());
        assert_eq!(form.submit_button().text(), "Loading...");
        assert!(matches!(request, SubmitRequest::Update(_)));

        let err = form
            .finish_submit(Err(BackendError::new("timeout")))
            .expect_err("failed");
        assert!(!err.is_validation());
        assert!(!form.is_loading());
        assert_eq!(form.text_value(FormField::CancellationReason), "conflict");
    }

    #[test]
    fn update_without_appointment_is_reported() {
        let mut form = AppointmentForm::new("user-1", "patient-1", FormMode::Cancel, None, now());
        form.set_text(FormField::CancellationReason, "no longer needed");

        let err = form.begin_submit().expect_err("missing appointment");
        assert_eq!(err, SubmitError::MissingAppointment(FormMode::Cancel));
        assert!(!form.is_loading());
    }

    #[test]
    fn create_without_patient_is_reported() {
        let mut form = AppointmentForm::new("user-1", " ", FormMode::Create, None, now());
        form.set_text(FormField::PrimaryPhysician, "Hardik Sharma");

        let err = form.begin_submit().expect_err("missing patient");
        assert_eq!(err, SubmitError::MissingPatient);
    }

    #[tokio::test]
    async fn reset_after_success_restores_defaults() {
        let backend = RecordingBackend {
            existing: Some(existing()),
            ..RecordingBackend::default()
        };
        let mut form = AppointmentForm::new(
            "user-1",
            "patient-1",
            FormMode::Schedule,
            Some(existing()),
            now(),
        );
        form.set_text(FormField::PrimaryPhysician, "Alyana Cruz");
        form.submit(&backend).await.expect("schedule succeeds");

        assert_eq!(form.draft(), form.defaults());
        assert_eq!(form.text_value(FormField::PrimaryPhysician), "Leila Cameron");
        form.reset();
        assert_eq!(form.draft(), form.defaults());
    }
}
