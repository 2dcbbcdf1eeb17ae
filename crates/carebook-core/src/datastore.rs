use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use carebook_shared::{
    Appointment, AppointmentBackend, AppointmentUpdate, AppointmentsListArgs, BackendError,
    CreateAppointmentParams, UpdateAppointmentParams,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::datetime::format_schedule;

/// Message queued for the patient after an appointment changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub appointment_id: Uuid,
    pub patient_id: String,
    pub kind: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub appointments_path: PathBuf,
    pub notifications_path: PathBuf,
    notify: bool,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let appointments_path = data_dir.join("appointments.data");
        let notifications_path = data_dir.join("notifications.data");

        for path in [&appointments_path, &notifications_path] {
            if !path.exists() {
                fs::write(path, "")
                    .with_context(|| format!("failed to create {}", path.display()))?;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            appointments = %appointments_path.display(),
            notifications = %notifications_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            appointments_path,
            notifications_path,
            notify: true,
        })
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify = enabled;
        self
    }

    #[tracing::instrument(skip(self))]
    pub fn load_appointments(&self) -> anyhow::Result<Vec<Appointment>> {
        load_jsonl(&self.appointments_path).context("failed to load appointments.data")
    }

    #[tracing::instrument(skip(self, appointments))]
    pub fn save_appointments(&self, appointments: &[Appointment]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.appointments_path, appointments)
            .context("failed to save appointments.data")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_notifications(&self) -> anyhow::Result<Vec<Notification>> {
        load_jsonl(&self.notifications_path).context("failed to load notifications.data")
    }

    pub fn get(&self, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        Ok(self
            .load_appointments()?
            .into_iter()
            .find(|appointment| appointment.id == id))
    }

    /// Resolves a full id or an unambiguous leading fragment of one.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, id_or_prefix: &str) -> anyhow::Result<Appointment> {
        let needle = id_or_prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(anyhow!("appointment id cannot be empty"));
        }

        let mut matches = self
            .load_appointments()?
            .into_iter()
            .filter(|appointment| appointment.id.to_string().starts_with(&needle));
        let found = matches
            .next()
            .ok_or_else(|| anyhow!("appointment not found: {id_or_prefix}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("appointment id is ambiguous: {id_or_prefix}"));
        }
        Ok(found)
    }

    #[tracing::instrument(skip(self))]
    pub fn list(&self, args: &AppointmentsListArgs) -> anyhow::Result<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .load_appointments()?
            .into_iter()
            .filter(|appointment| {
                if let Some(patient_id) = args.patient_id.as_ref()
                    && appointment.patient_id != *patient_id
                {
                    return false;
                }
                if let Some(status) = args.status
                    && appointment.status != status
                {
                    return false;
                }
                true
            })
            .collect();
        appointments.sort_by_key(|appointment| (appointment.schedule, appointment.id));
        debug!(count = appointments.len(), "listed appointments");
        Ok(appointments)
    }

    #[tracing::instrument(skip(self, params, now), fields(patient_id = %params.patient_id))]
    pub fn create(
        &self,
        params: CreateAppointmentParams,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Appointment> {
        if params.patient_id.trim().is_empty() {
            return Err(anyhow!("patient id cannot be empty"));
        }
        if params.primary_physician.trim().is_empty() {
            return Err(anyhow!("primary physician cannot be empty"));
        }

        let mut appointments = self.load_appointments()?;
        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            patient_id: params.patient_id,
            primary_physician: params.primary_physician,
            schedule: params.schedule,
            reason: params.reason,
            note: params.note,
            status: params.status,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        appointments.push(appointment.clone());
        self.save_appointments(&appointments)?;

        info!(appointment_id = %appointment.id, status = %appointment.status, "appointment created");
        Ok(appointment)
    }

    #[tracing::instrument(
        skip(self, params, now),
        fields(appointment_id = %params.appointment_id, kind = params.update.kind())
    )]
    pub fn update(
        &self,
        params: UpdateAppointmentParams,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Appointment> {
        let mut appointments = self.load_appointments()?;
        let appointment = appointments
            .iter_mut()
            .find(|appointment| appointment.id == params.appointment_id)
            .ok_or_else(|| anyhow!("appointment not found: {}", params.appointment_id))?;

        if appointment.user_id != params.user_id {
            warn!(
                owner = %appointment.user_id,
                requested_by = %params.user_id,
                "update user does not own appointment"
            );
            return Err(anyhow!(
                "appointment {} does not belong to user {}",
                appointment.id,
                params.user_id
            ));
        }

        let next_status = params.update.status();
        if !appointment.status.can_transition_to(next_status) {
            return Err(anyhow!(
                "cannot move appointment from {} to {}",
                appointment.status,
                next_status
            ));
        }

        let kind = params.update.kind();
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
            } => {
                appointment.cancellation_reason = Some(cancellation_reason);
            }
        }
        appointment.status = next_status;
        appointment.updated_at = now;
        let updated = appointment.clone();

        self.save_appointments(&appointments)?;
        info!(status = %updated.status, "appointment updated");

        // Outbox is best-effort once the update is saved.
        if self.notify
            && let Err(err) = self.push_notification(notification_for(&updated, kind, now))
        {
            error!(error = %format!("{err:#}"), "failed to queue patient notification");
        }

        Ok(updated)
    }

    #[tracing::instrument(skip(self, notification), fields(appointment_id = %notification.appointment_id))]
    fn push_notification(&self, notification: Notification) -> anyhow::Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.notifications_path)
            .with_context(|| format!("failed to open {}", self.notifications_path.display()))?;
        let serialized = serde_json::to_string(&notification)?;
        writeln!(file, "{serialized}")?;
        debug!(kind = %notification.kind, "queued patient notification");
        Ok(())
    }
}

impl AppointmentBackend for DataStore {
    async fn create_appointment(
        &self,
        params: CreateAppointmentParams,
    ) -> Result<Option<Appointment>, BackendError> {
        self.create(params, Utc::now())
            .map(Some)
            .map_err(|err| BackendError::new(format!("{err:#}")))
    }

    async fn update_appointment(
        &self,
        params: UpdateAppointmentParams,
    ) -> Result<Option<Appointment>, BackendError> {
        self.update(params, Utc::now())
            .map(Some)
            .map_err(|err| BackendError::new(format!("{err:#}")))
    }
}

fn notification_for(appointment: &Appointment, kind: &str, now: DateTime<Utc>) -> Notification {
    let when = format_schedule(appointment.schedule);
    let message = match appointment.cancellation_reason.as_deref() {
        Some(reason) if appointment.is_cancelled() => format!(
            "We regret to inform that your appointment for {when} is cancelled. Reason: {reason}"
        ),
        _ => format!(
            "Your appointment is confirmed for {when} with Dr. {}",
            appointment.primary_physician
        ),
    };

    Notification {
        appointment_id: appointment.id,
        patient_id: appointment.patient_id.clone(),
        kind: kind.to_string(),
        message,
        created_at: now,
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use carebook_shared::{
        AppointmentStatus, AppointmentUpdate, AppointmentsListArgs, CreateAppointmentParams,
        UpdateAppointmentParams,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::DataStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0)
            .single()
            .expect("valid now")
    }

    fn create_params(patient: &str, offset_days: i64) -> CreateAppointmentParams {
        CreateAppointmentParams {
            user_id: "user-1".to_string(),
            patient_id: patient.to_string(),
            primary_physician: "John Green".to_string(),
            schedule: now() + Duration::days(offset_days),
            reason: "checkup".to_string(),
            status: AppointmentStatus::Pending,
            note: None,
        }
    }

    fn cancel(appointment_id: uuid::Uuid, reason: &str) -> UpdateAppointmentParams {
        UpdateAppointmentParams {
            user_id: "user-1".to_string(),
            appointment_id,
            update: AppointmentUpdate::Cancel {
                cancellation_reason: reason.to_string(),
            },
        }
    }

    #[test]
    fn create_persists_and_lists_by_schedule() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open store");

        let later = store.create(create_params("p-1", 5), now()).expect("create");
        let sooner = store.create(create_params("p-1", 1), now()).expect("create");
        store.create(create_params("p-2", 2), now()).expect("create");

        let listed = store
            .list(&AppointmentsListArgs {
                patient_id: Some("p-1".to_string()),
                status: None,
            })
            .expect("list");
        let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);

        let reopened = DataStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.load_appointments().expect("load").len(), 3);
    }

    #[test]
    fn schedule_update_keeps_id_and_queues_notice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open store");
        let created = store.create(create_params("p-1", 1), now()).expect("create");
        let moved = now() + Duration::days(3);

        let updated = store
            .update(
                UpdateAppointmentParams {
                    user_id: "user-1".to_string(),
                    appointment_id: created.id,
                    update: AppointmentUpdate::Schedule {
                        primary_physician: "Jane Powell".to_string(),
                        schedule: moved,
                    },
                },
                now(),
            )
            .expect("schedule");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status, AppointmentStatus::Scheduled);
        assert_eq!(updated.schedule, moved);
        assert_eq!(updated.reason, "checkup");

        let notices = store.load_notifications().expect("notifications");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, "schedule");
        assert!(notices[0].message.contains("with Dr. Jane Powell"));
    }

    #[test]
    fn cancelled_is_terminal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path())
            .expect("open store")
            .with_notifications(false);
        let created = store.create(create_params("p-1", 1), now()).expect("create");

        let cancelled = store
            .update(cancel(created.id, "travel"), now())
            .expect("cancel");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("travel"));

        let err = store
            .update(cancel(created.id, "again"), now())
            .expect_err("already cancelled");
        assert!(err.to_string().contains("cannot move appointment"));
        assert!(store.load_notifications().expect("notifications").is_empty());
    }

    #[test]
    fn update_survives_unwritable_outbox() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open store");
        let created = store.create(create_params("p-1", 1), now()).expect("create");

        std::fs::remove_file(&store.notifications_path).expect("remove outbox");
        std::fs::create_dir(&store.notifications_path).expect("outbox as dir");

        let cancelled = store
            .update(cancel(created.id, "travel"), now())
            .expect("cancel despite outbox");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

        let stored = store.get(created.id).expect("get").expect("present");
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.cancellation_reason.as_deref(), Some("travel"));
    }

    #[test]
    fn update_rejects_foreign_user() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open store");
        let created = store.create(create_params("p-1", 1), now()).expect("create");

        let mut params = cancel(created.id, "travel");
        params.user_id = "someone-else".to_string();
        assert!(store.update(params, now()).is_err());
        let unchanged = store.get(created.id).expect("get").expect("present");
        assert_eq!(unchanged.status, AppointmentStatus::Pending);
    }

    #[test]
    fn resolves_unique_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path()).expect("open store");
        let created = store.create(create_params("p-1", 1), now()).expect("create");

        let prefix = &created.id.to_string()[..8];
        assert_eq!(store.resolve(prefix).expect("resolve").id, created.id);
        assert!(store.resolve("zzzz").is_err());
    }
}
