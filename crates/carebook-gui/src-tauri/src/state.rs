use std::path::PathBuf;

use anyhow::{Context, anyhow};
use carebook_core::config::{self, Config, KEY_SESSION_PATIENT, KEY_SESSION_USER};
use carebook_core::datastore::DataStore;
use carebook_shared::{
    Appointment, AppointmentsListArgs, CreateAppointmentParams, SessionDto,
    UpdateAppointmentParams,
};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const GUI_DATA_ENV_VAR: &str = "CAREBOOK_GUI_DATA";
const FALLBACK_SESSION_ID: &str = "local";

pub struct AppState {
    store: Mutex<DataStore>,
    session: SessionDto,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        let cfg = Config::load(None).context("failed to load carebookrc")?;
        let override_dir = std::env::var_os(GUI_DATA_ENV_VAR).map(PathBuf::from);
        let data_dir = config::resolve_data_dir(&cfg, override_dir.as_deref())?;
        let store = DataStore::open(&data_dir)
            .with_context(|| format!("failed to open GUI datastore at {}", data_dir.display()))?
            .with_notifications(cfg.notify_enabled());

        let session = session_from_config(&cfg);
        info!(user_id = %session.user_id, patient_id = %session.patient_id, "resolved GUI session");

        Ok(Self::from_parts(store, session))
    }

    pub fn from_parts(store: DataStore, session: SessionDto) -> Self {
        Self {
            store: Mutex::new(store),
            session,
        }
    }

    pub fn session(&self) -> SessionDto {
        self.session.clone()
    }

    #[instrument(skip(self))]
    pub fn list(&self, args: AppointmentsListArgs) -> anyhow::Result<Vec<Appointment>> {
        let store = self.store.lock();
        store.list(&args)
    }

    #[instrument(skip(self))]
    pub fn get(&self, id: Uuid) -> anyhow::Result<Appointment> {
        let store = self.store.lock();
        store
            .get(id)?
            .ok_or_else(|| anyhow!("appointment not found: {id}"))
    }

    #[instrument(skip(self, params), fields(patient_id = %params.patient_id))]
    pub fn create(&self, params: CreateAppointmentParams) -> anyhow::Result<Appointment> {
        let store = self.store.lock();
        store.create(params, Utc::now())
    }

    #[instrument(skip(self, params), fields(appointment_id = %params.appointment_id))]
    pub fn update(&self, params: UpdateAppointmentParams) -> anyhow::Result<Appointment> {
        let store = self.store.lock();
        store.update(params, Utc::now())
    }
}

fn session_from_config(cfg: &Config) -> SessionDto {
    let user_id = cfg
        .get(KEY_SESSION_USER)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| FALLBACK_SESSION_ID.to_string());
    let patient_id = cfg
        .get(KEY_SESSION_PATIENT)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| user_id.clone());
    debug!(user_id = %user_id, patient_id = %patient_id, "session from config");

    SessionDto {
        user_id,
        patient_id,
    }
}
