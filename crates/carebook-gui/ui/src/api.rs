use carebook_shared::{
    Appointment, AppointmentBackend, BackendError, CreateAppointmentParams, UiLogArg,
    UpdateAppointmentParams,
};
use serde::{Serialize, de::DeserializeOwned};
use tauri_wasm::{args, invoke};

/// Tauri commands take their payload under a single `args` key.
#[derive(Serialize)]
struct Envelope<'a, A: ?Sized> {
    args: &'a A,
}

pub async fn invoke_tauri<R, A>(cmd: &str, args_payload: &A) -> Result<R, String>
where
    R: DeserializeOwned,
    A: Serialize + ?Sized,
{
    let envelope = Envelope { args: args_payload };
    let payload = args(&envelope)
        .map_err(|e| format!("failed to encode args: {e}"))?;
    let value = invoke(cmd)
        .with_args(payload)
        .await
        .map_err(|e| format!("invoke error: {e:?}"))?;

    serde_wasm_bindgen::from_value(value).map_err(|e| format!("decode error: {e}"))
}

pub async fn invoke_tauri_no_args<R>(cmd: &str) -> Result<R, String>
where
    R: DeserializeOwned,
{
    let value = invoke(cmd)
        .await
        .map_err(|e| format!("invoke error: {e:?}"))?;

    serde_wasm_bindgen::from_value(value).map_err(|e| format!("decode error: {e}"))
}

/// Fire-and-forget breadcrumb into the backend log.
pub fn log_ui(event: &str, detail: impl Into<String>) {
    let arg = UiLogArg {
        event: event.to_string(),
        detail: detail.into(),
    };
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = invoke_tauri::<(), _>("ui_log", &arg).await {
            tracing::warn!(error = %err, "ui_log failed");
        }
    });
}

/// Backend actions served by the desktop shell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TauriBackend;

impl AppointmentBackend for TauriBackend {
    async fn create_appointment(
        &self,
        params: CreateAppointmentParams,
    ) -> Result<Option<Appointment>, BackendError> {
        invoke_tauri::<Option<Appointment>, _>("appointment_create", &params)
            .await
            .map_err(BackendError::new)
    }

    async fn update_appointment(
        &self,
        params: UpdateAppointmentParams,
    ) -> Result<Option<Appointment>, BackendError> {
        invoke_tauri::<Option<Appointment>, _>("appointment_update", &params)
            .await
            .map_err(BackendError::new)
    }
}
