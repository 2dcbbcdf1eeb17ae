use carebook_shared::{
  Appointment,
  AppointmentIdArg,
  AppointmentsListArgs,
  CreateAppointmentParams,
  PHYSICIANS,
  Physician,
  SessionDto,
  UiLogArg,
  UpdateAppointmentParams
};
use tauri::State;
use tracing::{
  error,
  info,
  instrument
};

use crate::state::AppState;

fn err_to_string(
  err: anyhow::Error
) -> String {
  format!("{err:#}")
}

#[tauri::command]
#[instrument(skip(state), fields(request_id = ?request_id, patient_id = ?args.patient_id, status = ?args.status))]
pub async fn appointments_list(
  state: State<'_, AppState>,
  args: AppointmentsListArgs,
  request_id: Option<String>
) -> Result<Vec<Appointment>, String> {
  info!(request_id = ?request_id, "appointments_list command invoked");
  let result = state.list(args);
  if let Err(err) = result.as_ref() {
    error!(request_id = ?request_id, error = %err, "appointments_list command failed");
  }
  result.map_err(err_to_string)
}

#[tauri::command]
#[instrument(skip(state), fields(request_id = ?request_id, id = %args.id))]
pub async fn appointment_get(
  state: State<'_, AppState>,
  args: AppointmentIdArg,
  request_id: Option<String>
) -> Result<Appointment, String> {
  info!(request_id = ?request_id, id = %args.id, "appointment_get command invoked");
  let result = state.get(args.id);
  if let Err(err) = result.as_ref() {
    error!(request_id = ?request_id, error = %err, "appointment_get command failed");
  }
  result.map_err(err_to_string)
}

#[tauri::command]
#[instrument(skip(state, args), fields(request_id = ?request_id, patient_id = %args.patient_id))]
pub async fn appointment_create(
  state: State<'_, AppState>,
  args: CreateAppointmentParams,
  request_id: Option<String>
) -> Result<Appointment, String> {
  info!(
    request_id = ?request_id,
    physician = %args.primary_physician,
    schedule = %args.schedule,
    has_note = args.note.is_some(),
    "appointment_create command invoked"
  );
  let result = state.create(args);
  if let Err(err) = result.as_ref() {
    error!(request_id = ?request_id, error = %err, "appointment_create command failed");
  }
  result.map_err(err_to_string)
}

#[tauri::command]
#[instrument(skip(state, args), fields(request_id = ?request_id, appointment_id = %args.appointment_id))]
pub async fn appointment_update(
  state: State<'_, AppState>,
  args: UpdateAppointmentParams,
  request_id: Option<String>
) -> Result<Appointment, String> {
  info!(
    request_id = ?request_id,
    kind = args.update.kind(),
    "appointment_update command invoked"
  );
  let result = state.update(args);
  if let Err(err) = result.as_ref() {
    error!(request_id = ?request_id, error = %err, "appointment_update command failed");
  }
  result.map_err(err_to_string)
}

#[tauri::command]
pub async fn physicians_list()
-> Result<Vec<Physician>, String> {
  Ok(PHYSICIANS.to_vec())
}

#[tauri::command]
pub async fn session_get(
  state: State<'_, AppState>
) -> Result<SessionDto, String> {
  Ok(state.session())
}

#[tauri::command]
#[instrument(fields(request_id = ?request_id, event = %args.event))]
pub async fn ui_log(
  args: UiLogArg,
  request_id: Option<String>
) -> Result<(), String> {
  info!(request_id = ?request_id, event = %args.event, detail = %args.detail, "ui interaction");
  Ok(())
}
