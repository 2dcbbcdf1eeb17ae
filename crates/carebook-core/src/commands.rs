use anyhow::{Context, anyhow};
use carebook_shared::{
    AppointmentForm, AppointmentModal, AppointmentsListArgs, FormField, FormMode, ModalMode,
    ModalProps, PHYSICIANS, SubmitError, SubmitOutcome, find_physician,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::cli::{BookArgs, CancelArgs, Command, ListArgs, NotificationsArgs, ScheduleArgs};
use crate::config::{Config, KEY_SESSION_PATIENT, KEY_SESSION_USER};
use crate::datastore::DataStore;
use crate::datetime::{format_schedule, parse_schedule_expr};
use crate::render::Renderer;

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let command = command.unwrap_or(Command::List(ListArgs {
        patient: None,
        status: None,
    }));
    debug!(?command, "dispatching command");

    match command {
        Command::Book(args) => cmd_book(store, cfg, args, now),
        Command::Schedule(args) => cmd_schedule(store, args, now),
        Command::Cancel(args) => cmd_cancel(store, args, now),
        Command::List(args) => cmd_list(store, renderer, args),
        Command::Info(args) => {
            let appointment = store.resolve(&args.id)?;
            renderer.print_appointment_info(&appointment)
        }
        Command::Physicians => renderer.print_physicians(),
        Command::Notifications(args) => cmd_notifications(store, renderer, args),
        Command::Show => cmd_show(cfg),
    }
}

#[instrument(skip(store, cfg, args, now))]
fn cmd_book(
    store: &DataStore,
    cfg: &Config,
    args: BookArgs,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command book");

    let user_id = session_value(args.user, cfg, KEY_SESSION_USER, "--user")?;
    let patient_id = session_value(args.patient, cfg, KEY_SESSION_PATIENT, "--patient")?;
    let schedule = parse_schedule_expr(&args.at, now)?;

    let mut form = AppointmentForm::new(user_id, patient_id, FormMode::Create, None, now);
    let physician = canonical_physician(&args.physician)?;
    form.set_text(FormField::PrimaryPhysician, physician);
    form.set_schedule(Some(schedule));
    if let Some(reason) = args.reason {
        form.set_text(FormField::Reason, reason);
    }
    if let Some(note) = args.note {
        form.set_text(FormField::Note, note);
    }

    let outcome = block_on(form.submit(store))?.map_err(submit_error)?;
    let appointment = outcome.appointment();
    println!(
        "Requested appointment {} with Dr. {} for {}.",
        appointment.id,
        appointment.primary_physician,
        format_schedule(appointment.schedule)
    );
    if let SubmitOutcome::Created { redirect, .. } = &outcome {
        println!("Success page: {redirect}");
    }
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_schedule(store: &DataStore, args: ScheduleArgs, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command schedule");

    let appointment = store.resolve(&args.id)?;
    let user_id = args.user.unwrap_or_else(|| appointment.user_id.clone());
    let mut modal = AppointmentModal::new(
        ModalProps::for_mode(
            user_id,
            appointment.patient_id.clone(),
            ModalMode::Schedule,
            Some(appointment),
        ),
        now,
    );
    modal.open();

    if let Some(physician) = args.physician {
        let physician = canonical_physician(&physician)?;
        modal.form_mut().set_text(FormField::PrimaryPhysician, physician);
    }
    if let Some(at) = args.at {
        let schedule = parse_schedule_expr(&at, now)?;
        modal.form_mut().set_schedule(Some(schedule));
    }

    let outcome = block_on(modal.submit(store))?.map_err(submit_error)?;
    debug!(open = modal.is_open(), "schedule dialog closed");
    let appointment = outcome.appointment();
    println!(
        "Scheduled appointment {} with Dr. {} for {}.",
        appointment.id,
        appointment.primary_physician,
        format_schedule(appointment.schedule)
    );
    Ok(())
}

#[instrument(skip(store, args, now))]
fn cmd_cancel(store: &DataStore, args: CancelArgs, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command cancel");

    let appointment = store.resolve(&args.id)?;
    let user_id = args.user.unwrap_or_else(|| appointment.user_id.clone());
    let mut modal = AppointmentModal::new(
        ModalProps::for_mode(
            user_id,
            appointment.patient_id.clone(),
            ModalMode::Cancel,
            Some(appointment),
        ),
        now,
    );
    modal.open();
    modal
        .form_mut()
        .set_text(FormField::CancellationReason, args.reason);

    let outcome = block_on(modal.submit(store))?.map_err(submit_error)?;
    println!("Cancelled appointment {}.", outcome.appointment().id);
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_list(store: &DataStore, renderer: &mut Renderer, args: ListArgs) -> anyhow::Result<()> {
    let appointments = store.list(&AppointmentsListArgs {
        patient_id: args.patient,
        status: args.status,
    })?;
    renderer.print_appointment_table(&appointments)
}

#[instrument(skip(store, renderer, args))]
fn cmd_notifications(
    store: &DataStore,
    renderer: &mut Renderer,
    args: NotificationsArgs,
) -> anyhow::Result<()> {
    let mut notifications = store.load_notifications()?;
    if let Some(id) = args.appointment {
        let appointment = store.resolve(&id)?;
        notifications.retain(|notice| notice.appointment_id == appointment.id);
    }
    renderer.print_notifications(&notifications)
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    for path in &cfg.loaded_files {
        println!("# loaded {}", path.display());
    }
    for (key, value) in cfg.iter() {
        println!("{key}={value}");
    }
    Ok(())
}

fn session_value(
    explicit: Option<String>,
    cfg: &Config,
    key: &str,
    flag: &str,
) -> anyhow::Result<String> {
    explicit
        .or_else(|| cfg.get(key))
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{flag} is required (or set {key} in carebookrc)"))
}

/// Maps a loosely typed doctor name onto the catalogue spelling.
fn canonical_physician(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let trimmed = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("dr.") => trimmed[3..].trim(),
        _ => trimmed,
    };
    match find_physician(trimmed) {
        Some(doctor) => Ok(doctor.name.to_string()),
        None => {
            warn!(physician = %trimmed, "doctor is not in the catalogue");
            let known = PHYSICIANS
                .iter()
                .map(|doctor| doctor.name)
                .collect::<Vec<_>>()
                .join(", ");
            Err(anyhow!("unknown doctor '{trimmed}' (known: {known})"))
        }
    }
}

fn submit_error(err: SubmitError) -> anyhow::Error {
    match err {
        SubmitError::Invalid(errors) => {
            let details = errors
                .iter()
                .map(|(field, message)| format!("  {}: {message}", flag_for(field)))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow!("appointment is not valid:\n{details}")
        }
        other => anyhow::Error::new(other),
    }
}

fn flag_for(field: FormField) -> &'static str {
    match field {
        FormField::PrimaryPhysician => "--physician",
        FormField::Schedule => "--at",
        FormField::Reason => "--reason",
        FormField::Note => "--note",
        FormField::CancellationReason => "--reason",
    }
}

fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
