use carebook_shared::{Appointment, AppointmentStatus, AppointmentsListArgs, ModalMode, SessionDto};
use yew::{Callback, Html, function_component, html, use_context, use_effect_with, use_state};
use yew_router::prelude::Link;

use crate::api::invoke_tauri;
use crate::app::Route;
use crate::components::{AppointmentModalView, format_local};

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let session = use_context::<SessionDto>().unwrap_or(SessionDto {
        user_id: String::new(),
        patient_id: String::new(),
    });
    let appointments = use_state(Vec::<Appointment>::new);
    let refresh_tick = use_state(|| 0_u64);

    {
        let appointments = appointments.clone();
        let patient_id = session.patient_id.clone();
        use_effect_with(*refresh_tick, move |tick| {
            let tick = *tick;
            wasm_bindgen_futures::spawn_local(async move {
                tracing::info!(tick, "refreshing appointment list");
                let args = AppointmentsListArgs {
                    patient_id: Some(patient_id),
                    status: None,
                };
                match invoke_tauri::<Vec<Appointment>, _>("appointments_list", &args).await {
                    Ok(list) => appointments.set(list),
                    Err(err) => tracing::error!(error = %err, "appointments_list failed"),
                }
            });
            || ()
        });
    }

    let on_changed = {
        let refresh_tick = refresh_tick.clone();
        Callback::from(move |_: Appointment| {
            refresh_tick.set((*refresh_tick).saturating_add(1));
        })
    };

    html! {
        <section class="panel page dashboard">
            <div class="header">
                <span>{ "Appointments" }</span>
                <Link<Route>
                    to={Route::NewAppointment { user_id: session.user_id.clone() }}
                    classes="btn primary"
                >
                    { "New Appointment" }
                </Link<Route>>
            </div>
            {
                if appointments.is_empty() {
                    html! { <div class="empty">{ "No appointments yet." }</div> }
                } else {
                    html! {
                        <table class="appointments">
                            <thead>
                                <tr>
                                    <th>{ "Date" }</th>
                                    <th>{ "Doctor" }</th>
                                    <th>{ "Status" }</th>
                                    <th>{ "Reason" }</th>
                                    <th>{ "Actions" }</th>
                                </tr>
                            </thead>
                            <tbody>
                                {
                                    for appointments.iter().map(|appointment| {
                                        let row_key = format!("{}-{}", appointment.id, appointment.updated_at.timestamp_millis());
                                        html! {
                                            <tr key={row_key}>
                                                <td>{ format_local(appointment.schedule) }</td>
                                                <td>{ format!("Dr. {}", appointment.primary_physician) }</td>
                                                <td class={format!("status {}", appointment.status)}>{ appointment.status.as_str() }</td>
                                                <td>{ &appointment.reason }</td>
                                                <td class="actions">
                                                    { row_actions(appointment, &on_changed) }
                                                </td>
                                            </tr>
                                        }
                                    })
                                }
                            </tbody>
                        </table>
                    }
                }
            }
        </section>
    }
}

fn row_actions(
    appointment: &Appointment,
    on_changed: &Callback<Appointment>,
) -> Html {
    if appointment.status == AppointmentStatus::Cancelled {
        return html! {
            <span class="muted">
                { appointment.cancellation_reason.clone().unwrap_or_default() }
            </span>
        };
    }

    html! {
        <>
            {
                for [ModalMode::Schedule, ModalMode::Cancel].into_iter().map(|mode| html! {
                    <AppointmentModalView
                        user_id={appointment.user_id.clone()}
                        patient_id={appointment.patient_id.clone()}
                        {mode}
                        appointment={appointment.clone()}
                        on_changed={on_changed.clone()}
                    />
                })
            }
        </>
    }
}
