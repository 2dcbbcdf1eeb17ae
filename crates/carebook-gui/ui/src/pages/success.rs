use carebook_shared::{Appointment, AppointmentIdArg, find_physician};
use yew::{Html, Properties, function_component, html, use_effect_with, use_state};
use yew_router::prelude::{Link, use_location};

use crate::api::invoke_tauri;
use crate::app::{Route, SuccessQuery};
use crate::components::format_local;

#[derive(Properties, PartialEq)]
pub struct NewAppointmentSuccessProps {
    pub user_id: String,
}

#[function_component(NewAppointmentSuccess)]
pub fn new_appointment_success(props: &NewAppointmentSuccessProps) -> Html {
    let appointment_id = use_location()
        .and_then(|location| location.query::<SuccessQuery>().ok())
        .map(|query| query.appointment_id);
    let appointment = use_state(|| None::<Appointment>);

    {
        let appointment = appointment.clone();
        use_effect_with(appointment_id, move |id| {
            if let Some(id) = *id {
                wasm_bindgen_futures::spawn_local(async move {
                    let args = AppointmentIdArg { id };
                    match invoke_tauri::<Appointment, _>("appointment_get", &args).await {
                        Ok(found) => appointment.set(Some(found)),
                        Err(err) => tracing::error!(error = %err, "appointment_get failed"),
                    }
                });
            } else {
                tracing::warn!("success page opened without an appointmentId");
            }
            || ()
        });
    }

    let details = match (*appointment).as_ref() {
        Some(found) => {
            let doctor = find_physician(&found.primary_physician);
            html! {
                <div class="request-details">
                    <p>{ "Requested appointment details:" }</p>
                    <div class="doctor">
                        {
                            match doctor {
                                Some(doctor) => html! {
                                    <img class="avatar" src={doctor.image} alt={doctor.name} width="100" height="100" />
                                },
                                None => html! {},
                            }
                        }
                        <span>{ format!("Dr. {}", found.primary_physician) }</span>
                    </div>
                    <div class="when">{ format_local(found.schedule) }</div>
                </div>
            }
        }
        None => html! {},
    };

    html! {
        <section class="panel page success">
            <h2>{ "Your appointment request has been successfully submitted!" }</h2>
            <p>{ "We'll be in touch shortly to confirm." }</p>
            { details }
            <Link<Route> to={Route::NewAppointment { user_id: props.user_id.clone() }} classes="btn primary">
                { "New Appointment" }
            </Link<Route>>
        </section>
    }
}
