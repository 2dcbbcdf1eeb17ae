use carebook_shared::SessionDto;
use yew::{Html, Properties, function_component, html, use_context};
use yew_router::prelude::Link;

use crate::app::Route;
use crate::components::CreateAppointmentForm;

#[derive(Properties, PartialEq)]
pub struct NewAppointmentProps {
    pub user_id: String,
}

#[function_component(NewAppointment)]
pub fn new_appointment(props: &NewAppointmentProps) -> Html {
    let patient_id = use_context::<SessionDto>()
        .map(|session| session.patient_id)
        .unwrap_or_default();

    html! {
        <section class="panel page new-appointment">
            <Link<Route> to={Route::Dashboard} classes="back">{ "Back to appointments" }</Link<Route>>
            <CreateAppointmentForm user_id={props.user_id.clone()} {patient_id} />
        </section>
    }
}
