use std::rc::Rc;

use carebook_shared::form::FieldKind;
use carebook_shared::{
    Appointment, AppointmentForm, BackendError, FormField, FormMode, SubmitOutcome,
};
use chrono::{DateTime, Utc};
use web_sys::SubmitEvent;
use yew::{
    Callback, Html, Properties, Reducible, function_component, html, use_effect_with,
    use_reducer,
};
use yew_router::prelude::use_navigator;

use super::form_field::{ScheduleField, TextField};
use super::submit_button::SubmitButton;
use crate::api::{TauriBackend, log_ui};
use crate::app::{Route, SuccessQuery};

#[derive(Properties, PartialEq)]
pub struct AppointmentFieldsProps {
    pub form: AppointmentForm,
    pub on_text: Callback<(FormField, String)>,
    pub on_schedule: Callback<Option<DateTime<Utc>>>,
    pub on_submit: Callback<()>,
}

/// Field layout shared by the create page and the dialogs.
#[function_component(AppointmentFields)]
pub fn appointment_fields(props: &AppointmentFieldsProps) -> Html {
    let form = &props.form;
    let on_submit = props.on_submit.clone();
    let onsubmit = Callback::from(move |event: SubmitEvent| {
        event.prevent_default();
        on_submit.emit(());
    });

    html! {
        <form class="appointment-form" {onsubmit}>
            {
                for form.fields().iter().copied().map(|field| {
                    let access = form.field_access(field);
                    let error = form.field_error(field).map(str::to_string);
                    match field.kind() {
                        FieldKind::DatePicker => html! {
                            <ScheduleField
                                value={form.schedule()}
                                {access}
                                {error}
                                on_change={props.on_schedule.clone()}
                            />
                        },
                        FieldKind::Select | FieldKind::Textarea => html! {
                            <TextField
                                {field}
                                value={form.text_value(field).to_string()}
                                {access}
                                {error}
                                on_change={props.on_text.clone()}
                            />
                        },
                    }
                })
            }
            {
                match form.form_error() {
                    Some(message) => html! { <p class="form-error" role="alert">{ message }</p> },
                    None => html! {},
                }
            }
            <SubmitButton state={form.submit_button()} />
        </form>
    }
}

#[derive(Clone, PartialEq)]
struct FormState {
    form: AppointmentForm,
    outcome: Option<SubmitOutcome>,
}

enum FormAction {
    Text(FormField, String),
    Schedule(Option<DateTime<Utc>>),
    Started(AppointmentForm),
    Finished(Result<Option<Appointment>, BackendError>),
}

impl Reducible for FormState {
    type Action = FormAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            FormAction::Text(field, value) => {
                next.form.set_text(field, value);
            }
            FormAction::Schedule(value) => {
                next.form.set_schedule(value);
            }
            FormAction::Started(form) => {
                next.form = form;
                next.outcome = None;
            }
            FormAction::Finished(result) => {
                next.outcome = next.form.finish_submit(result).ok();
            }
        }
        Rc::new(next)
    }
}

#[derive(Properties, PartialEq)]
pub struct CreateAppointmentFormProps {
    pub user_id: String,
    pub patient_id: String,
}

/// Create-mode form. Navigates to the success page once the backend answers.
#[function_component(CreateAppointmentForm)]
pub fn create_appointment_form(props: &CreateAppointmentFormProps) -> Html {
    let state = {
        let user_id = props.user_id.clone();
        let patient_id = props.patient_id.clone();
        use_reducer(move || FormState {
            form: AppointmentForm::new(user_id, patient_id, FormMode::Create, None, Utc::now()),
            outcome: None,
        })
    };
    let navigator = use_navigator();

    {
        let user_id = props.user_id.clone();
        use_effect_with(state.outcome.clone(), move |outcome| {
            if let Some(SubmitOutcome::Created {
                appointment,
                redirect,
            }) = outcome
            {
                log_ui("appointment_created", redirect.clone());
                match navigator {
                    Some(navigator) => {
                        let query = SuccessQuery {
                            appointment_id: appointment.id,
                        };
                        if let Err(err) =
                            navigator.push_with_query(&Route::NewAppointmentSuccess { user_id }, &query)
                        {
                            tracing::error!(error = %err, "failed to open success page");
                        }
                    }
                    None => tracing::warn!("no router available; staying on the form"),
                }
            }
            || ()
        });
    }

    let on_text = {
        let state = state.clone();
        Callback::from(move |(field, value): (FormField, String)| {
            state.dispatch(FormAction::Text(field, value));
        })
    };
    let on_schedule = {
        let state = state.clone();
        Callback::from(move |value: Option<DateTime<Utc>>| {
            state.dispatch(FormAction::Schedule(value));
        })
    };
    let on_submit = {
        let state = state.clone();
        Callback::from(move |()| {
            if state.form.is_loading() {
                return;
            }
            let mut pending = state.form.clone();
            let request = pending.begin_submit();
            state.dispatch(FormAction::Started(pending));
            let Ok(request) = request else {
                return;
            };

            let state = state.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = request.dispatch(&TauriBackend).await;
                state.dispatch(FormAction::Finished(result));
            });
        })
    };

    html! {
        <AppointmentFields form={state.form.clone()} {on_text} {on_schedule} {on_submit} />
    }
}
