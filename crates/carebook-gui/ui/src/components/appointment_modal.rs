use std::rc::Rc;

use carebook_shared::modal::TriggerTone;
use carebook_shared::{
    Appointment, AppointmentModal, BackendError, FormField, ModalMode, ModalProps, SubmitOutcome,
};
use chrono::{DateTime, Utc};
use yew::{
    Callback, Html, MouseEvent, Properties, Reducible, classes, function_component, html,
    use_effect_with, use_reducer,
};

use super::appointment_form::AppointmentFields;
use crate::api::{TauriBackend, log_ui};

#[derive(Properties, PartialEq)]
pub struct AppointmentModalViewProps {
    pub user_id: String,
    pub patient_id: String,
    pub mode: ModalMode,
    pub appointment: Appointment,
    #[prop_or_default]
    pub title: Option<String>,
    #[prop_or_default]
    pub description: Option<String>,
    pub on_changed: Callback<Appointment>,
}

#[derive(Clone, PartialEq)]
struct ModalState {
    modal: AppointmentModal,
    outcome: Option<SubmitOutcome>,
}

enum ModalAction {
    SetOpen(bool),
    Text(FormField, String),
    Schedule(Option<DateTime<Utc>>),
    Started(AppointmentModal),
    Finished(Result<Option<Appointment>, BackendError>),
}

impl Reducible for ModalState {
    type Action = ModalAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ModalAction::SetOpen(open) => {
                next.modal.set_open(open);
                next.outcome = None;
            }
            ModalAction::Text(field, value) => {
                next.modal.form_mut().set_text(field, value);
            }
            ModalAction::Schedule(value) => {
                next.modal.form_mut().set_schedule(value);
            }
            ModalAction::Started(modal) => {
                next.modal = modal;
                next.outcome = None;
            }
            ModalAction::Finished(result) => {
                next.outcome = next.modal.finish_submit(result).ok();
            }
        }
        Rc::new(next)
    }
}

/// Trigger button plus the dialog hosting a schedule or cancel form.
#[function_component(AppointmentModalView)]
pub fn appointment_modal_view(props: &AppointmentModalViewProps) -> Html {
    let state = {
        let mut modal_props = ModalProps::for_mode(
            props.user_id.clone(),
            props.patient_id.clone(),
            props.mode,
            Some(props.appointment.clone()),
        );
        if let Some(title) = props.title.clone() {
            modal_props.title = title;
        }
        if let Some(description) = props.description.clone() {
            modal_props.description = description;
        }
        use_reducer(move || ModalState {
            modal: AppointmentModal::new(modal_props, Utc::now()),
            outcome: None,
        })
    };

    {
        let on_changed = props.on_changed.clone();
        use_effect_with(state.outcome.clone(), move |outcome| {
            if let Some(SubmitOutcome::Updated { appointment }) = outcome {
                log_ui("appointment_updated", appointment.id.to_string());
                on_changed.emit(appointment.clone());
            }
            || ()
        });
    }

    let modal = &state.modal;
    let trigger = modal.trigger();
    let tone = match trigger.tone {
        TriggerTone::Positive => "positive",
        TriggerTone::Destructive => "destructive",
    };

    let on_open = {
        let state = state.clone();
        Callback::from(move |_: MouseEvent| state.dispatch(ModalAction::SetOpen(true)))
    };
    let on_close = {
        let state = state.clone();
        Callback::from(move |_: MouseEvent| state.dispatch(ModalAction::SetOpen(false)))
    };
    let on_text = {
        let state = state.clone();
        Callback::from(move |(field, value): (FormField, String)| {
            state.dispatch(ModalAction::Text(field, value));
        })
    };
    let on_schedule = {
        let state = state.clone();
        Callback::from(move |value: Option<DateTime<Utc>>| {
            state.dispatch(ModalAction::Schedule(value));
        })
    };
    let on_submit = {
        let state = state.clone();
        Callback::from(move |()| {
            if state.modal.form().is_loading() {
                return;
            }
            let mut pending = state.modal.clone();
            let request = pending.begin_submit();
            state.dispatch(ModalAction::Started(pending));
            let Ok(request) = request else {
                return;
            };

            let state = state.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = request.dispatch(&TauriBackend).await;
                state.dispatch(ModalAction::Finished(result));
            });
        })
    };

    html! {
        <>
            <button class={classes!("btn", "trigger", tone)} onclick={on_open}>
                { trigger.label }
            </button>
            {
                if modal.is_open() {
                    html! {
                        <div class="modal-backdrop" onclick={on_close.clone()}>
                            <div
                                class="modal"
                                role="dialog"
                                onclick={|event: MouseEvent| event.stop_propagation()}
                            >
                                <div class="modal-header">
                                    <h2>{ modal.title() }</h2>
                                    <p>{ modal.description() }</p>
                                    <button class="btn close" onclick={on_close}>{ "×" }</button>
                                </div>
                                <AppointmentFields
                                    form={modal.form().clone()}
                                    {on_text}
                                    {on_schedule}
                                    {on_submit}
                                />
                            </div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </>
    }
}
